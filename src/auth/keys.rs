//! RSA Key Material
//!
//! Loads the signing keypair from PEM byte sources and generates fresh
//! keypairs natively. Keys are immutable once loaded.

use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::auth::error::{KeyError, KeyRole};

/// Signature scheme used for every token.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS512;

/// Smallest modulus accepted for generated keys.
pub const MIN_KEY_BITS: usize = 2048;

const PROBE_MESSAGE: &[u8] = b"keyward keypair probe";

/// Where PEM key bytes come from.
#[derive(Debug, Clone)]
pub enum KeySource {
    Path(PathBuf),
    Pem(Vec<u8>),
}

impl KeySource {
    fn read(&self, role: KeyRole) -> Result<Cow<'_, [u8]>, KeyError> {
        match self {
            KeySource::Path(path) => fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| KeyError::Load {
                    role,
                    path: path.clone(),
                    source,
                }),
            KeySource::Pem(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl From<PathBuf> for KeySource {
    fn from(path: PathBuf) -> Self {
        KeySource::Path(path)
    }
}

impl From<&Path> for KeySource {
    fn from(path: &Path) -> Self {
        KeySource::Path(path.to_path_buf())
    }
}

/// RSA signing keypair.
///
/// The raw key bytes are not reachable from outside, not even through
/// `Debug`.
#[derive(Clone)]
pub struct Keypair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keypair {
    /// Parse a keypair from PEM bytes and check that the halves match.
    ///
    /// # Errors
    /// `KeyError::Parse` if either half is empty, not PEM, not RSA, or if the
    /// public key cannot verify a signature made by the private key.
    pub fn from_pem(public_pem: &[u8], private_pem: &[u8]) -> Result<Self, KeyError> {
        if public_pem.is_empty() {
            return Err(parse_error(KeyRole::Public, "key source is empty"));
        }
        if private_pem.is_empty() {
            return Err(parse_error(KeyRole::Private, "key source is empty"));
        }

        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| parse_error(KeyRole::Public, e.to_string()))?;
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| parse_error(KeyRole::Private, e.to_string()))?;

        let keypair = Self { encoding, decoding };
        keypair.probe()?;
        Ok(keypair)
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    // PEM parsing only checks the envelope; the DER inside is first touched
    // by ring when signing, so sign and verify once here.
    fn probe(&self) -> Result<(), KeyError> {
        let signature = crypto::sign(PROBE_MESSAGE, &self.encoding, SIGNING_ALGORITHM)
            .map_err(|e| parse_error(KeyRole::Private, e.to_string()))?;

        let verified = crypto::verify(&signature, PROBE_MESSAGE, &self.decoding, SIGNING_ALGORITHM)
            .map_err(|e| parse_error(KeyRole::Public, e.to_string()))?;

        if verified {
            Ok(())
        } else {
            Err(parse_error(
                KeyRole::Pair,
                "public key does not match private key",
            ))
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// Load the signing keypair from two byte sources.
///
/// # Errors
/// - `KeyError::Load` if a source cannot be read
/// - `KeyError::Parse` if the bytes are not a matching RSA PEM pair
pub fn load_keypair(public: &KeySource, private: &KeySource) -> Result<Keypair, KeyError> {
    let public_pem = public.read(KeyRole::Public)?;
    let private_pem = private.read(KeyRole::Private)?;
    Keypair::from_pem(&public_pem, &private_pem)
}

/// Freshly generated PEM keypair.
pub struct GeneratedKeypair {
    /// PKCS#8 private key
    pub private_pem: String,
    /// SubjectPublicKeyInfo public key
    pub public_pem: String,
}

impl GeneratedKeypair {
    /// Write both halves to disk. The private key is created owner-only on
    /// Unix.
    pub fn write_to(&self, private_path: &Path, public_path: &Path) -> Result<(), KeyError> {
        write_key(private_path, self.private_pem.as_bytes(), KeyRole::Private, true)?;
        write_key(public_path, self.public_pem.as_bytes(), KeyRole::Public, false)
    }
}

impl fmt::Debug for GeneratedKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKeypair")
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

/// Generate a new RSA keypair of `bits` size.
///
/// # Errors
/// `KeyError::Generate` if `bits` is below [`MIN_KEY_BITS`] or generation or
/// encoding fails.
pub fn generate_keypair(bits: usize) -> Result<GeneratedKeypair, KeyError> {
    if bits < MIN_KEY_BITS {
        return Err(KeyError::Generate(format!(
            "key size {} is below the minimum of {} bits",
            bits, MIN_KEY_BITS
        )));
    }

    let mut rng = rand::rngs::OsRng;
    let private_key =
        RsaPrivateKey::new(&mut rng, bits).map_err(|e| KeyError::Generate(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generate(e.to_string()))?
        .as_str()
        .to_owned();
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generate(e.to_string()))?;

    Ok(GeneratedKeypair {
        private_pem,
        public_pem,
    })
}

fn write_key(path: &Path, contents: &[u8], role: KeyRole, owner_only: bool) -> Result<(), KeyError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    if owner_only {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = owner_only;

    let to_write_error = |source| KeyError::Write {
        role,
        path: path.to_path_buf(),
        source,
    };

    let mut file = options.open(path).map_err(to_write_error)?;

    // `mode` above only applies when the file is created
    #[cfg(unix)]
    if owner_only {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(to_write_error)?;
    }

    file.write_all(contents).map_err(to_write_error)?;
    file.sync_all().map_err(to_write_error)
}

fn parse_error(role: KeyRole, reason: impl Into<String>) -> KeyError {
    KeyError::Parse {
        role,
        reason: reason.into(),
    }
}
