use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{
    load_keypair, Authenticator, CredentialHasher, KeySource, TokenLifespans,
    DEFAULT_PASSWORD_COST,
};
use crate::error::{AppError, ConfigError};

pub const DEFAULT_CONFIG_PATH: &str = "configuration.yaml";

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub authentication: AuthSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_disconnect_timeout")]
    pub disconnect_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout_secs)
    }
}

/// Token and credential settings
#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct AuthSettings {
    pub public_key_path: PathBuf,
    pub private_key_path: PathBuf,
    pub access_token_lifespan: u64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_lifespan: u64, // seconds (e.g., 604800 for 7 days)
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// A login-capable user. `password_hash` is a bcrypt hash, see
/// `keyward hash-password`.
#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct UserEntry {
    pub username: String,
    pub password_hash: String,
}

impl AuthSettings {
    pub fn lifespans(&self) -> Result<TokenLifespans, ConfigError> {
        Ok(TokenLifespans::new(
            self.access_token_lifespan,
            self.refresh_token_lifespan,
        )?)
    }

    pub fn hasher(&self) -> Result<CredentialHasher, ConfigError> {
        CredentialHasher::new(self.password_cost)
            .map_err(|e| ConfigError::InvalidValue(format!("authentication.password_cost: {}", e)))
    }

    /// Load the keypair and build the authenticator. Any failure here must
    /// stop the process from serving.
    pub fn authenticator(&self) -> Result<Authenticator, AppError> {
        let keys = load_keypair(
            &KeySource::Path(self.public_key_path.clone()),
            &KeySource::Path(self.private_key_path.clone()),
        )?;
        Ok(Authenticator::new(keys, self.lifespans()?))
    }
}

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug)]
pub struct CorsSettings {
    pub allow_origin: String,
    pub allow_headers: String,
    pub allow_methods: String,
    /// How long a preflight response may be cached, in seconds
    pub max_age_secs: u64,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_headers: "content-type, Content-Type, Origin, Authorization".to_string(),
            allow_methods: "GET, POST, OPTIONS".to_string(),
            max_age_secs: 600,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                request_timeout_secs: default_request_timeout(),
                disconnect_timeout_secs: default_disconnect_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            authentication: AuthSettings {
                public_key_path: PathBuf::from("rsa.app.pub"),
                private_key_path: PathBuf::from("rsa.app"),
                access_token_lifespan: 30,
                refresh_token_lifespan: 60 * 3,
                password_cost: DEFAULT_PASSWORD_COST,
                users: Vec::new(),
            },
            cors: CorsSettings::default(),
        }
    }
}

impl Settings {
    /// Reject missing, empty or out-of-range values before anything is built
    /// from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let app = &self.application;
        if app.host.trim().is_empty() {
            return Err(missing("application.host"));
        }
        if app.port == 0 {
            return Err(missing("application.port"));
        }

        let auth = &self.authentication;
        if auth.public_key_path.as_os_str().is_empty() {
            return Err(missing("authentication.public_key_path"));
        }
        if auth.private_key_path.as_os_str().is_empty() {
            return Err(missing("authentication.private_key_path"));
        }
        auth.lifespans()?;
        auth.hasher()?;

        let mut seen = HashSet::new();
        for (i, user) in auth.users.iter().enumerate() {
            if user.username.trim().is_empty() {
                return Err(missing(&format!("authentication.users[{}].username", i)));
            }
            if user.password_hash.trim().is_empty() {
                return Err(missing(&format!(
                    "authentication.users[{}].password_hash",
                    i
                )));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "authentication.users: duplicate username {}",
                    user.username
                )));
            }
        }

        if self.cors.allow_origin.trim().is_empty() {
            return Err(missing("cors.allow_origin"));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Read settings from a YAML file, then apply `APP_`-prefixed environment
/// overrides (`APP_APPLICATION__PORT=9000`), then validate.
pub fn get_configuration(path: &Path) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.to_path_buf()).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired(format!("{} not specified in config", field))
}

fn default_request_timeout() -> u64 {
    5
}

fn default_disconnect_timeout() -> u64 {
    10
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_password_cost() -> u32 {
    DEFAULT_PASSWORD_COST
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serialises tests that read `APP_*` variables through `get_configuration`
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.authentication.public_key_path = fixture("rsa.app.pub");
        settings.authentication.private_key_path = fixture("rsa.app");
        settings
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_lifespan_is_rejected() {
        let mut settings = valid_settings();
        settings.authentication.access_token_lifespan = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_key_path_is_rejected() {
        let mut settings = valid_settings();
        settings.authentication.private_key_path = PathBuf::new();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_duplicate_users_are_rejected() {
        let mut settings = valid_settings();
        let user = UserEntry {
            username: "alice".to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
        };
        settings.authentication.users = vec![user.clone(), user];
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_bad_password_cost_is_rejected() {
        let mut settings = valid_settings();
        settings.authentication.password_cost = 2;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_authenticator_from_settings() {
        let authenticator = valid_settings()
            .authentication
            .authenticator()
            .expect("Failed to build authenticator");
        assert_eq!(authenticator.lifespans().access(), 30);
        assert_eq!(authenticator.lifespans().refresh(), 180);
    }

    #[test]
    fn test_authenticator_fails_on_missing_keys() {
        let mut settings = valid_settings();
        settings.authentication.public_key_path = fixture("missing.pub");
        assert!(matches!(
            settings.authentication.authenticator(),
            Err(AppError::Key(_))
        ));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let settings = valid_settings();
        let yaml = settings.to_yaml().unwrap();

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let loaded = get_configuration(file.path()).expect("Failed to read configuration");
        assert_eq!(loaded.application.port, settings.application.port);
        assert_eq!(
            loaded.authentication.public_key_path,
            settings.authentication.public_key_path
        );
        assert_eq!(loaded.cors.max_age_secs, 600);
    }

    #[test]
    fn test_missing_section_fails() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"application:\n  host: 127.0.0.1\n  port: 8080\n")
            .unwrap();

        assert!(get_configuration(file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let yaml = valid_settings().to_yaml().unwrap();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        std::env::set_var("APP_APPLICATION__PORT", "9000");
        std::env::set_var("APP_AUTHENTICATION__ACCESS_TOKEN_LIFESPAN", "45");
        let loaded = get_configuration(file.path());
        std::env::remove_var("APP_APPLICATION__PORT");
        std::env::remove_var("APP_AUTHENTICATION__ACCESS_TOKEN_LIFESPAN");

        let loaded = loaded.expect("Failed to read configuration");
        assert_eq!(loaded.application.port, 9000);
        assert_eq!(loaded.authentication.access_token_lifespan, 45);
        assert_eq!(loaded.application.host, "127.0.0.1");
    }
}
