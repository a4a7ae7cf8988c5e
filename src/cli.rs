//! Command-line interface.
//!
//! `keyward` with no subcommand serves HTTP. `keygen` writes a fresh RSA
//! keypair and `hash-password` turns a password read from stdin into a
//! bcrypt hash suitable for the `authentication.users` list.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::{DEFAULT_PASSWORD_COST, MIN_KEY_BITS};
use crate::configuration::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "keyward", version, about = "Stateless dual-token authentication service")]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = DEFAULT_CONFIG_PATH,
        env = "KEYWARD_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Generate an RSA signing keypair
    Keygen {
        /// Output path of the PKCS#8 private key
        #[arg(long, default_value = "rsa.app")]
        private: PathBuf,

        /// Output path of the SPKI public key
        #[arg(long, default_value = "rsa.app.pub")]
        public: PathBuf,

        /// Modulus size in bits
        #[arg(long, default_value_t = MIN_KEY_BITS)]
        bits: usize,
    },

    /// Hash a password read from stdin
    HashPassword {
        /// bcrypt cost factor
        #[arg(long, default_value_t = DEFAULT_PASSWORD_COST)]
        cost: u32,
    },
}

impl Cli {
    pub fn action(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["keyward"]);
        assert_eq!(cli.action(), Commands::Serve);
    }

    #[test]
    fn test_keygen_defaults() {
        let cli = Cli::parse_from(["keyward", "keygen"]);
        assert_eq!(
            cli.action(),
            Commands::Keygen {
                private: PathBuf::from("rsa.app"),
                public: PathBuf::from("rsa.app.pub"),
                bits: 2048,
            }
        );
    }

    #[test]
    fn test_hash_password_cost() {
        let cli = Cli::parse_from(["keyward", "hash-password", "--cost", "10"]);
        assert_eq!(cli.action(), Commands::HashPassword { cost: 10 });
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["keyward", "keygen", "--config", "other.yaml"]);
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
    }
}
