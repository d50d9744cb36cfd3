//! Command-line arguments for the HOO client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// HOO client command-line arguments.
///
/// Connection values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "hoo-client", about = "Headless HOO game client")]
pub struct CliArgs {
    /// Server address.
    #[arg(long)]
    pub server: Option<String>,

    /// Server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Session ticks per second.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Account to log in with once connected.
    #[arg(long, requires = "password")]
    pub login: Option<String>,

    /// Password for `--login`.
    #[arg(long, requires = "login")]
    pub password: Option<String>,
}

impl CliArgs {
    /// Login and password, when both were given.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.login.as_deref()?, self.password.as_deref()?))
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref addr) = args.server {
            self.network.server_address = addr.clone();
        }
        if let Some(port) = args.port {
            self.network.server_port = port;
        }
        if let Some(rate) = args.tick_rate {
            self.network.tick_rate = rate;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            server: Some("192.168.1.1".to_string()),
            tick_rate: Some(60),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.network.server_address, "192.168.1.1");
        assert_eq!(config.network.tick_rate, 60);
        // Non-overridden fields retain defaults
        assert_eq!(config.network.server_port, 7777);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = CliArgs::parse_from([
            "hoo-client",
            "--server",
            "10.0.0.2",
            "--port",
            "9000",
            "--login",
            "alice",
            "--password",
            "secret",
        ]);
        assert_eq!(args.server.as_deref(), Some("10.0.0.2"));
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.credentials(), Some(("alice", "secret")));
    }

    #[test]
    fn test_login_requires_password() {
        let result = CliArgs::try_parse_from(["hoo-client", "--login", "alice"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_credentials_by_default() {
        let args = CliArgs::parse_from(["hoo-client"]);
        assert_eq!(args.credentials(), None);
    }
}
