use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface: only `serve` and `config validate` drive the gateway
/// directly; process supervision (`start/stop/restart/status`, port
/// management) stays an external collaborator.
#[derive(Parser)]
#[command(name = "routecodex", version, about = "LLM gateway and router")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve config and start the HTTP gateway.
    Serve {
        #[arg(long, env = "ROUTECODEX_CONFIG", default_value = "config.json")]
        config: PathBuf,
        #[arg(long, env = "ROUTECODEX_SYSTEM_CONFIG", default_value = "system.json")]
        system_config: PathBuf,
        #[arg(long, env = "ROUTECODEX_HOST")]
        host: Option<String>,
        #[arg(long, env = "ROUTECODEX_PORT")]
        port: Option<u16>,
        #[arg(long, env = "ROUTECODEX_PROXY")]
        proxy: Option<String>,
    },
    /// Validate config without starting the server.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Validate {
        user_config: PathBuf,
        system_config: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_config_paths() {
        let cli = Cli::try_parse_from(["routecodex", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, system_config, host, port, proxy } => {
                assert_eq!(config, PathBuf::from("config.json"));
                assert_eq!(system_config, PathBuf::from("system.json"));
                assert_eq!(host, None);
                assert_eq!(port, None);
                assert_eq!(proxy, None);
            }
            _ => panic!("expected Serve"),
        }
    }

    #[test]
    fn serve_accepts_host_and_port_overrides() {
        let cli = Cli::try_parse_from([
            "routecodex",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9090",
        ])
        .unwrap();
        match cli.command {
            Command::Serve { host, port, .. } => {
                assert_eq!(host, Some("0.0.0.0".to_string()));
                assert_eq!(port, Some(9090));
            }
            _ => panic!("expected Serve"),
        }
    }

    #[test]
    fn config_validate_requires_two_paths() {
        let cli = Cli::try_parse_from(["routecodex", "config", "validate", "user.json", "system.json"]).unwrap();
        match cli.command {
            Command::Config { action: ConfigAction::Validate { user_config, system_config } } => {
                assert_eq!(user_config, PathBuf::from("user.json"));
                assert_eq!(system_config, PathBuf::from("system.json"));
            }
            _ => panic!("expected Config::Validate"),
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["routecodex", "bogus"]).is_err());
    }
}
