use anyhow::{Context, Result};
use clap::Parser;
use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/memos.db";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Memo resource metadata API")]
pub struct Args {
    /// Host to bind to (overrides RESOURCE_SERVICE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides RESOURCE_SERVICE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides RESOURCE_SERVICE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Apply the schema and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::merge(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// CLI values win over environment values, which win over defaults.
    fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = lookup("RESOURCE_SERVICE_HOST").unwrap_or_else(|_| DEFAULT_HOST.into());
        let env_port = match lookup("RESOURCE_SERVICE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing RESOURCE_SERVICE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => DEFAULT_PORT,
            Err(err) => return Err(err).context("reading RESOURCE_SERVICE_PORT"),
        };
        let env_db = lookup("RESOURCE_SERVICE_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::merge(Args::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8081");
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn cli_overrides_environment() {
        let args = Args {
            port: Some(9000),
            ..Default::default()
        };
        let cfg = AppConfig::merge(
            args,
            lookup(&[
                ("RESOURCE_SERVICE_PORT", "7000"),
                ("RESOURCE_SERVICE_HOST", "127.0.0.1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = AppConfig::merge(Args::default(), lookup(&[("RESOURCE_SERVICE_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("RESOURCE_SERVICE_PORT"));
    }

    #[test]
    fn args_parse_migrate_flag() {
        let args = Args::parse_from(["memo-resources", "--migrate", "--port", "1234"]);
        assert!(args.migrate);
        assert_eq!(args.port, Some(1234));
    }
}
