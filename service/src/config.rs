use clap::builder::TypedValueParser as _;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder shared secret. Must be overridden in production.
pub const DEFAULT_BUTTON_SECRET: &str = "change-me";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// What to do with browser origins when `allowed_origins` is empty.
///
/// Requests without an `Origin` header and loopback origins are accepted under
/// either setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmptyOriginsPolicy {
    /// Accept every origin (unrestricted).
    AllowAll,
    /// Accept no foreign origin.
    AllowNone,
}

impl fmt::Display for EmptyOriginsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmptyOriginsPolicy::AllowAll => write!(f, "allow-all"),
            EmptyOriginsPolicy::AllowNone => write!(f, "allow-none"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs (scheme://host[:port]) that are allowed to
    /// post events and open the admin event stream.
    #[arg(long, env, value_delimiter = ',', use_value_delimiter = true)]
    pub allowed_origins: Vec<String>,

    /// How to treat browser origins when no allowed origins are configured.
    #[arg(long, env, value_enum, default_value_t = EmptyOriginsPolicy::AllowAll)]
    pub empty_origins_policy: EmptyOriginsPolicy,

    /// The shared secret the public site must send in the `x-button-secret` header.
    #[arg(short, long, env, hide_env_values = true, default_value = DEFAULT_BUTTON_SECRET)]
    button_secret: String,

    /// Seconds between keep-alive comments on idle SSE connections
    #[arg(long, env, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    keep_alive_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 9010)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn button_secret(&self) -> &str {
        &self.button_secret
    }

    /// True while the shared secret is still the shipped placeholder.
    pub fn uses_default_secret(&self) -> bool {
        self.button_secret == DEFAULT_BUTTON_SECRET
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// The `host:port` pair the HTTP listener binds to.
    pub fn listen_address(&self) -> String {
        format!(
            "{}:{}",
            self.interface.as_deref().unwrap_or("0.0.0.0"),
            self.port
        )
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["site_relay"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_allowed_origins_split_on_commas() {
        let config = parse(&[
            "--allowed-origins",
            "https://example.com,https://admin.example.com",
        ]);

        assert_eq!(
            config.allowed_origins,
            vec![
                "https://example.com".to_string(),
                "https://admin.example.com".to_string()
            ]
        );
    }

    #[test]
    fn test_explicit_values_override_defaults() {
        let config = parse(&[
            "--button-secret",
            "s3cr3t",
            "--port",
            "8080",
            "--interface",
            "127.0.0.1",
            "--empty-origins-policy",
            "allow-none",
            "--keep-alive-secs",
            "30",
            "--runtime-env",
            "PRODUCTION",
        ]);

        assert_eq!(config.button_secret(), "s3cr3t");
        assert!(!config.uses_default_secret());
        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert_eq!(config.empty_origins_policy, EmptyOriginsPolicy::AllowNone);
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
        assert!(config.is_production());
    }

    #[test]
    fn test_keep_alive_must_be_positive() {
        assert!(Config::try_parse_from(["site_relay", "--keep-alive-secs", "0"]).is_err());
        assert_eq!(parse(&[]).keep_alive(), Duration::from_secs(15));
    }

    #[test]
    fn test_rejects_unknown_empty_origins_policy() {
        assert!(
            Config::try_parse_from(["site_relay", "--empty-origins-policy", "sometimes"]).is_err()
        );
    }

    #[test]
    fn test_rust_env_parsing_is_case_insensitive() {
        assert_eq!("Staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("bogus".parse::<RustEnv>(), Err(RustEnvParseError));
    }

    #[test]
    fn test_empty_origins_policy_display() {
        assert_eq!(EmptyOriginsPolicy::AllowAll.to_string(), "allow-all");
        assert_eq!(EmptyOriginsPolicy::AllowNone.to_string(), "allow-none");
    }
}
