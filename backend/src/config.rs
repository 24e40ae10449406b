use std::net::SocketAddr;

use clap::Parser;
use uuid::Uuid;

/// Journal API server.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "JOURNAL_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// SQLite connection string. The default keeps all data in memory.
    #[arg(long, env = "JOURNAL_DATABASE_URL", default_value = "sqlite::memory:")]
    pub database_url: String,

    /// Secret used to sign session tokens. A random one is generated when unset.
    #[arg(long, env = "JOURNAL_JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued session tokens, in seconds.
    #[arg(long, env = "JOURNAL_TOKEN_TTL_SECS", default_value_t = 86_400)]
    pub token_ttl_secs: u64,
}

impl Config {
    pub fn jwt_secret(&self) -> String {
        match &self.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("JOURNAL_JWT_SECRET not set, tokens will not survive a restart");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: None,
            token_ttl_secs: 86_400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_args() {
        let config = Config::try_parse_from(["journal-backend"]).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.token_ttl_secs, 86_400);
    }

    #[test]
    fn test_default_matches_cli_defaults() {
        let parsed = Config::try_parse_from(["journal-backend"]).unwrap();
        let default = Config::default();
        assert_eq!(default.bind, parsed.bind);
        assert_eq!(default.database_url, parsed.database_url);
        assert_eq!(default.token_ttl_secs, parsed.token_ttl_secs);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "journal-backend",
            "--bind",
            "127.0.0.1:8080",
            "--jwt-secret",
            "s3cret",
            "--token-ttl-secs",
            "60",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.jwt_secret(), "s3cret");
        assert_eq!(config.token_ttl_secs, 60);
    }
}
