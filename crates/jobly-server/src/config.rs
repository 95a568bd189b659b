use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};

use crate::auth::JwtKeys;

/// Server settings, read from flags or the environment (a `.env` file is
/// loaded first when present).
#[derive(Debug, Clone, Parser)]
#[command(name = "jobly", version, about = "Jobly job board API")]
pub struct Config {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    #[arg(long, env = "JOBLY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Maximum pooled database connections
    #[arg(long, env = "JOBLY_MAX_CONNECTIONS", default_value_t = 16)]
    pub max_connections: usize,

    /// Lifetime of issued tokens, in hours
    #[arg(long, env = "JOBLY_TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,

    /// Apply pending schema migrations before serving
    #[arg(long, env = "JOBLY_MIGRATE")]
    pub migrate: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (the default)
    Serve,
    /// Print a fresh bearer token for an existing user
    Token {
        username: String,
    },
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn jwt_keys(&self) -> JwtKeys {
        JwtKeys::new(
            self.secret_key.as_bytes(),
            chrono::Duration::hours(self.token_ttl_hours),
        )
    }
}
