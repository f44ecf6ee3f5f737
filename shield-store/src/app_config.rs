use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub board: BoardConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Supabase project JWT secret (HS256)
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { poll_interval_seconds: default_poll_interval() }
    }
}

fn default_poll_interval() -> u64 { 15 }

/// Shield web API that hosts the assistant and referral endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SHIELD_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SHIELD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let raw = r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/shield"

            [auth]
            jwt_secret = "secret"

            [api]
            base_url = "http://localhost:3000"
        "#;

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.board.poll_interval_seconds, 15);
        assert_eq!(cfg.api.base_url, "http://localhost:3000");
    }
}
