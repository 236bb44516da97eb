use std::path::PathBuf;

use pitch_providers::{ElevenLabsConfig, OpenAiConfig};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `180`). Must exceed the
    /// upstream timeouts or a slow stage is cut off before it can record
    /// its own failure.
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the server stops
    /// (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// PostgreSQL URL. `None` keeps records in memory.
    pub database_url: Option<String>,
    /// Directory rendered audio is written to (default: `./data/audio`).
    pub audio_storage_dir: PathBuf,
    /// AI script writer settings.
    pub openai: OpenAiConfig,
    /// Voice synthesis settings.
    pub elevenlabs: ElevenLabsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `180`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`          | (unset: in-memory store)   |
    /// | `AUDIO_STORAGE_DIR`     | `./data/audio`             |
    ///
    /// Provider variables are documented on [`OpenAiConfig::from_env`] and
    /// [`ElevenLabsConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let audio_storage_dir = std::env::var("AUDIO_STORAGE_DIR")
            .unwrap_or_else(|_| "./data/audio".into())
            .into();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            audio_storage_dir,
            openai: OpenAiConfig::from_env(),
            elevenlabs: ElevenLabsConfig::from_env(),
        }
    }

    /// The longest a single stage trigger can wait on its upstream call.
    pub fn max_upstream_timeout_secs(&self) -> u64 {
        self.openai.timeout_secs.max(self.elevenlabs.timeout_secs)
    }
}
