use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Story generation
    /// with illustrations runs inside one request.
    pub request_timeout_secs: u64,
    /// Origin used to build share links (default: `http://localhost:8000`).
    pub public_base_url: String,
    /// Static web UI served at `/` when set.
    pub web_dir: Option<PathBuf>,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Where generated images and audio are stored.
    pub media: MediaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:{PORT}`  |
    /// | `WEB_DIR`              | (unset)                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let web_dir = std::env::var("WEB_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            web_dir,
            jwt: JwtConfig::from_env(),
            media: MediaConfig::from_env(),
        }
    }
}

/// Which media backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaBackend {
    /// Files under a local directory, served at `/media`.
    Local,
    /// Supabase Storage bucket with public URLs.
    Supabase {
        url: String,
        service_role_key: String,
        bucket: String,
    },
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    /// Root directory for the local backend (default: `media`).
    pub dir: PathBuf,
}

impl MediaConfig {
    /// Load media configuration from environment variables.
    ///
    /// | Env Var                     | Default                          |
    /// |-----------------------------|----------------------------------|
    /// | `MEDIA_BACKEND`             | `local` (`local` or `supabase`)  |
    /// | `MEDIA_DIR`                 | `media`                          |
    /// | `SUPABASE_URL`              | required for `supabase`          |
    /// | `SUPABASE_SERVICE_ROLE_KEY` | required for `supabase`          |
    /// | `SUPABASE_BUCKET`           | `media`                          |
    pub fn from_env() -> Self {
        let dir = PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "media".into()));

        let backend = match std::env::var("MEDIA_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .trim()
            .to_lowercase()
            .as_str()
        {
            "supabase" => MediaBackend::Supabase {
                url: std::env::var("SUPABASE_URL")
                    .expect("SUPABASE_URL must be set when MEDIA_BACKEND=supabase")
                    .trim_end_matches('/')
                    .to_string(),
                service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY")
                    .expect("SUPABASE_SERVICE_ROLE_KEY must be set when MEDIA_BACKEND=supabase"),
                bucket: std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "media".into()),
            },
            "local" => MediaBackend::Local,
            other => panic!("MEDIA_BACKEND must be 'local' or 'supabase', got '{other}'"),
        };

        Self { backend, dir }
    }
}
