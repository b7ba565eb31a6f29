//! Server configuration
//!
//! Every setting comes from an environment variable and has a default
//! suitable for local development, except that a production deployment must
//! set `JWT_SECRET`.

use std::path::PathBuf;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is not set
pub const DEV_JWT_SECRET: &str = "dev_secret_change_me";

/// Server configuration
#[derive(Clone)]
pub struct Config {
    /// Socket address the HTTP listener binds to
    pub bind_addr: String,

    /// Base URL clients reach this server at; pre-signed URLs start with it
    pub public_url: String,

    /// Postgres connection string. Without one, jobs live in memory.
    pub database_url: Option<String>,

    /// Root directory of the filesystem object store
    pub storage_dir: PathBuf,

    /// Image copied to the seed key at startup, if set
    pub seed_image: Option<PathBuf>,

    /// Secret for bearer tokens and pre-signed URL grants
    pub jwt_secret: String,

    /// Bearer token lifetime
    pub token_ttl_mins: i64,

    /// Pre-signed URL lifetime
    pub presign_ttl: Duration,

    /// Largest accepted upload body
    pub max_upload_bytes: usize,

    /// `user:password[:role]` list; the development users when unset
    pub users: Option<String>,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognised variables:
    /// - IMGPIPE_BIND_ADDR (default: 0.0.0.0:8080)
    /// - IMGPIPE_PUBLIC_URL (default: http://localhost:8080)
    /// - DATABASE_URL (optional)
    /// - IMGPIPE_STORAGE_DIR (default: ./data)
    /// - IMGPIPE_SEED_IMAGE (optional)
    /// - JWT_SECRET (default: development secret)
    /// - IMGPIPE_TOKEN_TTL_MINS (default: 120)
    /// - IMGPIPE_PRESIGN_TTL_SECS (default: 300)
    /// - IMGPIPE_MAX_UPLOAD_BYTES (default: 20 MiB)
    /// - IMGPIPE_USERS (optional)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let jwt_secret = var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let token_ttl_mins = match var("IMGPIPE_TOKEN_TTL_MINS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("IMGPIPE_TOKEN_TTL_MINS must be an integer, got {raw:?}"))?,
            None => defaults.token_ttl_mins,
        };

        let presign_ttl = match var("IMGPIPE_PRESIGN_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("IMGPIPE_PRESIGN_TTL_SECS must be an integer, got {raw:?}"))?,
            None => defaults.presign_ttl,
        };

        let max_upload_bytes = match var("IMGPIPE_MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("IMGPIPE_MAX_UPLOAD_BYTES must be an integer, got {raw:?}"))?,
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            bind_addr: var("IMGPIPE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            public_url: var("IMGPIPE_PUBLIC_URL").unwrap_or(defaults.public_url),
            database_url: var("DATABASE_URL"),
            storage_dir: var("IMGPIPE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            seed_image: var("IMGPIPE_SEED_IMAGE").map(PathBuf::from),
            jwt_secret,
            token_ttl_mins,
            presign_ttl,
            max_upload_bytes,
            users: var("IMGPIPE_USERS"),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            anyhow::bail!("public_url must start with http:// or https://");
        }

        if self.jwt_secret.is_empty() {
            anyhow::bail!("jwt_secret cannot be empty");
        }

        if self.token_ttl_mins <= 0 {
            anyhow::bail!("token_ttl_mins must be greater than 0");
        }

        if self.presign_ttl.as_secs() == 0 {
            anyhow::bail!("presign_ttl must be greater than 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than 0");
        }

        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
            database_url: None,
            storage_dir: PathBuf::from("./data"),
            seed_image: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_mins: 120,
            presign_ttl: Duration::from_secs(300),
            max_upload_bytes: 20 * 1024 * 1024,
            users: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("public_url", &self.public_url)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("storage_dir", &self.storage_dir)
            .field("seed_image", &self.seed_image)
            .field("token_ttl_mins", &self.token_ttl_mins)
            .field("presign_ttl", &self.presign_ttl)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}
