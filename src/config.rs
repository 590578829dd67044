use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub mongo_transactions: bool,
    pub jwt_secret: String,
    pub seed_users_file: Option<PathBuf>,
    pub cors_origins: Vec<String>,
    pub relay_buffer: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Reads configuration from the process environment (call `dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", get("PORT"), 3002u16)?;

        let storage = match get("STORAGE").as_deref() {
            None | Some("mongo") | Some("mongodb") => StorageBackend::Mongo,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "STORAGE", value: other.to_string() });
            }
        };

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Mongo && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let mongo_transactions = parse_bool("MONGO_TRANSACTIONS", get("MONGO_TRANSACTIONS"))?;

        // PRIVATE_KEY: nome usado pelo serviço de auth que emite os tokens
        let jwt_secret = get("JWT_SECRET")
            .or_else(|| get("PRIVATE_KEY"))
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        let relay_buffer = parse_or("RELAY_BUFFER", get("RELAY_BUFFER"), 256usize)?;
        if relay_buffer == 0 {
            return Err(ConfigError::Invalid { key: "RELAY_BUFFER", value: "0".to_string() });
        }

        Ok(AppConfig {
            host,
            port,
            storage,
            database_url,
            mongo_transactions,
            jwt_secret,
            seed_users_file: get("SEED_USERS_FILE").map(PathBuf::from),
            cors_origins,
            relay_buffer,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
