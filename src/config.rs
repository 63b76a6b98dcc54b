//! Environment-driven application configuration
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_expiration: i64,
    /// Auth cookie lifetime in days
    pub jwt_cookie_expire_days: i64,
    /// Largest accepted photo upload in bytes
    pub max_file_upload: u64,
    pub file_upload_path: PathBuf,
    pub geocoder_provider: String,
    pub geocoder_api_key: String,
    pub cors_origins: Vec<String>,
    pub production: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Read configuration from the process environment, falling back to development defaults
    pub fn from_env() -> Self {
        let cors_origins = var_or("CORS_ALLOWED_ORIGINS", "http://localhost:3000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: var_or("SERVER_HOST", "127.0.0.1"),
            port: parsed_or("SERVER_PORT", 5000),
            mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
            database_name: var_or("DATABASE_NAME", "devcamper"),
            jwt_secret: var_or("JWT_SECRET", "secret"),
            jwt_expiration: parsed_or("JWT_EXPIRATION", 30 * 24 * 60 * 60),
            jwt_cookie_expire_days: parsed_or("JWT_COOKIE_EXPIRE", 30),
            max_file_upload: parsed_or("MAX_FILE_UPLOAD", 1_000_000),
            file_upload_path: PathBuf::from(var_or("FILE_UPLOAD_PATH", "./public/uploads")),
            geocoder_provider: var_or("GEOCODER_PROVIDER", "mapquest"),
            geocoder_api_key: var_or("GEOCODER_API_KEY", ""),
            cors_origins,
            production: var_or("APP_ENV", "development") == "production",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "devcamper".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiration: 30 * 24 * 60 * 60,
            jwt_cookie_expire_days: 30,
            max_file_upload: 1_000_000,
            file_upload_path: PathBuf::from("./public/uploads"),
            geocoder_provider: "mapquest".to_string(),
            geocoder_api_key: String::new(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            production: false,
        }
    }
}
