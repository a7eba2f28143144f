use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use derive_more::Display;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::Deserialize;
use std::{env, fmt, path::PathBuf, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Display, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    #[display("development")]
    Development,
    #[display("production")]
    Production,
    #[display("testing")]
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [AppEnvironment::Development, AppEnvironment::Production, AppEnvironment::Testing]
            .into_iter()
            .find(|candidate| candidate.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::Message(format!("Invalid APP_ENV value: {}", s)))
    }
}

/// Everything the server reads at startup. Sources, lowest priority first:
/// built-in defaults, `config/default`, `config/<env>`, then `APP_*`
/// environment variables (a `.env` file is loaded into the environment).
#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub env: AppEnvironment,
    pub name: String,
    pub port: u16,
    pub host: String,
    pub worker_count: usize,

    pub database_url: String,
    pub redis_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub refresh_token_secret: String,
    pub refresh_token_exp_days: i64,
    pub email_token_secret: String,

    /// Base used when building links that go out by email.
    pub public_base_url: String,

    pub upload_dir: PathBuf,
    pub thumbnail_dir: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_upload_mb: usize,

    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_sender: String,

    pub audit_interval_hours: u64,
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("name", "Photo-Gallery")?
        .set_default("port", 8080)?
        .set_default("host", "127.0.0.1")?
        .set_default("worker_count", num_cpus::get() as i64)?
        .set_default("database_url", "")?
        .set_default("cors_allowed_origins", vec!["*"])?
        .set_default("jwt_secret", "")?
        .set_default("jwt_expiration_minutes", 15)?
        .set_default("refresh_token_secret", "")?
        .set_default("refresh_token_exp_days", 7)?
        .set_default("email_token_secret", "")?
        .set_default("public_base_url", "http://127.0.0.1:8080")?
        .set_default("upload_dir", "media/uploads")?
        .set_default("thumbnail_dir", "media/thumbnails")?
        .set_default("ffmpeg_path", "ffmpeg")?
        .set_default("ffprobe_path", "ffprobe")?
        .set_default("max_upload_mb", 512)?
        .set_default("email_sender", "no-reply@localhost")?
        .set_default("audit_interval_hours", 24)
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let env_name = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
        )?;

        let config: Self = with_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            )
            .set_override("env", env_name.to_string())?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = [
            ("JWT_SECRET", &self.jwt_secret),
            ("REFRESH_TOKEN_SECRET", &self.refresh_token_secret),
            ("EMAIL_TOKEN_SECRET", &self.email_token_secret),
        ];

        let mut problems: Vec<String> = secrets
            .iter()
            .filter(|(_, value)| value.len() < 32)
            .map(|(name, _)| format!("{name} must be at least 32 characters"))
            .collect();

        if self.database_url.trim().is_empty() {
            problems.push("DATABASE_URL must be set".into());
        }
        if self.email_token_secret == self.jwt_secret {
            problems.push("EMAIL_TOKEN_SECRET must differ from JWT_SECRET".into());
        }
        if self.max_upload_mb == 0 {
            problems.push("MAX_UPLOAD_MB must be positive".into());
        }
        if self.audit_interval_hours == 0 {
            problems.push("AUDIT_INTERVAL_HOURS must be positive".into());
        }
        if url::Url::parse(&self.public_base_url).is_err() {
            problems.push("PUBLIC_BASE_URL must be an absolute URL".into());
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            problems.push("Wildcard CORS (*) is not allowed in production".into());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(problems.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    /// Origins from either list entries or a single comma-separated string.
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn redact(secret: &str) -> &'static str {
    match secret.len() {
        0 => "[MISSING]",
        1..32 => "[TOO_SHORT]",
        _ => "[REDACTED]",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("bind", &format_args!("{}:{}", self.host, self.port))
            .field("worker_count", &self.worker_count)
            .field("database_url", &redact(&self.database_url))
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[SET]"))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("refresh_token_secret", &redact(&self.refresh_token_secret))
            .field("refresh_token_exp_days", &self.refresh_token_exp_days)
            .field("email_token_secret", &redact(&self.email_token_secret))
            .field("public_base_url", &self.public_base_url)
            .field("upload_dir", &self.upload_dir)
            .field("thumbnail_dir", &self.thumbnail_dir)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("ffprobe_path", &self.ffprobe_path)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("email_api_url", &self.email_api_url)
            .field("email_api_key", &self.email_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("email_sender", &self.email_sender)
            .field("audit_interval_hours", &self.audit_interval_hours)
            .finish()
    }
}

/// HMAC key material for one token family.
#[derive(Clone)]
pub struct KeyPair {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        let secret = Zeroizing::new(secret.as_bytes().to_vec());
        KeyPair {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPair([REDACTED])")
    }
}

#[derive(Clone, Debug)]
pub struct SigningKeys {
    pub access: KeyPair,
    pub refresh: KeyPair,
    pub email: KeyPair,
}

impl From<&AppConfig> for SigningKeys {
    fn from(config: &AppConfig) -> Self {
        SigningKeys {
            access: KeyPair::from_secret(&config.jwt_secret),
            refresh: KeyPair::from_secret(&config.refresh_token_secret),
            email: KeyPair::from_secret(&config.email_token_secret),
        }
    }
}
