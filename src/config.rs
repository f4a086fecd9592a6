use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// How meeting status changes are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only pairs from the transition table are accepted.
    Guarded,
    /// Any status may be written over any other.
    Overwrite,
}

#[derive(Debug, Clone, Deserialize)]
pub enum EmailProviderConfig {
    Smtp {
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
    },
    /// Well-known provider addressed by name, e.g. "gmail".
    Service {
        name: String,
        username: String,
        password: String,
    },
    Log,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub provider: EmailProviderConfig,
    pub from_address: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupDefaults {
    pub time_zone: String,
    pub language: String,
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub app_base_url: String,
    pub token_ttl_hours: i64,
    pub single_use_tokens: bool,
    pub transitions: TransitionPolicy,
    pub signup: SignupDefaults,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl EmailConfig {
    fn from_env() -> anyhow::Result<Self> {
        let provider = match env_or("EMAIL_PROVIDER", "log").to_lowercase().as_str() {
            "smtp" => EmailProviderConfig::Smtp {
                host: std::env::var("SMTP_HOST")?,
                port: env_parsed("SMTP_PORT", 587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                use_tls: env_flag("SMTP_TLS", true),
            },
            "service" => EmailProviderConfig::Service {
                name: std::env::var("EMAIL_SERVICE")?,
                username: std::env::var("SMTP_USERNAME")?,
                password: std::env::var("SMTP_PASSWORD")?,
            },
            "log" => EmailProviderConfig::Log,
            other => anyhow::bail!("unknown EMAIL_PROVIDER {other:?}"),
        };
        Ok(Self {
            provider,
            from_address: env_or("EMAIL_FROM", "no-reply@slotbook.local"),
            from_name: Some(env_or("EMAIL_FROM_NAME", "Slotbook")),
        })
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env_or("STORE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "slotbook"),
            audience: env_or("JWT_AUDIENCE", "slotbook-users"),
            ttl_minutes: env_parsed("JWT_TTL_MINUTES", 60),
        };

        let transitions = match env_or("MEETING_TRANSITIONS", "guarded").to_lowercase().as_str() {
            "guarded" => TransitionPolicy::Guarded,
            "overwrite" => TransitionPolicy::Overwrite,
            other => anyhow::bail!("unknown MEETING_TRANSITIONS {other:?}"),
        };

        Ok(Self {
            store,
            database_url,
            jwt,
            email: EmailConfig::from_env()?,
            app_base_url: env_or("APP_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            token_ttl_hours: env_parsed("INTERACTION_TOKEN_TTL_HOURS", 24),
            single_use_tokens: env_flag("INTERACTION_TOKEN_SINGLE_USE", true),
            transitions,
            signup: SignupDefaults {
                time_zone: env_or("DEFAULT_TIME_ZONE", "CST"),
                language: env_or("DEFAULT_LANGUAGE", "es"),
                country: env_or("DEFAULT_COUNTRY", "cr"),
            },
        })
    }
}
