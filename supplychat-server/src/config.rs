//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for supplychat-server.
///
/// Every field has a default so the server starts without any environment
/// variables set. A `.env` file in the working directory is honoured.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://supplychat.db"`).
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins; `None` allows any.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,

    /// HMAC secret for access tokens. When unset a random secret is
    /// generated per process, so tokens do not survive a restart.
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Model id handed to the agent backend.
    pub agent_model: String,

    /// Provider API key for the agent backend.
    pub agent_api_key: Option<String>,

    pub agent_temperature: f64,

    /// System prompt template, re-read on every agent call.
    pub system_prompt_path: String,

    /// Deadline for a single agent call.
    pub agent_timeout_secs: u64,

    /// Exchanges the agent remembers per user.
    pub agent_history_turns: usize,

    /// sqlx SQLite URL of the agent's conversation memory
    /// (default: `"sqlite://supplychat-memory.db"`).
    pub agent_memory_db: String,

    /// Build the agent backend at startup instead of on the first message.
    pub agent_eager_init: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".into(),
            database_url: "sqlite://supplychat.db".into(),
            log_level: "info".into(),
            log_json: false,
            cors_allowed_origins: Some("http://localhost:3000".into()),
            enable_swagger: true,
            jwt_secret: None,
            token_ttl_secs: 8 * 60 * 60,
            agent_model: "gemini-2.0-flash".into(),
            agent_api_key: None,
            agent_temperature: 0.2,
            system_prompt_path: "./prompt/system.md".into(),
            agent_timeout_secs: 120,
            agent_history_turns: 20,
            agent_memory_db: "sqlite://supplychat-memory.db".into(),
            agent_eager_init: true,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            bind_address: env_or("SUPPLYCHAT_BIND", &defaults.bind_address),
            database_url: env_or("SUPPLYCHAT_DATABASE_URL", &defaults.database_url),
            log_level: env_or("SUPPLYCHAT_LOG", &defaults.log_level),
            log_json: parse_bool("SUPPLYCHAT_LOG_JSON", defaults.log_json),
            cors_allowed_origins: match std::env::var("SUPPLYCHAT_CORS_ORIGINS") {
                Ok(v) if v.trim() == "*" => None,
                Ok(v) => Some(v),
                Err(_) => defaults.cors_allowed_origins,
            },
            enable_swagger: parse_bool("SUPPLYCHAT_ENABLE_SWAGGER", defaults.enable_swagger),
            jwt_secret: env_opt("SUPPLYCHAT_JWT_SECRET"),
            token_ttl_secs: parse_env("SUPPLYCHAT_TOKEN_TTL_SECS", defaults.token_ttl_secs),
            agent_model: env_or("SUPPLYCHAT_AGENT_MODEL", &defaults.agent_model),
            agent_api_key: env_opt("SUPPLYCHAT_AGENT_API_KEY"),
            agent_temperature: parse_env(
                "SUPPLYCHAT_AGENT_TEMPERATURE",
                defaults.agent_temperature,
            ),
            system_prompt_path: env_or(
                "SUPPLYCHAT_SYSTEM_PROMPT_PATH",
                &defaults.system_prompt_path,
            ),
            agent_timeout_secs: parse_env(
                "SUPPLYCHAT_AGENT_TIMEOUT_SECS",
                defaults.agent_timeout_secs,
            ),
            agent_history_turns: parse_env(
                "SUPPLYCHAT_AGENT_HISTORY_TURNS",
                defaults.agent_history_turns,
            ),
            agent_memory_db: env_or(
                "SUPPLYCHAT_AGENT_MEMORY_DB",
                &defaults.agent_memory_db,
            ),
            agent_eager_init: parse_bool(
                "SUPPLYCHAT_AGENT_EAGER_INIT",
                defaults.agent_eager_init,
            ),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
