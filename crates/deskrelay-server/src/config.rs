// Gateway configuration loaded from environment variables.
// Decision: Keep the variable names the helpdesk tool already uses (PORT, DEPARTMENT_ID, HC_API_KEY, ...)
// Decision: Session max age is given in milliseconds, like a cookie maxAge
// Decision: A missing SESSION_SECRET falls back to a random one (sessions won't survive a restart)

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use deskrelay_core::session::DEFAULT_SESSION_TTL_MS;
use deskrelay_core::throttle::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_MS};
use deskrelay_core::{SessionConfig, SessionExpiry, ThrottleConfig, WindowResetPolicy};
use rand::Rng;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_COOKIE_NAME: &str = "deskrelay.sid";
pub const DEFAULT_HELPDESK_API_URL: &str = "https://api.helpcrunch.com/v1";
const DEFAULT_HELPDESK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 300;

/// Helpdesk provider connection settings
#[derive(Clone)]
pub struct HelpdeskConfig {
    pub api_url: String,
    pub api_key: String,
    pub agent_id: u64,
    pub timeout: Duration,
}

impl fmt::Debug for HelpdeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpdeskConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("agent_id", &self.agent_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

/// Complete gateway configuration
#[derive(Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub session_secret: String,
    pub session: SessionConfig,
    pub cookie: CookieConfig,
    /// PostgreSQL URL for the shared session store; in-memory when unset
    pub session_database_url: Option<String>,
    pub session_purge_interval: Duration,
    pub throttle: ThrottleConfig,
    pub users_file: PathBuf,
    pub public_dir: PathBuf,
    pub department_id: String,
    pub department_name: String,
    pub helpdesk: HelpdeskConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("session_secret", &"[REDACTED]")
            .field("session", &self.session)
            .field("cookie", &self.cookie)
            .field(
                "session_database_url",
                &self.session_database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("session_purge_interval", &self.session_purge_interval)
            .field("throttle", &self.throttle)
            .field("users_file", &self.users_file)
            .field("public_dir", &self.public_dir)
            .field("department_id", &self.department_id)
            .field("department_name", &self.department_name)
            .field("helpdesk", &self.helpdesk)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source (environment, test maps)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;

        let session_secret = var("SESSION_SECRET").unwrap_or_else(|| {
            tracing::warn!("SESSION_SECRET not set, using a random secret; sessions won't survive a restart");
            let bytes: [u8; 32] = rand::thread_rng().gen();
            hex::encode(bytes)
        });

        let max_age_ms: i64 = parse_or(var("SESSION_MAX_AGE"), "SESSION_MAX_AGE", DEFAULT_SESSION_TTL_MS)?;
        if max_age_ms <= 0 {
            return Err(anyhow!("SESSION_MAX_AGE must be positive, got {}", max_age_ms));
        }
        let expiry = if parse_bool(var("SESSION_ROLLING")) {
            SessionExpiry::Sliding
        } else {
            SessionExpiry::Fixed
        };
        let ttl = chrono::Duration::try_milliseconds(max_age_ms)
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| anyhow!("SESSION_MAX_AGE is out of range, got {}", max_age_ms))?;
        let session = SessionConfig { ttl, expiry };

        let cookie = CookieConfig {
            name: var("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
            secure: parse_bool(var("SESSION_COOKIE_SECURE")),
        };

        let session_purge_interval = Duration::from_secs(parse_or(
            var("SESSION_PURGE_INTERVAL_SECS"),
            "SESSION_PURGE_INTERVAL_SECS",
            DEFAULT_PURGE_INTERVAL_SECS,
        )?);

        let max_attempts: u32 = parse_or(
            var("LOGIN_THROTTLE_MAX_ATTEMPTS"),
            "LOGIN_THROTTLE_MAX_ATTEMPTS",
            DEFAULT_MAX_ATTEMPTS,
        )?;
        if max_attempts == 0 {
            return Err(anyhow!("LOGIN_THROTTLE_MAX_ATTEMPTS must be at least 1"));
        }
        let window_ms: i64 = parse_or(
            var("LOGIN_THROTTLE_WINDOW_MS"),
            "LOGIN_THROTTLE_WINDOW_MS",
            DEFAULT_WINDOW_MS,
        )?;
        if window_ms <= 0 {
            return Err(anyhow!("LOGIN_THROTTLE_WINDOW_MS must be positive, got {}", window_ms));
        }
        let window = chrono::Duration::try_milliseconds(window_ms)
            .ok_or_else(|| anyhow!("LOGIN_THROTTLE_WINDOW_MS is out of range, got {}", window_ms))?;
        let policy = match var("LOGIN_THROTTLE_RESET") {
            Some(raw) => WindowResetPolicy::from_str(&raw)
                .ok_or_else(|| anyhow!("Invalid LOGIN_THROTTLE_RESET '{}', expected on_limit or every_attempt", raw))?,
            None => WindowResetPolicy::default(),
        };
        let throttle = ThrottleConfig {
            max_attempts,
            window,
            policy,
        };

        let department_id = var("DEPARTMENT_ID").context("DEPARTMENT_ID environment variable required")?;
        let department_name = var("DEPARTMENT_NAME").unwrap_or_default();

        let helpdesk = HelpdeskConfig {
            api_url: var("HC_API_URL")
                .unwrap_or_else(|| DEFAULT_HELPDESK_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: var("HC_API_KEY").context("HC_API_KEY environment variable required")?,
            agent_id: var("HC_AGENT_ID")
                .context("HC_AGENT_ID environment variable required")?
                .trim()
                .parse()
                .context("HC_AGENT_ID must be a numeric agent id")?,
            timeout: Duration::from_secs(parse_or(
                var("HC_TIMEOUT_SECS"),
                "HC_TIMEOUT_SECS",
                DEFAULT_HELPDESK_TIMEOUT_SECS,
            )?),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            session_secret,
            session,
            cookie,
            session_database_url: var("SESSION_DATABASE_URL"),
            session_purge_interval,
            throttle,
            users_file: var("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("users.yaml")),
            public_dir: var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            department_id,
            department_name,
            helpdesk,
            cors_allowed_origins,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, value)),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>) -> bool {
    raw.map(|s| s.trim().eq_ignore_ascii_case("true") || s.trim() == "1")
        .unwrap_or(false)
}
