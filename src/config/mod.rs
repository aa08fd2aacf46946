//! Configuration module for the LuminaHealth backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_ADMIN_EMAIL: &str = "admin@luminahealth.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_EMAILJS_BASE_URL: &str = "https://api.emailjs.com";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite file backing the local cache
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Admin login pair
    pub admin: AdminCredentials,
    /// Remote document store; `None` runs against the in-process store
    pub remote_url: Option<Url>,
    pub remote_api_key: Option<String>,
    pub sync: SyncConfig,
    pub email: EmailConfig,
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// The single admin credential pair.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

/// Time budgets and merge behavior for the sync gateway and approval flow.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub submit_timeout: Duration,
    pub fetch_timeout: Duration,
    pub notify_timeout: Duration,
    pub approval_dismiss: Duration,
    /// Drop local copies of applications the remote store already returned
    pub dedupe_applications: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_millis(3000),
            fetch_timeout: Duration::from_millis(2000),
            notify_timeout: Duration::from_millis(10_000),
            approval_dismiss: Duration::from_millis(1500),
            dedupe_applications: false,
        }
    }
}

/// EmailJS settings; any missing id leaves notifications unconfigured.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
    pub base_url: Url,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            service_id: None,
            template_id: None,
            public_key: None,
            base_url: Url::parse(DEFAULT_EMAILJS_BASE_URL).expect("default EmailJS URL is valid"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("LUMINA_DB_PATH")
            .unwrap_or_else(|_| "./data/cache.sqlite".to_string())
            .into();

        let bind_addr = env::var("LUMINA_BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!("Invalid LUMINA_BIND_ADDR {:?}, using default", raw);
                    None
                }
            })
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.parse().expect("default bind address is valid"));

        let log_level = env::var("LUMINA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match env::var("LUMINA_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Invalid LUMINA_LOG_FORMAT {:?}, using text", raw);
                LogFormat::Text
            }),
            Err(_) => LogFormat::Text,
        };

        let admin = AdminCredentials {
            email: env::var("LUMINA_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string()),
            password: env::var("LUMINA_ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
        };

        let remote_url = non_empty("LUMINA_REMOTE_URL").and_then(|raw| match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Invalid LUMINA_REMOTE_URL {:?}: {}", raw, e);
                None
            }
        });
        let remote_api_key = non_empty("LUMINA_REMOTE_API_KEY");

        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            submit_timeout: millis("LUMINA_SUBMIT_TIMEOUT_MS", defaults.submit_timeout),
            fetch_timeout: millis("LUMINA_FETCH_TIMEOUT_MS", defaults.fetch_timeout),
            notify_timeout: millis("LUMINA_NOTIFY_TIMEOUT_MS", defaults.notify_timeout),
            approval_dismiss: millis("LUMINA_APPROVAL_DISMISS_MS", defaults.approval_dismiss),
            dedupe_applications: env::var("LUMINA_DEDUPE_APPLICATIONS")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        let email_defaults = EmailConfig::default();
        let email = EmailConfig {
            service_id: non_empty("EMAILJS_SERVICE_ID"),
            template_id: non_empty("EMAILJS_TEMPLATE_ID"),
            public_key: non_empty("EMAILJS_PUBLIC_KEY"),
            base_url: non_empty("EMAILJS_BASE_URL")
                .and_then(|raw| Url::parse(&raw).ok())
                .unwrap_or(email_defaults.base_url),
        };

        Self {
            db_path,
            bind_addr,
            log_level,
            log_format,
            admin,
            remote_url,
            remote_api_key,
            sync,
            email,
        }
    }

    /// True when the admin password was left at its built-in default.
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin.password == DEFAULT_ADMIN_PASSWORD
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn millis(key: &str, default: Duration) -> Duration {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!("Invalid {} {:?}, using {:?}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
