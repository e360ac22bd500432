use std::fmt;

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cashfree: CashfreeConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the service that issues access tokens.
    pub jwt_secret: String,
}

#[derive(Deserialize, Clone)]
pub struct CashfreeConfig {
    #[serde(default)]
    pub enabled: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_cashfree_base_url")]
    pub base_url: String,
    #[serde(default = "default_cashfree_api_version")]
    pub api_version: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// May contain the literal `{order_id}` placeholder; Cashfree expands it.
    #[serde(default = "default_return_url")]
    pub return_url: String,
    #[serde(default = "default_notify_url")]
    pub notify_url: String,
    /// When set, webhook signatures are checked against this secret.
    pub webhook_secret: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,
    /// Let the status endpoint credit a campaign when the gateway reports
    /// success before the webhook has arrived.
    #[serde(default)]
    pub reconcile_on_status: bool,
    /// Larger webhook bodies are acknowledged and discarded unread.
    #[serde(default = "default_webhook_max_body_bytes")]
    pub webhook_max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_cashfree_base_url() -> String {
    "https://sandbox.cashfree.com/pg".to_string()
}

fn default_cashfree_api_version() -> String {
    "2022-09-01".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_return_url() -> String {
    "http://localhost:5173/payment-success?order_id={order_id}".to_string()
}

fn default_notify_url() -> String {
    "http://localhost:5000/api/payment/webhook".to_string()
}

fn default_gateway_timeout() -> u64 {
    30
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_webhook_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

impl Default for CashfreeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: None,
            client_secret: None,
            base_url: default_cashfree_base_url(),
            api_version: default_cashfree_api_version(),
            currency: default_currency(),
            return_url: default_return_url(),
            notify_url: default_notify_url(),
            webhook_secret: None,
            timeout_secs: default_gateway_timeout(),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: default_webhook_timeout(),
            reconcile_on_status: false,
            webhook_max_body_bytes: default_webhook_max_body_bytes(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "<redacted>" } else { "<unset>" }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for CashfreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CashfreeConfig")
            .field("enabled", &self.enabled)
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("currency", &self.currency)
            .field("return_url", &self.return_url)
            .field("notify_url", &self.notify_url)
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("database.url", "sqlite://hopeforall.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("cashfree.enabled", false)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with HOPEFORALL__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("HOPEFORALL").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite://hopeforall.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
            },
            cashfree: CashfreeConfig::default(),
            payments: PaymentsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}
