//! Runtime configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//! Every field has a default so an empty file (or no file) is a valid config.

use crate::domain::backend::{OrderRoute, VerifyRoute};
use crate::domain::checkout::CheckoutMode;
use crate::domain::outcome::Destination;
use crate::domain::subject::SubjectType;
use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const ENV_BACKEND_URL: &str = "PAYGATE_BACKEND_URL";
pub const ENV_LOG_LEVEL: &str = "PAYGATE_LOG_LEVEL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub backend: BackendConfig,
    pub gateway: GatewayConfig,
    pub pages: PageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub agent_order_path: String,
    pub service_provider_order_path: String,
    pub renewal_order_path: String,
    pub agent_verify_path: String,
    pub service_provider_verify_path: String,
    pub agent_renewal_verify_path: String,
    pub service_provider_renewal_verify_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            agent_order_path: "/api/agents/payment/create-order".to_string(),
            service_provider_order_path: "/api/service-providers/payment/create-order"
                .to_string(),
            renewal_order_path: "/api/renewal/create-order".to_string(),
            agent_verify_path: "/api/agents/payment/verify".to_string(),
            service_provider_verify_path: "/api/service-providers/payment/verify".to_string(),
            agent_renewal_verify_path: "/api/renewal/agent/verify".to_string(),
            service_provider_renewal_verify_path: "/api/renewal/service-provider/verify"
                .to_string(),
        }
    }
}

impl BackendConfig {
    pub fn order_path(&self, route: OrderRoute) -> &str {
        match route {
            OrderRoute::AgentRegistration => &self.agent_order_path,
            OrderRoute::ServiceProviderRegistration => &self.service_provider_order_path,
            OrderRoute::Renewal => &self.renewal_order_path,
        }
    }

    pub fn verify_path(&self, route: VerifyRoute) -> &str {
        match route {
            VerifyRoute::AgentRegistration => &self.agent_verify_path,
            VerifyRoute::ServiceProviderRegistration => &self.service_provider_verify_path,
            VerifyRoute::AgentRenewal => &self.agent_renewal_verify_path,
            VerifyRoute::ServiceProviderRenewal => &self.service_provider_renewal_verify_path,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Checkout library to load before the first session is opened.
    pub script_url: Option<String>,
    pub checkout_url: String,
    /// Literal prefix every session token must carry. Empty disables the check.
    pub session_prefix: String,
    pub mode: CheckoutMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            script_url: None,
            checkout_url: "https://payments.example.com/checkout".to_string(),
            session_prefix: "session_".to_string(),
            mode: CheckoutMode::Redirect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub agent_login: String,
    pub service_provider_login: String,
    pub agent_registration: String,
    pub service_provider_registration: String,
    pub home: String,
    /// Delay before the automatic move to the login page after a success.
    pub countdown_secs: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            agent_login: "/agent/login".to_string(),
            service_provider_login: "/service-provider/login".to_string(),
            agent_registration: "/agent/register".to_string(),
            service_provider_registration: "/service-provider/register".to_string(),
            home: "/".to_string(),
            countdown_secs: 5,
        }
    }
}

impl PageConfig {
    pub fn path(&self, destination: Destination) -> &str {
        match destination {
            Destination::Login(SubjectType::Agent) => &self.agent_login,
            Destination::Login(SubjectType::ServiceProvider) => &self.service_provider_login,
            Destination::Registration(SubjectType::Agent) => &self.agent_registration,
            Destination::Registration(SubjectType::ServiceProvider) => {
                &self.service_provider_registration
            }
            Destination::Home => &self.home,
        }
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl CheckoutConfig {
    /// Loads the config file (if any), applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    CheckoutError::Config(format!("could not read `{}`: {e}", path.display()))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CheckoutError::Config(e.to_string()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            CheckoutError::Config(format!(
                "backend.base_url `{}` is not a valid URL: {e}",
                self.backend.base_url
            ))
        })?;
        Url::parse(&self.gateway.checkout_url).map_err(|e| {
            CheckoutError::Config(format!(
                "gateway.checkout_url `{}` is not a valid URL: {e}",
                self.gateway.checkout_url
            ))
        })?;
        if self.backend.timeout_secs == 0 {
            return Err(CheckoutError::Config(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
