use crate::config::GatewayConfig;
use crate::domain::checkout::{CheckoutEvent, CheckoutMode, SessionToken};
use crate::domain::ports::CheckoutWidget;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// Gateway-hosted checkout page, driven from a headless process.
///
/// Only redirect delivery is possible here: opening a session yields the
/// hosted page URL the user has to visit. The gateway then sends the browser
/// to the return URL with `order_id` appended.
pub struct HostedCheckout {
    client: reqwest::Client,
    config: GatewayConfig,
    loaded: AtomicBool,
}

impl HostedCheckout {
    pub fn new(config: GatewayConfig) -> Self {
        let loaded = config.script_url.is_none();
        Self {
            client: reqwest::Client::new(),
            config,
            loaded: AtomicBool::new(loaded),
        }
    }

    fn checkout_url(&self, token: &SessionToken) -> Result<String> {
        let mut url = Url::parse(&self.config.checkout_url)
            .map_err(|e| CheckoutError::GatewayLoad(format!("invalid checkout URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("session_id", token.as_str());
        Ok(url.into())
    }
}

#[async_trait]
impl CheckoutWidget for HostedCheckout {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    async fn load(&self) -> Result<()> {
        let Some(script_url) = &self.config.script_url else {
            self.loaded.store(true, Ordering::Release);
            return Ok(());
        };

        self.client
            .get(script_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CheckoutError::GatewayLoad(format!("{script_url}: {e}")))?;

        tracing::info!(%script_url, "checkout library loaded");
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    async fn checkout(&self, token: &SessionToken, mode: CheckoutMode) -> Result<CheckoutEvent> {
        match mode {
            CheckoutMode::Redirect => {
                let checkout_url = self.checkout_url(token)?;
                tracing::info!(%checkout_url, "redirecting to hosted checkout");
                Ok(CheckoutEvent::Redirected { checkout_url })
            }
            CheckoutMode::Callback => {
                tracing::warn!("callback checkout needs an embedded UI; nothing was opened");
                Ok(CheckoutEvent::Dismissed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_redirect_builds_checkout_url() {
        let widget = HostedCheckout::new(GatewayConfig::default());
        assert!(widget.is_loaded());

        let token = SessionToken::parse("session_abc 1", "session_").unwrap();
        let event = widget.checkout(&token, CheckoutMode::Redirect).await.unwrap();
        assert_eq!(
            event,
            CheckoutEvent::Redirected {
                checkout_url: "https://payments.example.com/checkout?session_id=session_abc+1"
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_script_fails_to_load() {
        let widget = HostedCheckout::new(GatewayConfig {
            script_url: Some("http://127.0.0.1:1/checkout.js".to_string()),
            ..GatewayConfig::default()
        });
        assert!(!widget.is_loaded());
        assert!(matches!(
            widget.load().await,
            Err(CheckoutError::GatewayLoad(_))
        ));
        assert!(!widget.is_loaded());
    }
}
