use crate::domain::checkout::{CheckoutEvent, CheckoutMode, SessionToken};
use crate::domain::ports::WidgetRef;
use crate::error::{CheckoutError, Result};
use tokio::sync::Mutex;

/// Thin wrapper over the third-party checkout widget.
///
/// Callers get a [`CheckoutEvent`] whatever the delivery mode, and must be
/// ready for both a callback result and a redirect. Nothing here retries.
pub struct GatewaySessionAdapter {
    widget: WidgetRef,
    session_prefix: String,
    load_lock: Mutex<()>,
}

impl GatewaySessionAdapter {
    pub fn new(widget: WidgetRef, session_prefix: impl Into<String>) -> Self {
        Self {
            widget,
            session_prefix: session_prefix.into(),
            load_lock: Mutex::new(()),
        }
    }

    /// Checks a raw session id from the backend before anything is opened.
    pub fn session_token(&self, raw: &str) -> Result<SessionToken> {
        SessionToken::parse(raw, &self.session_prefix)
    }

    /// Loads the widget library if it is not loaded yet. Concurrent callers
    /// share a single load.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.widget.is_loaded() {
            return Ok(());
        }
        let _guard = self.load_lock.lock().await;
        if self.widget.is_loaded() {
            return Ok(());
        }
        tracing::info!("loading checkout library");
        self.widget.load().await.map_err(into_gateway_error)
    }

    pub async fn open(&self, token: &SessionToken, mode: CheckoutMode) -> Result<CheckoutEvent> {
        self.ensure_loaded().await?;
        let event = self
            .widget
            .checkout(token, mode)
            .await
            .map_err(into_gateway_error)?;
        tracing::debug!(?mode, ?event, "checkout returned");
        Ok(event)
    }
}

fn into_gateway_error(error: CheckoutError) -> CheckoutError {
    match error {
        CheckoutError::GatewayLoad(_) => error,
        other => CheckoutError::GatewayLoad(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::CallbackPayload;
    use crate::domain::ports::CheckoutWidget;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingWidget {
        loaded: AtomicBool,
        loads: AtomicUsize,
        fail_checkout: bool,
    }

    #[async_trait]
    impl CheckoutWidget for CountingWidget {
        fn is_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }

        async fn load(&self) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.loaded.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn checkout(&self, _token: &SessionToken, mode: CheckoutMode) -> Result<CheckoutEvent> {
            if self.fail_checkout {
                return Err(CheckoutError::Stash("widget crashed".to_string()));
            }
            Ok(match mode {
                CheckoutMode::Callback => CheckoutEvent::Succeeded(CallbackPayload::default()),
                CheckoutMode::Redirect => CheckoutEvent::Redirected {
                    checkout_url: "https://gw.example/pay".to_string(),
                },
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_opens_load_once() {
        let widget = Arc::new(CountingWidget::default());
        let adapter = GatewaySessionAdapter::new(widget.clone(), "session_");
        let token = adapter.session_token("session_1").unwrap();

        let (a, b) = tokio::join!(
            adapter.open(&token, CheckoutMode::Callback),
            adapter.open(&token, CheckoutMode::Redirect)
        );
        assert!(matches!(a.unwrap(), CheckoutEvent::Succeeded(_)));
        assert!(matches!(b.unwrap(), CheckoutEvent::Redirected { .. }));
        assert_eq!(widget.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_widget_errors_surface_as_gateway_errors() {
        let widget = Arc::new(CountingWidget {
            fail_checkout: true,
            ..Default::default()
        });
        let adapter = GatewaySessionAdapter::new(widget, "session_");
        let token = adapter.session_token("session_1").unwrap();
        assert!(matches!(
            adapter.open(&token, CheckoutMode::Redirect).await,
            Err(CheckoutError::GatewayLoad(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_tokens() {
        let adapter = GatewaySessionAdapter::new(Arc::new(CountingWidget::default()), "session_");
        assert!(matches!(
            adapter.session_token("cs_live_123"),
            Err(CheckoutError::InvalidSessionToken(_))
        ));
    }
}
