use crate::config::BackendConfig;
use crate::domain::backend::{OrderRequest, OrderResponse, VerifyRequest, VerifyResponse, VerifyRoute};
use crate::domain::ports::RegistrationBackend;
use crate::error::{BackendError, CheckoutError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// [`RegistrationBackend`] over the marketplace's JSON REST API.
///
/// No retries: each failure is reported once and left to the user to retry.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckoutError::Config(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> std::result::Result<T, BackendError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&bytes).unwrap_or_else(|| format!("HTTP {status}"));
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Pulls `error` or `message` out of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl RegistrationBackend for HttpBackend {
    async fn create_order(
        &self,
        request: OrderRequest,
    ) -> std::result::Result<OrderResponse, BackendError> {
        let body = request
            .to_body()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        self.post_json(self.config.order_path(request.route()), &body)
            .await
    }

    async fn verify(
        &self,
        route: VerifyRoute,
        request: VerifyRequest,
    ) -> std::result::Result<VerifyResponse, BackendError> {
        self.post_json(self.config.verify_path(route), &request.to_body())
            .await
    }
}
