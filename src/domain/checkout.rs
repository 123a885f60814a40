use super::subject::SubjectType;
use crate::error::{CheckoutError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Opaque gateway session handle, checked for the gateway's literal prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn parse(raw: &str, expected_prefix: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CheckoutError::InvalidSessionToken(
                "empty session token".to_string(),
            ));
        }
        if !raw.starts_with(expected_prefix) {
            return Err(CheckoutError::InvalidSessionToken(format!(
                "`{raw}` does not start with `{expected_prefix}`"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the checkout widget delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Hosted UI on the same page; the widget calls back.
    Callback,
    /// Full-page navigation to the gateway and back with query parameters.
    #[default]
    Redirect,
}

/// Payload handed to the success callback in callback mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,
    #[serde(default, alias = "temp_id")]
    pub temp_id: Option<String>,
    #[serde(default)]
    pub subject: Option<SubjectType>,
}

/// What the widget reported after a checkout was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    Succeeded(CallbackPayload),
    Failed { reason: String },
    /// The page is leaving for the gateway; resolution happens on return.
    Redirected { checkout_url: String },
    /// The hosted checkout was closed without a result.
    Dismissed,
}

impl CheckoutEvent {
    /// The resolution input carried by this event, if any.
    pub fn into_source(self) -> Option<OutcomeSource> {
        match self {
            CheckoutEvent::Succeeded(payload) => Some(OutcomeSource::Callback(payload)),
            _ => None,
        }
    }
}

/// Query parameters the gateway appends to the return URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnParams {
    pub order_id: Option<String>,
    pub temp_id: Option<String>,
}

impl ReturnParams {
    /// Parses a query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let mut params = ReturnParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "order_id" | "orderId" => params.order_id = Some(value.to_string()),
                "tempId" | "temp_id" => params.temp_id = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| CheckoutError::Config(format!("invalid return URL `{raw}`: {e}")))?;
        Ok(Self::from_query(url.query().unwrap_or_default()))
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() && self.temp_id.is_none()
    }
}

/// The two ways a checkout result reaches the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeSource {
    Callback(CallbackPayload),
    Redirect(ReturnParams),
}

impl OutcomeSource {
    /// Landing page mounted without any return parameters.
    pub fn mount() -> Self {
        OutcomeSource::Redirect(ReturnParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_prefix_check() {
        assert!(SessionToken::parse("session_abc", "session_").is_ok());
        assert!(matches!(
            SessionToken::parse("abc", "session_"),
            Err(CheckoutError::InvalidSessionToken(_))
        ));
        assert!(matches!(
            SessionToken::parse("   ", "session_"),
            Err(CheckoutError::InvalidSessionToken(_))
        ));
    }

    #[test]
    fn test_return_params_from_url() {
        let params = ReturnParams::from_url(
            "https://portal.example/payment/landing?order_id=RENEW_SERVICE_42&tempId=T2",
        )
        .unwrap();
        assert_eq!(params.order_id.as_deref(), Some("RENEW_SERVICE_42"));
        assert_eq!(params.temp_id.as_deref(), Some("T2"));
    }

    #[test]
    fn test_return_params_ignores_blank_and_unknown() {
        let params = ReturnParams::from_query("?order_id=&utm_source=mail&temp_id=T9");
        assert_eq!(params.order_id, None);
        assert_eq!(params.temp_id.as_deref(), Some("T9"));
        assert!(ReturnParams::from_query("").is_empty());
    }

    #[test]
    fn test_only_success_event_carries_a_source() {
        let payload = CallbackPayload {
            order_id: Some("SP_1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            CheckoutEvent::Succeeded(payload.clone()).into_source(),
            Some(OutcomeSource::Callback(payload))
        );
        assert_eq!(CheckoutEvent::Dismissed.into_source(), None);
    }
}
