use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of account a payment-gated transaction concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectType {
    #[serde(rename = "agent")]
    Agent,
    #[serde(
        rename = "service-provider",
        alias = "serviceProvider",
        alias = "service_provider",
        alias = "serviceprovider"
    )]
    ServiceProvider,
}

impl SubjectType {
    pub const ALL: [SubjectType; 2] = [SubjectType::Agent, SubjectType::ServiceProvider];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Agent => "agent",
            SubjectType::ServiceProvider => "service-provider",
        }
    }

    /// Key prefix of this subject's registration slot in the stash.
    pub fn stash_prefix(&self) -> &'static str {
        match self {
            SubjectType::Agent => "agent",
            SubjectType::ServiceProvider => "serviceProvider",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(SubjectType::Agent),
            "service-provider" | "service_provider" | "serviceprovider" => {
                Ok(SubjectType::ServiceProvider)
            }
            other => Err(format!("unknown subject type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Registration,
    Renewal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Registration => "registration",
            TransactionKind::Renewal => "renewal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural information carried by a gateway order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTag {
    pub subject: SubjectType,
    pub kind: TransactionKind,
}

/// Known order id prefixes, in the order they are checked.
const ORDER_PREFIXES: [(&str, OrderTag); 4] = [
    (
        "RENEW_SERVICE_",
        OrderTag {
            subject: SubjectType::ServiceProvider,
            kind: TransactionKind::Renewal,
        },
    ),
    (
        "RENEW_AGENT_",
        OrderTag {
            subject: SubjectType::Agent,
            kind: TransactionKind::Renewal,
        },
    ),
    (
        "SP_",
        OrderTag {
            subject: SubjectType::ServiceProvider,
            kind: TransactionKind::Registration,
        },
    ),
    (
        "AGENT_",
        OrderTag {
            subject: SubjectType::Agent,
            kind: TransactionKind::Registration,
        },
    ),
];

impl OrderTag {
    /// Reads the tag from the literal prefix of `order_id`. Case-sensitive.
    pub fn parse(order_id: &str) -> Option<OrderTag> {
        ORDER_PREFIXES
            .iter()
            .find(|(prefix, _)| order_id.starts_with(prefix))
            .map(|(_, tag)| *tag)
    }
}

/// Derives the subject type of a transaction from its order id alone.
///
/// Returns `None` (unknown) for any identifier without a recognised prefix.
/// This is the only recovery path when the stash record is gone but the
/// order id survived in the return URL, so it never guesses.
pub fn classify(order_id: &str) -> Option<SubjectType> {
    OrderTag::parse(order_id).map(|tag| tag.subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_renewal_prefixes() {
        assert_eq!(
            classify("RENEW_SERVICE_42"),
            Some(SubjectType::ServiceProvider)
        );
        assert_eq!(classify("RENEW_AGENT_9"), Some(SubjectType::Agent));
        assert_eq!(classify("RENEW_SERVICE_"), Some(SubjectType::ServiceProvider));
    }

    #[test]
    fn test_classify_registration_prefixes() {
        assert_eq!(classify("SP_1700000000"), Some(SubjectType::ServiceProvider));
        assert_eq!(classify("AGENT_1700000000"), Some(SubjectType::Agent));
        assert_eq!(
            OrderTag::parse("SP_1").map(|t| t.kind),
            Some(TransactionKind::Registration)
        );
        assert_eq!(
            OrderTag::parse("RENEW_AGENT_1").map(|t| t.kind),
            Some(TransactionKind::Renewal)
        );
    }

    #[test]
    fn test_classify_unknown() {
        for order_id in [
            "",
            "order_123",
            "renew_agent_9",
            "sp_1",
            "RENEW_",
            "RENEW_OWNER_1",
            " RENEW_AGENT_9",
            "XSP_1",
        ] {
            assert_eq!(classify(order_id), None, "{order_id:?}");
        }
    }

    #[test]
    fn test_subject_type_parsing() {
        assert_eq!("agent".parse::<SubjectType>(), Ok(SubjectType::Agent));
        assert_eq!(
            "Service-Provider".parse::<SubjectType>(),
            Ok(SubjectType::ServiceProvider)
        );
        assert!("owner".parse::<SubjectType>().is_err());
    }

    #[test]
    fn test_subject_type_serde() {
        let json = serde_json::to_string(&SubjectType::ServiceProvider).unwrap();
        assert_eq!(json, "\"service-provider\"");
        let parsed: SubjectType = serde_json::from_str("\"serviceProvider\"").unwrap();
        assert_eq!(parsed, SubjectType::ServiceProvider);
    }
}
