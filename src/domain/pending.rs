use super::ports::Stash;
use super::subject::{SubjectType, TransactionKind};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Where a pending transaction lives in the stash.
///
/// Registrations get one slot per subject type; renewals share a single slot
/// that also records the subject type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Registration(SubjectType),
    Renewal,
}

struct SlotKeys {
    reference: String,
    order_id: String,
    extra: String,
}

impl Slot {
    pub fn for_transaction(kind: TransactionKind, subject: SubjectType) -> Self {
        match kind {
            TransactionKind::Registration => Slot::Registration(subject),
            TransactionKind::Renewal => Slot::Renewal,
        }
    }

    fn keys(&self) -> SlotKeys {
        match self {
            Slot::Registration(subject) => {
                let prefix = subject.stash_prefix();
                SlotKeys {
                    reference: format!("{prefix}TempId"),
                    order_id: format!("{prefix}OrderId"),
                    extra: format!("{prefix}VoterId"),
                }
            }
            Slot::Renewal => SlotKeys {
                reference: "renewalUserId".to_string(),
                order_id: "renewalOrderId".to_string(),
                extra: "renewalUserType".to_string(),
            },
        }
    }
}

/// The in-flight transaction, persisted before control leaves the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub kind: TransactionKind,
    pub subject: SubjectType,
    pub order_id: String,
    /// Staged draft reference; holds the user id for renewals.
    pub temp_id: String,
    /// Base64 identity document too large for the return URL.
    pub document: Option<String>,
}

impl PendingTransaction {
    pub fn slot(&self) -> Slot {
        Slot::for_transaction(self.kind, self.subject)
    }

    /// Writes the record into its slot, replacing whatever was there.
    pub async fn save(&self, stash: &dyn Stash) -> Result<()> {
        let keys = self.slot().keys();
        stash.set(&keys.reference, &self.temp_id).await?;
        stash.set(&keys.order_id, &self.order_id).await?;
        match self.kind {
            TransactionKind::Registration => match &self.document {
                Some(document) => stash.set(&keys.extra, document).await?,
                None => stash.delete(&keys.extra).await?,
            },
            TransactionKind::Renewal => stash.set(&keys.extra, self.subject.as_str()).await?,
        }
        Ok(())
    }

    /// Reads the record of a slot. Incomplete slots yield `None`.
    pub async fn load(stash: &dyn Stash, slot: Slot) -> Result<Option<Self>> {
        let keys = slot.keys();
        let Some(temp_id) = stash.get(&keys.reference).await? else {
            return Ok(None);
        };
        let Some(order_id) = stash.get(&keys.order_id).await? else {
            return Ok(None);
        };
        let extra = stash.get(&keys.extra).await?;

        let record = match slot {
            Slot::Registration(subject) => PendingTransaction {
                kind: TransactionKind::Registration,
                subject,
                order_id,
                temp_id,
                document: extra,
            },
            Slot::Renewal => {
                let Some(subject) = extra.and_then(|value| value.parse().ok()) else {
                    return Ok(None);
                };
                PendingTransaction {
                    kind: TransactionKind::Renewal,
                    subject,
                    order_id,
                    temp_id,
                    document: None,
                }
            }
        };
        Ok(Some(record))
    }

    /// Removes every key of a slot.
    pub async fn clear(stash: &dyn Stash, slot: Slot) -> Result<()> {
        let keys = slot.keys();
        stash.delete(&keys.reference).await?;
        stash.delete(&keys.order_id).await?;
        stash.delete(&keys.extra).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStash;

    fn registration(subject: SubjectType, order_id: &str, temp_id: &str) -> PendingTransaction {
        PendingTransaction {
            kind: TransactionKind::Registration,
            subject,
            order_id: order_id.to_string(),
            temp_id: temp_id.to_string(),
            document: None,
        }
    }

    #[tokio::test]
    async fn test_registration_keys() {
        let stash = InMemoryStash::new();
        let mut record = registration(SubjectType::ServiceProvider, "SP_1", "T1");
        record.document = Some("AAEC".to_string());
        record.save(&stash).await.unwrap();

        assert_eq!(
            stash.get("serviceProviderTempId").await.unwrap().as_deref(),
            Some("T1")
        );
        assert_eq!(
            stash.get("serviceProviderOrderId").await.unwrap().as_deref(),
            Some("SP_1")
        );
        assert_eq!(
            stash.get("serviceProviderVoterId").await.unwrap().as_deref(),
            Some("AAEC")
        );
        assert!(stash.get("agentTempId").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_renewal_round_trip() {
        let stash = InMemoryStash::new();
        let record = PendingTransaction {
            kind: TransactionKind::Renewal,
            subject: SubjectType::Agent,
            order_id: "RENEW_AGENT_9".to_string(),
            temp_id: "U17".to_string(),
            document: None,
        };
        record.save(&stash).await.unwrap();

        assert_eq!(
            stash.get("renewalUserType").await.unwrap().as_deref(),
            Some("agent")
        );
        let loaded = PendingTransaction::load(&stash, Slot::Renewal).await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn test_save_drops_stale_document() {
        let stash = InMemoryStash::new();
        let mut first = registration(SubjectType::Agent, "AGENT_1", "T1");
        first.document = Some("OLD".to_string());
        first.save(&stash).await.unwrap();

        let second = registration(SubjectType::Agent, "AGENT_2", "T2");
        second.save(&stash).await.unwrap();

        let loaded = PendingTransaction::load(&stash, Slot::Registration(SubjectType::Agent))
            .await
            .unwrap();
        assert_eq!(loaded, Some(second));
    }

    #[tokio::test]
    async fn test_incomplete_slot_is_absent() {
        let stash = InMemoryStash::new();
        stash.set("agentTempId", "T1").await.unwrap();
        let loaded = PendingTransaction::load(&stash, Slot::Registration(SubjectType::Agent))
            .await
            .unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_clear_leaves_other_slots() {
        let stash = InMemoryStash::new();
        let agent = registration(SubjectType::Agent, "AGENT_1", "T1");
        let provider = registration(SubjectType::ServiceProvider, "SP_1", "T2");
        agent.save(&stash).await.unwrap();
        provider.save(&stash).await.unwrap();

        PendingTransaction::clear(&stash, agent.slot()).await.unwrap();

        assert_eq!(
            PendingTransaction::load(&stash, agent.slot()).await.unwrap(),
            None
        );
        assert_eq!(
            PendingTransaction::load(&stash, provider.slot())
                .await
                .unwrap(),
            Some(provider)
        );
    }
}
