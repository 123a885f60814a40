use super::backend::AccountSummary;
use super::subject::SubjectType;
use serde::Serialize;
use std::fmt;

/// Classification of a verification error by its wording.
///
/// The backend reports these conditions only as free text, so the match is
/// lexical and case-insensitive. Checked in declaration order: a message
/// mentioning "pending" is `Pending` whatever else it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationClass {
    Pending,
    Expired,
    Existing,
    Failed,
}

impl VerificationClass {
    pub fn of(message: &str) -> Self {
        let message = message.to_lowercase();
        if message.contains("pending") || message.contains("processing") {
            VerificationClass::Pending
        } else if message.contains("expired") || message.contains("session") {
            VerificationClass::Expired
        } else if message.contains("already exists") || message.contains("already registered") {
            VerificationClass::Existing
        } else {
            VerificationClass::Failed
        }
    }
}

impl fmt::Display for VerificationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerificationClass::Pending => "pending",
            VerificationClass::Expired => "expired",
            VerificationClass::Existing => "existing",
            VerificationClass::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeState {
    Processing,
    Success,
    Existing,
    Pending,
    Expired,
    Failed,
}

/// Resolved state of a payment-gated transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Outcome {
    Processing,
    Success {
        subject: SubjectType,
        account: AccountSummary,
    },
    /// Finalized by an earlier attempt. Shown like `Success`, never as an error.
    Existing {
        subject: SubjectType,
        account: AccountSummary,
    },
    Pending {
        subject: SubjectType,
        message: String,
    },
    Expired {
        subject: Option<SubjectType>,
        message: String,
    },
    Failed {
        subject: Option<SubjectType>,
        message: String,
    },
}

/// The single forward control offered with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "subject", rename_all = "kebab-case")]
pub enum Action {
    Refresh,
    Retry,
    Restart(SubjectType),
    GoToLogin(SubjectType),
    GoHome,
}

/// A page the client can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Destination {
    Login(SubjectType),
    Registration(SubjectType),
    Home,
}

impl Outcome {
    pub fn state(&self) -> OutcomeState {
        match self {
            Outcome::Processing => OutcomeState::Processing,
            Outcome::Success { .. } => OutcomeState::Success,
            Outcome::Existing { .. } => OutcomeState::Existing,
            Outcome::Pending { .. } => OutcomeState::Pending,
            Outcome::Expired { .. } => OutcomeState::Expired,
            Outcome::Failed { .. } => OutcomeState::Failed,
        }
    }

    /// Terminal outcomes only change through an explicit user action.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state(),
            OutcomeState::Success
                | OutcomeState::Existing
                | OutcomeState::Expired
                | OutcomeState::Failed
        )
    }

    pub fn is_success_like(&self) -> bool {
        matches!(self.state(), OutcomeState::Success | OutcomeState::Existing)
    }

    pub fn subject(&self) -> Option<SubjectType> {
        match self {
            Outcome::Processing => None,
            Outcome::Success { subject, .. }
            | Outcome::Existing { subject, .. }
            | Outcome::Pending { subject, .. } => Some(*subject),
            Outcome::Expired { subject, .. } | Outcome::Failed { subject, .. } => *subject,
        }
    }

    pub fn primary_action(&self) -> Action {
        match self {
            Outcome::Processing => Action::Refresh,
            Outcome::Success { subject, .. } | Outcome::Existing { subject, .. } => {
                Action::GoToLogin(*subject)
            }
            Outcome::Pending { .. } => Action::Retry,
            Outcome::Expired { subject, .. } | Outcome::Failed { subject, .. } => match subject {
                Some(subject) => Action::Restart(*subject),
                None => Action::GoHome,
            },
        }
    }

    /// Text for the status panel.
    pub fn message(&self) -> String {
        match self {
            Outcome::Processing => "Verifying your payment...".to_string(),
            Outcome::Success { subject, .. } => {
                format!("Payment verified. Your {subject} account is ready.")
            }
            Outcome::Existing { subject, .. } => {
                format!("Your {subject} account is already active. Please log in.")
            }
            Outcome::Pending { message, .. }
            | Outcome::Expired { message, .. }
            | Outcome::Failed { message, .. } => message.clone(),
        }
    }
}
