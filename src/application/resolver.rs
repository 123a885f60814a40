use crate::domain::backend::{AccountSummary, VerifyRequest, VerifyResponse, VerifyRoute};
use crate::domain::checkout::{CheckoutEvent, OutcomeSource};
use crate::domain::outcome::{Action, Destination, Outcome, VerificationClass};
use crate::domain::pending::{PendingTransaction, Slot};
use crate::domain::ports::{BackendRef, NavigatorRef, StashRef};
use crate::domain::subject::{OrderTag, SubjectType, TransactionKind, classify};
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const MISSING_PAYMENT_INFO: &str =
    "Missing payment information. Please start the registration again.";

/// The page a resolver runs on: which transaction kind it finalizes and, when
/// the route says so, for which subject type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    pub kind: TransactionKind,
    pub subject: Option<SubjectType>,
}

impl Landing {
    pub fn registration(subject: Option<SubjectType>) -> Self {
        Self {
            kind: TransactionKind::Registration,
            subject,
        }
    }

    pub fn renewal() -> Self {
        Self {
            kind: TransactionKind::Renewal,
            subject: None,
        }
    }
}

/// Everything known about the transaction being resolved, merged from the
/// callback payload, the return URL and the stash (in that priority).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub kind: TransactionKind,
    pub subject: Option<SubjectType>,
    pub order_id: Option<String>,
    pub temp_id: Option<String>,
    pub document: Option<String>,
}

impl ResolutionContext {
    /// The verification call this context calls for.
    pub fn request(&self) -> Result<(VerifyRoute, VerifyRequest)> {
        if let Some(tag) = self.conflicting_tag() {
            return Err(CheckoutError::Disambiguation(format!(
                "order is a {} payment, not a {}",
                tag.kind, self.kind
            )));
        }
        let (Some(order_id), Some(temp_id)) = (&self.order_id, &self.temp_id) else {
            return Err(CheckoutError::Disambiguation(
                "no order id or temp id to verify".to_string(),
            ));
        };
        let subject = self.subject.ok_or_else(|| {
            CheckoutError::Disambiguation(format!("cannot tell the account type of `{order_id}`"))
        })?;

        let request = VerifyRequest {
            kind: self.kind,
            temp_id: temp_id.clone(),
            order_id: order_id.clone(),
            subject,
            document: match self.kind {
                TransactionKind::Registration => self.document.clone(),
                TransactionKind::Renewal => None,
            },
        };
        Ok((VerifyRoute::for_transaction(self.kind, subject), request))
    }

    /// The order id's own tag, when it names another transaction kind.
    pub fn conflicting_tag(&self) -> Option<OrderTag> {
        self.order_id
            .as_deref()
            .and_then(OrderTag::parse)
            .filter(|tag| tag.kind != self.kind)
    }

    fn slot(&self) -> Option<Slot> {
        self.subject
            .map(|subject| Slot::for_transaction(self.kind, subject))
    }
}

struct ResolverState {
    outcome: Outcome,
    context: Option<ResolutionContext>,
    countdown: Option<JoinHandle<()>>,
    navigation_scheduled: bool,
}

/// Marks a verification as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Turns a returning checkout into exactly one [`Outcome`].
///
/// Runs once when the landing page mounts (redirect delivery) or from the
/// widget's success callback, and again only on explicit user request. At
/// most one verification is in flight; overlapping calls are no-ops.
pub struct OutcomeResolver {
    backend: BackendRef,
    stash: StashRef,
    navigator: NavigatorRef,
    landing: Landing,
    countdown: Duration,
    in_flight: AtomicBool,
    mounted: AtomicBool,
    navigated: Arc<AtomicBool>,
    state: Mutex<ResolverState>,
}

impl OutcomeResolver {
    pub fn new(
        backend: BackendRef,
        stash: StashRef,
        navigator: NavigatorRef,
        landing: Landing,
        countdown: Duration,
    ) -> Self {
        Self {
            backend,
            stash,
            navigator,
            landing,
            countdown,
            in_flight: AtomicBool::new(false),
            mounted: AtomicBool::new(true),
            navigated: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(ResolverState {
                outcome: Outcome::Processing,
                context: None,
                countdown: None,
                navigation_scheduled: false,
            }),
        }
    }

    pub async fn outcome(&self) -> Outcome {
        self.state.lock().await.outcome.clone()
    }

    /// The context of the last resolution attempt.
    pub async fn context(&self) -> Option<ResolutionContext> {
        self.state.lock().await.context.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the automatic move to the login page has been scheduled.
    pub async fn navigation_scheduled(&self) -> bool {
        self.state.lock().await.navigation_scheduled
    }

    pub async fn resolve(&self, source: OutcomeSource) -> Outcome {
        let Some(_flight) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("verification already in flight; ignoring");
            return self.outcome().await;
        };
        if !self.is_mounted() {
            return self.outcome().await;
        }
        self.set_outcome(Outcome::Processing).await;

        match self.assemble(source).await {
            Ok(context) => self.run(context).await,
            Err(e) => {
                tracing::warn!(error = %e, "could not read pending transaction");
                let outcome = Outcome::Failed {
                    subject: self.landing.subject,
                    message: e.to_string(),
                };
                self.set_outcome(outcome.clone()).await;
                outcome
            }
        }
    }

    /// Re-runs verification with the last context. Manual only.
    pub async fn retry(&self) -> Outcome {
        let Some(context) = self.context().await else {
            return self.resolve(OutcomeSource::mount()).await;
        };
        let Some(_flight) = InFlight::acquire(&self.in_flight) else {
            return self.outcome().await;
        };
        if !self.is_mounted() {
            return self.outcome().await;
        }
        self.set_outcome(Outcome::Processing).await;
        self.run(context).await
    }

    /// Feeds a callback-mode widget event into the resolver.
    pub async fn handle_event(&self, event: CheckoutEvent) -> Outcome {
        match event {
            CheckoutEvent::Succeeded(payload) => {
                self.resolve(OutcomeSource::Callback(payload)).await
            }
            CheckoutEvent::Failed { reason } => {
                tracing::warn!(%reason, "checkout reported failure");
                let outcome = Outcome::Failed {
                    subject: self.landing.subject,
                    message: reason,
                };
                self.set_outcome(outcome.clone()).await;
                outcome
            }
            CheckoutEvent::Redirected { .. } | CheckoutEvent::Dismissed => {
                self.set_outcome(Outcome::Processing).await;
                Outcome::Processing
            }
        }
    }

    /// Carries out the primary action of an outcome.
    pub async fn perform(&self, action: Action) -> Outcome {
        match action {
            Action::Refresh | Action::Retry => return self.retry().await,
            Action::Restart(_) => {
                self.restart().await;
            }
            Action::GoToLogin(_) => {
                self.go_now().await;
            }
            Action::GoHome => self.go_home(),
        }
        self.outcome().await
    }

    /// Skips the countdown and goes to the login page now.
    pub async fn go_now(&self) -> Option<Destination> {
        let mut state = self.state.lock().await;
        if !state.outcome.is_success_like() {
            return None;
        }
        let subject = state.outcome.subject()?;
        if let Some(countdown) = state.countdown.take() {
            countdown.abort();
        }
        if self.navigated.swap(true, Ordering::AcqRel) {
            return None;
        }
        let destination = Destination::Login(subject);
        self.navigator.navigate(destination);
        Some(destination)
    }

    /// Drops the pending transaction and sends the user back to the form.
    pub async fn restart(&self) -> Destination {
        let mut state = self.state.lock().await;
        if let Some(countdown) = state.countdown.take() {
            countdown.abort();
        }
        let subject = state
            .context
            .as_ref()
            .and_then(|context| context.subject)
            .or(self.landing.subject);
        let slot = state
            .context
            .as_ref()
            .and_then(ResolutionContext::slot)
            .or_else(|| match self.landing.kind {
                TransactionKind::Renewal => Some(Slot::Renewal),
                TransactionKind::Registration => subject.map(Slot::Registration),
            });
        drop(state);

        if let Some(slot) = slot {
            self.clear(slot).await;
        }
        let destination = subject.map_or(Destination::Home, Destination::Registration);
        self.navigator.navigate(destination);
        destination
    }

    /// Waits until the scheduled login navigation has run, if there is one.
    pub async fn settle(&self) {
        let countdown = self.state.lock().await.countdown.take();
        if let Some(countdown) = countdown
            && let Err(e) = countdown.await
        {
            tracing::debug!(error = %e, "login countdown did not complete");
        }
    }

    pub fn go_home(&self) {
        self.navigator.navigate(Destination::Home);
    }

    /// The landing page is going away: late responses are dropped and any
    /// pending navigation is cancelled.
    pub async fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        if let Some(countdown) = self.state.lock().await.countdown.take() {
            countdown.abort();
        }
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    async fn set_outcome(&self, outcome: Outcome) {
        self.state.lock().await.outcome = outcome;
    }

    async fn assemble(&self, source: OutcomeSource) -> Result<ResolutionContext> {
        let (explicit_subject, order_id, temp_id) = match source {
            OutcomeSource::Callback(payload) => (payload.subject, payload.order_id, payload.temp_id),
            OutcomeSource::Redirect(params) => (None, params.order_id, params.temp_id),
        };
        let kind = self.landing.kind;
        let known_subject = explicit_subject.or(self.landing.subject);

        let slot = match kind {
            TransactionKind::Renewal => Some(Slot::Renewal),
            TransactionKind::Registration => known_subject
                .or_else(|| order_id.as_deref().and_then(classify))
                .map(Slot::Registration),
        };
        let record = match slot {
            Some(slot) => PendingTransaction::load(self.stash.as_ref(), slot).await?,
            None => None,
        };
        // A record for a different order was written by another attempt.
        let record = record.filter(|record| {
            order_id
                .as_deref()
                .is_none_or(|order_id| order_id == record.order_id)
        });

        let subject = known_subject.or(record.as_ref().map(|record| record.subject));
        let order_id = order_id.or_else(|| record.as_ref().map(|r| r.order_id.clone()));
        let subject = subject.or_else(|| order_id.as_deref().and_then(classify));

        Ok(ResolutionContext {
            kind,
            subject,
            order_id,
            temp_id: temp_id.or_else(|| record.as_ref().map(|r| r.temp_id.clone())),
            document: record.and_then(|record| record.document),
        })
    }

    async fn run(&self, context: ResolutionContext) -> Outcome {
        self.state.lock().await.context = Some(context.clone());

        let (route, request) = match context.request() {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(error = %e, ?context, "cannot verify payment");
                let message = match context.conflicting_tag() {
                    Some(tag) => format!(
                        "This is a {} payment and cannot be verified on the {} page.",
                        tag.kind, context.kind
                    ),
                    None => MISSING_PAYMENT_INFO.to_string(),
                };
                let outcome = Outcome::Failed {
                    subject: None,
                    message,
                };
                self.set_outcome(outcome.clone()).await;
                return outcome;
            }
        };
        let subject = request.subject;
        let slot = Slot::for_transaction(context.kind, subject);

        tracing::info!(?route, order_id = %request.order_id, "verifying payment");
        let verified = self.verify(route, request).await;

        if !self.is_mounted() {
            tracing::debug!("landing page unmounted; ignoring verification response");
            return self.outcome().await;
        }

        let outcome = match verified {
            Ok(response) => {
                self.clear(slot).await;
                let account = AccountSummary::from(&response);
                if response.existing {
                    Outcome::Existing { subject, account }
                } else {
                    self.schedule_login(subject).await;
                    Outcome::Success { subject, account }
                }
            }
            Err(CheckoutError::Verification {
                class,
                message,
                rejected,
            }) => match class {
                VerificationClass::Pending => Outcome::Pending { subject, message },
                VerificationClass::Expired => Outcome::Expired {
                    subject: Some(subject),
                    message,
                },
                VerificationClass::Existing => {
                    self.clear(slot).await;
                    Outcome::Existing {
                        subject,
                        account: AccountSummary::default(),
                    }
                }
                VerificationClass::Failed => {
                    if rejected {
                        self.clear(slot).await;
                    }
                    Outcome::Failed {
                        subject: Some(subject),
                        message,
                    }
                }
            },
            Err(other) => Outcome::Failed {
                subject: Some(subject),
                message: other.to_string(),
            },
        };

        tracing::info!(state = ?outcome.state(), %subject, "payment resolved");
        self.set_outcome(outcome.clone()).await;
        outcome
    }

    async fn verify(&self, route: VerifyRoute, request: VerifyRequest) -> Result<VerifyResponse> {
        match self.backend.verify(route, request).await {
            Ok(response) if response.success => Ok(response),
            Ok(response) => {
                let message = response
                    .error_text()
                    .unwrap_or("Payment verification failed")
                    .to_string();
                Err(CheckoutError::Verification {
                    class: VerificationClass::of(&message),
                    message,
                    rejected: true,
                })
            }
            Err(e) => {
                let message = e.message().to_string();
                Err(CheckoutError::Verification {
                    class: VerificationClass::of(&message),
                    message,
                    rejected: e.is_rejection(),
                })
            }
        }
    }

    async fn clear(&self, slot: Slot) {
        if let Err(e) = PendingTransaction::clear(self.stash.as_ref(), slot).await {
            tracing::warn!(error = %e, ?slot, "could not clear pending transaction");
        }
    }

    async fn schedule_login(&self, subject: SubjectType) {
        let mut state = self.state.lock().await;
        if state.navigation_scheduled {
            return;
        }
        state.navigation_scheduled = true;

        let navigator = self.navigator.clone();
        let navigated = self.navigated.clone();
        let delay = self.countdown;
        tracing::info!(?delay, %subject, "redirecting to login after countdown");
        state.countdown = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !navigated.swap(true, Ordering::AcqRel) {
                navigator.navigate(Destination::Login(subject));
            }
        }));
    }
}

impl Drop for OutcomeResolver {
    fn drop(&mut self) {
        if let Some(countdown) = self.state.get_mut().countdown.take() {
            countdown.abort();
        }
    }
}
