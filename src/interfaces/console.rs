use crate::config::PageConfig;
use crate::domain::outcome::{Action, Destination, Outcome};
use crate::domain::ports::Navigator;
use serde::Serialize;

/// Navigator for a terminal session: reports where the browser would go.
pub struct ConsoleNavigator {
    pages: PageConfig,
}

impl ConsoleNavigator {
    pub fn new(pages: PageConfig) -> Self {
        Self { pages }
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, destination: Destination) {
        let path = self.pages.path(destination);
        tracing::info!(?destination, %path, "navigate");
        eprintln!("-> {path}");
    }
}

/// What the CLI prints for a resolved transaction.
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub outcome: &'a Outcome,
    pub message: String,
    pub action: Action,
    /// Page the primary action leads to, if it leaves the landing page.
    pub next: Option<&'a str>,
}

impl<'a> OutcomeReport<'a> {
    pub fn new(outcome: &'a Outcome, pages: &'a PageConfig) -> Self {
        let action = outcome.primary_action();
        let next = match action {
            Action::GoToLogin(subject) => Some(pages.path(Destination::Login(subject))),
            Action::Restart(subject) => Some(pages.path(Destination::Registration(subject))),
            Action::GoHome => Some(pages.path(Destination::Home)),
            Action::Refresh | Action::Retry => None,
        };
        Self {
            outcome,
            message: outcome.message(),
            action,
            next,
        }
    }
}
