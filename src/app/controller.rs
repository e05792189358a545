use super::{AppState, Notice};
use crate::config::API_KEY_ENV;
use crate::highlight::{self, positional_changes, Strategy};
use crate::provider::{CorrectionProvider, ProviderError};
use crate::CheckOutcome;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of asking the controller to start a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Started(u64),
    /// No provider configured; nothing was sent.
    Offline,
    /// Blank input; nothing was sent.
    Empty,
    /// A check is already running.
    Busy,
}

/// What an event-loop step changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Completed,
    Failed,
    Cancelled,
    /// Event for a request that is no longer current.
    Stale,
}

#[derive(Debug)]
enum CheckEvent {
    Finished {
        request: u64,
        result: Result<CheckOutcome, ProviderError>,
    },
    Cancelled {
        request: u64,
    },
}

struct InFlight {
    request: u64,
    cancel: CancellationToken,
}

/// Owns the application state and runs checks in background tasks.
///
/// Tasks report back over a channel; state changes only happen when the
/// owner of the controller drives [`Controller::next_event`]. `submit` spawns
/// onto the current tokio runtime and must be called from within one.
pub struct Controller {
    state: AppState,
    provider: Option<Arc<dyn CorrectionProvider>>,
    strategy: Strategy,
    events_tx: mpsc::UnboundedSender<CheckEvent>,
    events_rx: mpsc::UnboundedReceiver<CheckEvent>,
    in_flight: Option<InFlight>,
    next_request: u64,
}

impl Controller {
    pub fn new(provider: Option<Arc<dyn CorrectionProvider>>, strategy: Strategy) -> Self {
        let missing = provider.is_none();
        let mut controller = Self::build(provider, strategy);

        if missing {
            controller.state.push_notice(Notice::warning(
                "API Key Missing",
                format!("Please set {} in .env file", API_KEY_ENV),
            ));
        }
        controller
    }

    /// Like [`Controller::new`], but a provider that failed to initialize
    /// leaves the controller offline with an error notice instead of aborting.
    pub fn connect(
        provider: Result<Option<Arc<dyn CorrectionProvider>>, ProviderError>,
        strategy: Strategy,
    ) -> Self {
        match provider {
            Ok(provider) => Self::new(provider, strategy),
            Err(err) => {
                warn!("provider initialization failed: {}", err);
                let mut controller = Self::build(None, strategy);
                controller.state.push_notice(Notice::error(
                    "API Error",
                    format!("Failed to initialize Gemini: {}", err),
                ));
                controller
            }
        }
    }

    fn build(provider: Option<Arc<dyn CorrectionProvider>>, strategy: Strategy) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: AppState::default(),
            provider,
            strategy,
            events_tx,
            events_rx,
            in_flight: None,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn is_checking(&self) -> bool {
        self.state.is_checking()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// Start checking `text` in the background.
    pub fn submit(&mut self, text: &str) -> Submission {
        let Some(provider) = self.provider.clone() else {
            self.state.push_notice(Notice::warning(
                "Offline",
                "Spell check unavailable - API not connected",
            ));
            return Submission::Offline;
        };

        let text = text.trim();
        if text.is_empty() {
            self.state
                .push_notice(Notice::info("Empty", "Please enter some text to check"));
            return Submission::Empty;
        }

        let request = self.next_request;
        if self.state.start_check(request, text).is_err() {
            debug!(request, "check refused, another one is running");
            return Submission::Busy;
        }
        self.next_request += 1;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tx = self.events_tx.clone();
        let strategy = self.strategy;
        let text = text.to_string();

        tokio::spawn(async move {
            let event = tokio::select! {
                _ = token.cancelled() => CheckEvent::Cancelled { request },
                result = run_check(&*provider, &text, strategy) => {
                    CheckEvent::Finished { request, result }
                }
            };
            // Only fails once the controller is gone.
            let _ = tx.send(event);
        });

        info!(request, %strategy, "check started");
        self.in_flight = Some(InFlight { request, cancel });
        Submission::Started(request)
    }

    /// Cancel the running check, if any. Returns whether one was cancelled.
    pub fn cancel(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.take() else {
            return false;
        };

        in_flight.cancel.cancel();
        info!(request = in_flight.request, "check cancelled");
        self.state.cancel(in_flight.request)
    }

    /// Wait for the next task event and apply it to the state.
    ///
    /// Never resolves while nothing is in flight; `None` only if the channel
    /// closed, which cannot happen while the controller holds its sender.
    pub async fn next_event(&mut self) -> Option<Update> {
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Drive the event loop until no check is running.
    pub async fn wait_idle(&mut self) {
        while self.is_checking() {
            if self.next_event().await.is_none() {
                break;
            }
        }
    }

    fn apply(&mut self, event: CheckEvent) -> Update {
        match event {
            CheckEvent::Finished {
                request,
                result: Ok(outcome),
            } => {
                let changes = outcome.change_count();
                if !self.state.receive_result(request, outcome) {
                    return Update::Stale;
                }
                self.finish(request);
                info!(request, changes, "check completed");
                Update::Completed
            }
            CheckEvent::Finished {
                request,
                result: Err(err),
            } => {
                if !self.state.receive_error(request, &err) {
                    return Update::Stale;
                }
                self.finish(request);
                warn!(request, "check failed: {}", err);
                Update::Failed
            }
            CheckEvent::Cancelled { request } => {
                if !self.state.cancel(request) {
                    return Update::Stale;
                }
                self.finish(request);
                Update::Cancelled
            }
        }
    }

    fn finish(&mut self, request: u64) {
        if self.in_flight.as_ref().is_some_and(|f| f.request == request) {
            self.in_flight = None;
        }
    }
}

async fn run_check(
    provider: &dyn CorrectionProvider,
    text: &str,
    strategy: Strategy,
) -> Result<CheckOutcome, ProviderError> {
    debug!(provider = provider.name(), chars = text.chars().count(), "requesting correction");
    let corrected = provider.correct(text).await?;

    let changes = match strategy {
        Strategy::Positional => positional_changes(text, &corrected),
        Strategy::Pairs => provider.list_changes(text, &corrected).await?,
    };
    let highlights = highlight::highlight(strategy, text, &corrected, &changes);

    Ok(CheckOutcome {
        original: text.to_string(),
        corrected,
        changes,
        highlights,
    })
}
