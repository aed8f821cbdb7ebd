//! Rate fetch and convert workflow.
//!
//! Price lookups run on spawned worker tasks and never touch [`AppState`]
//! directly. Each worker posts an [`Event`] into a single-consumer queue that
//! the UI loop drains through [`RateWorkflow::next_event`] and applies with
//! [`RateWorkflow::apply`]. All state mutation therefore happens on the UI
//! task, in the order events are applied.

use crate::core::quote::{parse_amount, resolve_coin_id};
use crate::core::{ConversionResult, Fiat, PriceProvider, Quote, RateError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub type RequestId = u64;

/// Shown in the result display before anything was fetched.
pub const EMPTY_RESULT: &str = "—";
/// Shown in the result display after a failed fetch.
pub const ERROR_RESULT: &str = "Ошибка";

#[derive(Debug)]
pub enum Event {
    /// A worker finished its lookup.
    FetchCompleted {
        id: RequestId,
        coin_id: String,
        fiat: Fiat,
        result: Result<f64, RateError>,
    },
    /// The "done" indication has been shown long enough.
    ControlReset { generation: u64 },
}

/// State of the "get rate" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchControl {
    Idle,
    Loading,
    Done,
}

impl FetchControl {
    pub fn label(&self) -> &'static str {
        match self {
            FetchControl::Idle => "Получить курс",
            FetchControl::Loading => "Загрузка...",
            FetchControl::Done => "✅ Готово",
        }
    }

    /// Only an idle control accepts a new fetch.
    pub fn is_enabled(&self) -> bool {
        matches!(self, FetchControl::Idle)
    }
}

/// Blocking message for the user, the terminal version of a dialog box.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Info(String),
    Warning(String),
    Error(String),
}

impl From<RateError> for Notification {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Validation(_) | RateError::Precondition => {
                Notification::Warning(err.to_string())
            }
            _ => Notification::Error(err.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub fiat: Fiat,
    pub last_quote: Option<Quote>,
    pub history: Vec<Quote>,
    pub history_visible: bool,
    pub result_text: String,
    pub control: FetchControl,
    generation: u64,
    in_flight: usize,
}

impl AppState {
    pub fn new(fiat: Fiat) -> Self {
        Self {
            fiat,
            last_quote: None,
            history: Vec::new(),
            history_visible: false,
            result_text: EMPTY_RESULT.to_string(),
            control: FetchControl::Idle,
            generation: 0,
            in_flight: 0,
        }
    }

    fn set_control(&mut self, control: FetchControl) -> u64 {
        self.control = control;
        self.generation += 1;
        debug!(?control, generation = self.generation, "Fetch control changed");
        self.generation
    }
}

pub struct RateWorkflow {
    state: AppState,
    provider: Arc<dyn PriceProvider>,
    done_delay: Duration,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    next_id: RequestId,
}

impl RateWorkflow {
    pub fn new(provider: Arc<dyn PriceProvider>, fiat: Fiat, done_delay: Duration) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            state: AppState::new(fiat),
            provider,
            done_delay,
            events_tx,
            events_rx,
            next_id: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn select_fiat(&mut self, fiat: Fiat) {
        debug!(%fiat, "Fiat selected");
        self.state.fiat = fiat;
    }

    /// Number of lookups whose completion has not been applied yet.
    pub fn pending(&self) -> usize {
        self.state.in_flight
    }

    /// Starts a price lookup on a worker task and returns immediately.
    ///
    /// Overlapping lookups are not prevented here; the UI only offers a fetch
    /// while the control is idle.
    pub fn fetch_rate(&mut self, coin_symbol: &str, fiat: Fiat) -> Result<RequestId, RateError> {
        let coin_id = resolve_coin_id(coin_symbol)?;
        let id = self.next_id;
        self.next_id += 1;
        self.state.in_flight += 1;
        self.state.set_control(FetchControl::Loading);
        debug!(id, %coin_id, %fiat, "Dispatching price lookup");

        let provider = Arc::clone(&self.provider);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch_price(&coin_id, fiat).await;
            let event = Event::FetchCompleted {
                id,
                coin_id,
                fiat,
                result,
            };
            if events.send(event).is_err() {
                debug!(id, "Event queue closed, dropping lookup result");
            }
        });

        Ok(id)
    }

    /// Waits for the next worker or timer event.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Applies an event to the state. Must be called from the UI loop only.
    pub fn apply(&mut self, event: Event) -> Option<Notification> {
        match event {
            Event::FetchCompleted {
                id,
                coin_id,
                fiat,
                result,
            } => {
                self.state.in_flight = self.state.in_flight.saturating_sub(1);
                match result {
                    Ok(price) => {
                        let quote = Quote::new(&coin_id, fiat, price);
                        debug!(id, %quote, "Lookup succeeded");
                        self.state.result_text = quote.to_string();
                        self.state.history.push(quote.clone());
                        self.state.last_quote = Some(quote);
                        self.state.history_visible = true;
                        let generation = self.state.set_control(FetchControl::Done);
                        self.schedule_reset(generation);
                        None
                    }
                    Err(err) => {
                        warn!(id, %coin_id, error = %err, "Lookup failed");
                        self.state.result_text = ERROR_RESULT.to_string();
                        self.state.set_control(FetchControl::Idle);
                        Some(Notification::Error(err.to_string()))
                    }
                }
            }
            Event::ControlReset { generation } => {
                if generation == self.state.generation {
                    self.state.set_control(FetchControl::Idle);
                } else {
                    debug!(generation, "Ignoring stale control reset");
                }
                None
            }
        }
    }

    fn schedule_reset(&self, generation: u64) -> JoinHandle<()> {
        let events = self.events_tx.clone();
        let delay = self.done_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(Event::ControlReset { generation }).is_err() {
                debug!(generation, "Event queue closed, dropping control reset");
            }
        })
    }

    /// Converts `amount_text` with the most recent quote.
    ///
    /// The quote's own coin and fiat are used even if the selection changed
    /// since it was fetched.
    pub fn convert(&mut self, amount_text: &str) -> Result<ConversionResult, RateError> {
        let amount = parse_amount(amount_text)?;
        let quote = self
            .state
            .last_quote
            .as_ref()
            .ok_or(RateError::Precondition)?;
        let result = quote.convert(amount);
        self.state.result_text = result.to_string();
        Ok(result)
    }

    /// Shows or hides the history view, returning the new visibility.
    pub fn toggle_history(&mut self) -> bool {
        self.state.history_visible = !self.state.history_visible;
        self.state.history_visible
    }

    /// Drops all history entries. The most recent quote stays available for
    /// conversion.
    pub fn clear_history(&mut self) -> Notification {
        self.state.history.clear();
        self.state.result_text = EMPTY_RESULT.to_string();
        Notification::Info("Все вкладки удалены".to_string())
    }
}
