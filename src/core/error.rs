//! Error taxonomy for the fetch and convert workflow.
//!
//! Every variant is terminal for the action that raised it. None of them are
//! retried; the panel shows the message and returns to an interactive state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    /// Empty or non-numeric user input.
    #[error("{0}")]
    Validation(String),

    /// The coin id is absent from the price response.
    #[error("Криптовалюта '{0}' не найдена.")]
    NotFound(String),

    /// Timeout, connection failure or non-success HTTP status.
    #[error("Ошибка сети: {0}")]
    Network(String),

    /// The response body could not be interpreted as a price mapping.
    #[error("Некорректный ответ API: {0}")]
    MalformedResponse(String),

    /// Conversion requested before any quote was obtained.
    #[error("Сначала получите курс!")]
    Precondition,
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RateError::MalformedResponse(err.to_string())
        } else {
            RateError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RateError {
    fn from(err: serde_json::Error) -> Self {
        RateError::MalformedResponse(err.to_string())
    }
}
