//! Quotes, fiat codes and coin id resolution

use super::error::RateError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Short ticker symbols mapped to CoinGecko ids.
pub const SYMBOL_MAP: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("usdt", "tether"),
    ("bnb", "binancecoin"),
    ("ada", "cardano"),
    ("doge", "dogecoin"),
    ("ltc", "litecoin"),
    ("xrp", "ripple"),
];

/// Human readable names used by the direct conversion output.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("bitcoin", "Bitcoin"),
    ("ethereum", "Ethereum"),
    ("dogecoin", "Dogecoin"),
    ("solana", "Solana"),
    ("tether", "Tether"),
    ("usd", "Доллар США"),
    ("eur", "Евро"),
    ("rub", "Российский рубль"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fiat {
    #[default]
    Usd,
    Eur,
    Rub,
}

impl Fiat {
    pub const ALL: [Fiat; 3] = [Fiat::Rub, Fiat::Usd, Fiat::Eur];

    /// Lower case code as expected by the price API.
    pub fn code(&self) -> &'static str {
        match self {
            Fiat::Usd => "usd",
            Fiat::Eur => "eur",
            Fiat::Rub => "rub",
        }
    }

    pub fn label(&self) -> String {
        self.code().to_uppercase()
    }
}

impl Display for Fiat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Fiat {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Fiat::Usd),
            "eur" => Ok(Fiat::Eur),
            "rub" => Ok(Fiat::Rub),
            other => Err(RateError::Validation(format!(
                "Неподдерживаемая валюта: '{other}' (доступны usd, eur, rub)"
            ))),
        }
    }
}

/// Normalizes user input into a CoinGecko coin id.
///
/// Known ticker symbols are mapped through [`SYMBOL_MAP`]; anything else is
/// used as a literal id after trimming and lower-casing.
pub fn resolve_coin_id(input: &str) -> Result<String, RateError> {
    let symbol = input.trim().to_lowercase();
    if symbol.is_empty() {
        return Err(RateError::Validation("Введите криптовалюту!".to_string()));
    }

    let coin_id = SYMBOL_MAP
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map_or(symbol.clone(), |(_, id)| id.to_string());
    Ok(coin_id)
}

/// Display name for a coin id or fiat code, falling back to the id itself.
pub fn display_name(id: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(key, _)| *key == id)
        .map_or(id, |(_, name)| *name)
}

/// Parses the amount text entered by the user.
pub fn parse_amount(input: &str) -> Result<f64, RateError> {
    input
        .trim()
        .parse::<f64>()
        .map_err(|_| RateError::Validation("Введите число для конвертации!".to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub coin_id: String,
    pub fiat: Fiat,
    pub price: f64,
    pub fetched_at: DateTime<Local>,
}

impl Quote {
    pub fn new(coin_id: &str, fiat: Fiat, price: f64) -> Self {
        Self {
            coin_id: coin_id.to_string(),
            fiat,
            price,
            fetched_at: Local::now(),
        }
    }

    pub fn convert(&self, amount: f64) -> ConversionResult {
        ConversionResult {
            amount,
            quote: self.clone(),
            total: amount * self.price,
        }
    }

    /// Title used for the history entry, e.g. `bitcoin → USD`.
    pub fn pair_label(&self) -> String {
        format!("{} → {}", self.coin_id, self.fiat.label())
    }
}

impl Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "1 {} = {:.3} {} ({})",
            self.coin_id,
            self.price,
            self.fiat.label(),
            self.fetched_at.format("%H:%M:%S")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub amount: f64,
    pub quote: Quote,
    pub total: f64,
}

impl Display for ConversionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Debug keeps the trailing ".0" on whole amounts
        write!(
            f,
            "{:?} {} = {:.3} {} (по цене {:.3})",
            self.amount,
            self.quote.coin_id,
            self.total,
            self.quote.fiat.label(),
            self.quote.price
        )
    }
}
