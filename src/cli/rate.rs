use super::ui;
use crate::core::quote::resolve_coin_id;
use crate::core::{Fiat, PriceProvider, Quote, RateError};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

/// Outcome of a one-shot lookup for a single user supplied coin.
struct RateRow {
    input: String,
    result: Result<Quote, RateError>,
}

async fn lookup(provider: &dyn PriceProvider, input: &str, fiat: Fiat) -> RateRow {
    let result = match resolve_coin_id(input) {
        Ok(coin_id) => provider
            .fetch_price(&coin_id, fiat)
            .await
            .map(|price| Quote::new(&coin_id, fiat, price)),
        Err(e) => Err(e),
    };
    RateRow {
        input: input.to_string(),
        result,
    }
}

fn display_as_table(rows: &[RateRow], fiat: Fiat) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Криптовалюта"),
        ui::header_cell(&format!("Цена ({})", fiat.label())),
        ui::header_cell("Время"),
        ui::header_cell("Ошибка"),
    ]);

    for row in rows {
        match &row.result {
            Ok(quote) => table.add_row(vec![
                Cell::new(&quote.coin_id),
                ui::price_cell(quote.price),
                Cell::new(quote.fetched_at.format("%H:%M:%S")),
                Cell::new(""),
            ]),
            Err(e) => table.add_row(vec![
                Cell::new(&row.input),
                ui::na_cell(),
                Cell::new(""),
                Cell::new(e.to_string()),
            ]),
        };
    }

    table.to_string()
}

/// Fetches all `coins` concurrently and renders them as a table. A failed
/// coin only affects its own row.
pub async fn quotes_table(provider: &dyn PriceProvider, coins: &[String], fiat: Fiat) -> String {
    let pb = ui::new_progress_bar(coins.len() as u64, "Получение курсов...");
    let futures = coins.iter().map(|coin| {
        let pb_clone = pb.clone();
        async move {
            let row = lookup(provider, coin, fiat).await;
            pb_clone.inc(1);
            row
        }
    });
    let rows: Vec<RateRow> = join_all(futures).await;
    pb.finish_and_clear();

    display_as_table(&rows, fiat)
}

pub async fn run(provider: &dyn PriceProvider, coins: &[String], fiat: Fiat) -> Result<()> {
    println!(
        "{}",
        ui::style_text(&format!("Курс к: {}", fiat.label()), ui::StyleType::Title)
    );
    println!("{}", quotes_table(provider, coins, fiat).await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubProvider;

    #[async_trait]
    impl PriceProvider for StubProvider {
        async fn fetch_price(&self, coin_id: &str, _fiat: Fiat) -> Result<f64, RateError> {
            match coin_id {
                "bitcoin" => Ok(27000.0),
                "ethereum" => Ok(1500.5),
                other => Err(RateError::NotFound(other.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_quotes_table_mixes_success_and_failure() {
        let coins = vec!["btc".to_string(), "ETH".to_string(), "nope".to_string()];
        let table = quotes_table(&StubProvider, &coins, Fiat::Eur).await;

        assert!(table.contains("Цена (EUR)"));
        assert!(table.contains("bitcoin"));
        assert!(table.contains("27000.000"));
        assert!(table.contains("ethereum"));
        assert!(table.contains("1500.500"));
        assert!(table.contains("nope"));
        assert!(table.contains("N/A"));
    }

    #[tokio::test]
    async fn test_empty_coin_is_reported_in_row() {
        let coins = vec!["  ".to_string()];
        let table = quotes_table(&StubProvider, &coins, Fiat::Usd).await;
        assert!(table.contains("Введите криптовалюту!"));
    }
}
