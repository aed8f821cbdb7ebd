use super::ui;
use crate::core::quote::{display_name, parse_amount, resolve_coin_id};
use crate::core::{Fiat, PriceProvider, RateError};
use crate::workflow::FetchControl;
use anyhow::Result;
use tracing::debug;

/// Fetches the pair and converts `amount_text` in one step, without touching
/// any panel state.
pub async fn direct_conversion(
    provider: &dyn PriceProvider,
    amount_text: &str,
    coin: &str,
    fiat: Fiat,
) -> Result<String, RateError> {
    let amount = parse_amount(amount_text)?;
    let coin_id = resolve_coin_id(coin)?;
    let price = provider.fetch_price(&coin_id, fiat).await?;
    let total = amount * price;
    debug!(%coin_id, %fiat, price, total, "Direct conversion");

    Ok(format!(
        "{amount:?} {} = {total:.6} {}",
        display_name(&coin_id),
        display_name(fiat.code())
    ))
}

pub async fn run(
    provider: &dyn PriceProvider,
    amount_text: &str,
    coin: &str,
    fiat: Fiat,
) -> Result<()> {
    let pb = ui::new_spinner(FetchControl::Loading.label());
    let result = direct_conversion(provider, amount_text, coin, fiat).await;
    pb.finish_and_clear();

    println!("{}", ui::style_text(&result?, ui::StyleType::Result));
    Ok(())
}
