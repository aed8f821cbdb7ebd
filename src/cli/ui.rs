use crate::workflow::Notification;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Selected,
    Result,
    Warning,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Selected => style(text).black().on_green().bold(),
        StyleType::Result => style(text).green(),
        StyleType::Warning => style(text).yellow().bold(),
        StyleType::Error => style(text).red().bold(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Renders a notification the way a dialog box would title it.
pub fn format_notification(notification: &Notification) -> String {
    match notification {
        Notification::Info(msg) => format!("{} {msg}", style_text("[Инфо]", StyleType::Subtle)),
        Notification::Warning(msg) => {
            format!("{} {msg}", style_text("[Внимание]", StyleType::Warning))
        }
        Notification::Error(msg) => format!("{} {msg}", style_text("[Ошибка]", StyleType::Error)),
    }
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned price cell with three decimals.
pub fn price_cell(price: f64) -> Cell {
    Cell::new(format!("{price:.3}"))
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// Creates a red "N/A" cell for a value that failed to load.
pub fn na_cell() -> Cell {
    Cell::new("N/A").fg(Color::Red)
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Creates a spinner shown while a lookup is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.yellow} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_keeps_message() {
        let text = format_notification(&Notification::Error("boom".to_string()));
        assert!(text.contains("[Ошибка]"));
        assert!(text.ends_with("boom"));
    }

    #[test]
    fn test_warning_notification_tag() {
        let text = format_notification(&Notification::Warning("wait".to_string()));
        assert!(text.contains("[Внимание]"));
    }

    #[test]
    fn test_na_cell_text() {
        assert_eq!(na_cell().content(), "N/A");
    }
}
