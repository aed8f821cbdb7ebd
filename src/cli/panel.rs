//! Interactive terminal panel.
//!
//! The panel loop is the only place where [`RateWorkflow`] state changes: it
//! multiplexes user input lines with worker events and renders after each.

use super::ui;
use crate::core::{Fiat, RateError};
use crate::workflow::{Event, FetchControl, Notification, RateWorkflow};
use anyhow::{Context, Result};
use comfy_table::Cell;
use indicatif::ProgressBar;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const HELP: &str = "\
Команды:
  rate [монета]       получить курс (тикер вроде btc или id CoinGecko)
  coin <монета>       выбрать криптовалюту без запроса курса
  fiat <usd|eur|rub>  выбрать валюту (или просто usd, eur, rub)
  amount <число>      задать количество для конвертации
  convert [число]     конвертировать по последнему курсу
  history             показать или скрыть вкладки с курсами
  clear               удалить все вкладки
  help                показать эту справку
  quit                выйти";

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    Rate(Option<String>),
    Coin(String),
    Fiat(Fiat),
    Amount(String),
    Convert(Option<String>),
    History,
    Clear,
    Help,
    Quit,
}

impl FromStr for PanelCommand {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim().to_string())),
            None => (s, None),
        };
        let arg = arg.filter(|a| !a.is_empty());

        match name.to_lowercase().as_str() {
            "rate" | "get" => Ok(PanelCommand::Rate(arg)),
            "coin" => arg
                .map(PanelCommand::Coin)
                .ok_or_else(|| RateError::Validation("Введите криптовалюту!".to_string())),
            "fiat" => {
                let code = arg.ok_or_else(|| {
                    RateError::Validation("Выберите валюту: usd, eur или rub".to_string())
                })?;
                Ok(PanelCommand::Fiat(code.parse()?))
            }
            "usd" | "eur" | "rub" => Ok(PanelCommand::Fiat(name.parse()?)),
            "amount" => arg
                .map(PanelCommand::Amount)
                .ok_or_else(|| RateError::Validation("Введите число для конвертации!".to_string())),
            "convert" => Ok(PanelCommand::Convert(arg)),
            "history" | "tabs" => Ok(PanelCommand::History),
            "clear" => Ok(PanelCommand::Clear),
            "help" | "?" => Ok(PanelCommand::Help),
            "quit" | "exit" | "q" => Ok(PanelCommand::Quit),
            other => Err(RateError::Validation(format!(
                "Неизвестная команда '{other}', введите 'help' для списка команд"
            ))),
        }
    }
}

pub struct Panel<W: Write> {
    workflow: RateWorkflow,
    out: W,
    coin_input: String,
    amount_input: String,
    spinner: Option<ProgressBar>,
}

impl<W: Write> Panel<W> {
    pub fn new(workflow: RateWorkflow, coin: &str, out: W) -> Self {
        Self {
            workflow,
            out,
            coin_input: coin.to_string(),
            amount_input: "1".to_string(),
            spinner: None,
        }
    }

    pub fn workflow(&self) -> &RateWorkflow {
        &self.workflow
    }

    /// Runs until `quit`, or until input ends and no lookup is pending.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        let mut input_open = true;

        self.emit(&ui::style_text("Обмен криптовалют", ui::StyleType::Title))?;
        self.render_status()?;

        loop {
            if !input_open && self.workflow.pending() == 0 {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line.context("Failed to read panel input")? {
                        Some(line) => {
                            if !self.handle_line(&line)? {
                                break;
                            }
                        }
                        None => {
                            debug!(pending = self.workflow.pending(), "Input closed");
                            input_open = false;
                        }
                    }
                }
                Some(event) = self.workflow.next_event() => {
                    self.handle_event(event)?;
                }
                else => break,
            }
        }

        self.stop_spinner();
        Ok(())
    }

    /// Returns `false` when the panel should exit.
    fn handle_line(&mut self, line: &str) -> Result<bool> {
        if line.trim().is_empty() {
            return Ok(true);
        }

        let command = match line.parse::<PanelCommand>() {
            Ok(command) => command,
            Err(e) => {
                self.notify(&e.into())?;
                return Ok(true);
            }
        };
        debug!(?command, "Panel command");

        match command {
            PanelCommand::Quit => return Ok(false),
            PanelCommand::Help => self.emit(HELP)?,
            PanelCommand::Fiat(fiat) => {
                self.workflow.select_fiat(fiat);
                self.render_status()?;
            }
            PanelCommand::Coin(coin) => {
                self.coin_input = coin;
                self.render_status()?;
            }
            PanelCommand::Amount(amount) => {
                self.amount_input = amount;
                self.render_status()?;
            }
            PanelCommand::Rate(coin) => {
                if let Some(coin) = coin {
                    self.coin_input = coin;
                }
                self.request_rate()?;
            }
            PanelCommand::Convert(amount) => {
                if let Some(amount) = amount {
                    self.amount_input = amount;
                }
                match self.workflow.convert(&self.amount_input) {
                    Ok(_) => self.render_status()?,
                    Err(e) => self.notify(&e.into())?,
                }
            }
            PanelCommand::History => {
                if self.workflow.toggle_history() {
                    self.render_history()?;
                } else {
                    self.emit(&ui::style_text("Вкладки скрыты", ui::StyleType::Subtle))?;
                }
            }
            PanelCommand::Clear => {
                let notification = self.workflow.clear_history();
                self.notify(&notification)?;
                self.render_status()?;
            }
        }

        Ok(true)
    }

    fn request_rate(&mut self) -> Result<()> {
        let control = self.workflow.state().control;
        if !control.is_enabled() {
            return self.notify(&Notification::Warning(format!(
                "Подождите, кнопка курса занята ({})",
                control.label()
            )));
        }

        let fiat = self.workflow.state().fiat;
        match self.workflow.fetch_rate(&self.coin_input, fiat) {
            Ok(_) => {
                if self.spinner.is_none() {
                    self.spinner = Some(ui::new_spinner(FetchControl::Loading.label()));
                }
                self.render_status()
            }
            Err(e) => self.notify(&e.into()),
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let completed = matches!(event, Event::FetchCompleted { .. });
        let notification = self.workflow.apply(event);

        if completed && self.workflow.pending() == 0 {
            self.stop_spinner();
        }
        if let Some(notification) = &notification {
            self.notify(notification)?;
        }
        self.render_status()?;
        if completed && notification.is_none() && self.workflow.state().history_visible {
            self.render_history()?;
        }
        Ok(())
    }

    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.emit(&ui::format_notification(notification))
    }

    fn render_status(&mut self) -> Result<()> {
        let state = self.workflow.state();
        let buttons: Vec<String> = Fiat::ALL
            .iter()
            .map(|fiat| {
                if *fiat == state.fiat {
                    ui::style_text(&format!("[{}]", fiat.label()), ui::StyleType::Selected)
                } else {
                    format!(" {} ", fiat.label())
                }
            })
            .collect();
        let line = format!(
            "{} Курс к: {} | Криптовалюта: {} | {} | Кол-во: {} | Результат: {}",
            buttons.join(" "),
            state.fiat.label(),
            self.coin_input,
            state.control.label(),
            self.amount_input,
            ui::style_text(&state.result_text, ui::StyleType::Result)
        );
        self.emit(&line)
    }

    fn render_history(&mut self) -> Result<()> {
        let history = &self.workflow.state().history;
        if history.is_empty() {
            return self.emit(&ui::style_text("Вкладок нет", ui::StyleType::Subtle));
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Пара"),
            ui::header_cell("Цена"),
            ui::header_cell("Время"),
        ]);
        for quote in history {
            table.add_row(vec![
                Cell::new(quote.pair_label()),
                ui::price_cell(quote.price),
                Cell::new(quote.fetched_at.format("%H:%M:%S")),
            ]);
        }
        let rendered = table.to_string();
        self.emit(&rendered)
    }

    fn emit(&mut self, text: &str) -> Result<()> {
        let out = &mut self.out;
        let written = match &self.spinner {
            Some(pb) => pb.suspend(|| writeln!(out, "{text}")),
            None => writeln!(out, "{text}"),
        };
        written.context("Failed to write panel output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PriceProvider;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;

    struct StubProvider;

    #[async_trait]
    impl PriceProvider for StubProvider {
        async fn fetch_price(&self, coin_id: &str, fiat: Fiat) -> Result<f64, RateError> {
            match (coin_id, fiat) {
                ("bitcoin", Fiat::Usd) => Ok(27000.0),
                ("bitcoin", Fiat::Eur) => Ok(25000.0),
                (other, _) => Err(RateError::NotFound(other.to_string())),
            }
        }
    }

    fn new_panel() -> Panel<Vec<u8>> {
        let workflow = RateWorkflow::new(
            Arc::new(StubProvider),
            Fiat::Usd,
            Duration::from_millis(1200),
        );
        Panel::new(workflow, "bitcoin", Vec::new())
    }

    async fn run_panel(input: &str) -> (String, Panel<Vec<u8>>) {
        let mut panel = new_panel();
        panel.run(input.as_bytes()).await.unwrap();
        let output = String::from_utf8(panel.out.clone()).unwrap();
        (output, panel)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "rate btc".parse::<PanelCommand>().unwrap(),
            PanelCommand::Rate(Some("btc".to_string()))
        );
        assert_eq!(
            "get".parse::<PanelCommand>().unwrap(),
            PanelCommand::Rate(None)
        );
        assert_eq!(
            "  FIAT  Rub ".parse::<PanelCommand>().unwrap(),
            PanelCommand::Fiat(Fiat::Rub)
        );
        assert_eq!(
            "eur".parse::<PanelCommand>().unwrap(),
            PanelCommand::Fiat(Fiat::Eur)
        );
        assert_eq!(
            "convert 2.5".parse::<PanelCommand>().unwrap(),
            PanelCommand::Convert(Some("2.5".to_string()))
        );
        assert_eq!(
            "convert".parse::<PanelCommand>().unwrap(),
            PanelCommand::Convert(None)
        );
        assert_eq!("tabs".parse::<PanelCommand>().unwrap(), PanelCommand::History);
        assert_eq!("q".parse::<PanelCommand>().unwrap(), PanelCommand::Quit);
    }

    #[test]
    fn test_parse_invalid_commands() {
        assert!(matches!(
            "coin".parse::<PanelCommand>(),
            Err(RateError::Validation(_))
        ));
        assert!(matches!(
            "fiat gbp".parse::<PanelCommand>(),
            Err(RateError::Validation(_))
        ));
        assert!(matches!(
            "dance".parse::<PanelCommand>(),
            Err(RateError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_then_input_end_waits_for_result() {
        let (output, panel) = run_panel("fiat eur\nrate btc\n").await;

        assert!(output.contains("1 bitcoin = 25000.000 EUR"));
        assert!(output.contains("bitcoin → EUR"));
        let state = panel.workflow().state();
        assert_eq!(state.last_quote.as_ref().unwrap().price, 25000.0);
        assert_eq!(panel.workflow().pending(), 0);
    }

    #[tokio::test]
    async fn test_failed_rate_shows_error() {
        let (output, panel) = run_panel("rate notacoin\n").await;

        assert!(output.contains("[Ошибка]"));
        assert!(output.contains("Криптовалюта 'notacoin' не найдена."));
        assert_eq!(panel.workflow().state().result_text, "Ошибка");
    }

    #[tokio::test]
    async fn test_convert_before_rate_warns() {
        let (output, _) = run_panel("convert 2\nconvert abc\n").await;

        assert!(output.contains("Сначала получите курс!"));
        assert!(output.contains("Введите число для конвертации!"));
    }

    #[tokio::test]
    async fn test_unknown_command_does_not_stop_panel() {
        let (output, _) = run_panel("dance\nhelp\n").await;

        assert!(output.contains("Неизвестная команда 'dance'"));
        assert!(output.contains("Команды:"));
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let (_, panel) = run_panel("quit\nrate btc\n").await;
        assert!(panel.workflow().state().last_quote.is_none());
        assert_eq!(panel.workflow().pending(), 0);
    }

    #[tokio::test]
    async fn test_clear_and_history_toggle() {
        let (output, panel) = run_panel("clear\nhistory\nhistory\n").await;

        assert!(output.contains("Все вкладки удалены"));
        assert!(output.contains("Вкладок нет"));
        assert!(output.contains("Вкладки скрыты"));
        assert!(!panel.workflow().state().history_visible);
    }

    /// Records every request and holds it until the test releases the gate.
    struct GatedProvider {
        gate: Mutex<Option<oneshot::Receiver<f64>>>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PriceProvider for GatedProvider {
        async fn fetch_price(&self, coin_id: &str, _fiat: Fiat) -> Result<f64, RateError> {
            self.requests.lock().unwrap().push(coin_id.to_string());
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(rx) => rx
                    .await
                    .map_err(|_| RateError::Network("gate dropped".to_string())),
                None => Err(RateError::NotFound(coin_id.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_rate_is_refused_while_control_is_busy() {
        let (release, gate) = oneshot::channel();
        let provider = Arc::new(GatedProvider {
            gate: Mutex::new(Some(gate)),
            requests: Mutex::new(Vec::new()),
        });
        let workflow = RateWorkflow::new(provider.clone(), Fiat::Usd, Duration::from_secs(3600));
        let mut panel = Panel::new(workflow, "bitcoin", Vec::new());

        assert!(panel.handle_line("rate btc").unwrap());
        assert_eq!(panel.workflow().state().control, FetchControl::Loading);
        assert_eq!(panel.workflow().pending(), 1);

        // Loading
        assert!(panel.handle_line("rate eth").unwrap());
        assert_eq!(panel.workflow().pending(), 1);

        release.send(27000.0).unwrap();
        let event = panel.workflow.next_event().await.unwrap();
        panel.handle_event(event).unwrap();
        assert_eq!(panel.workflow().state().control, FetchControl::Done);
        assert_eq!(panel.workflow().pending(), 0);

        // Done
        assert!(panel.handle_line("rate eth").unwrap());
        assert_eq!(panel.workflow().pending(), 0);
        assert_eq!(panel.workflow().state().control, FetchControl::Done);

        // Let a stray worker reach the provider before checking its requests
        tokio::task::yield_now().await;
        assert_eq!(*provider.requests.lock().unwrap(), vec!["bitcoin".to_string()]);

        let output = String::from_utf8(panel.out.clone()).unwrap();
        assert_eq!(output.matches("[Внимание]").count(), 2);
        assert!(output.contains("Подождите, кнопка курса занята (Загрузка...)"));
        assert_eq!(
            panel.workflow().state().last_quote.as_ref().map(|q| q.coin_id.as_str()),
            Some("bitcoin")
        );
    }
}
