use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::api::PriceHistoryProvider;
use crate::data::{Dataset, DatasetSource};
use crate::export::export_to_dir;
use crate::models::Config;
use super::evaluator::{EvaluateAction, EvaluateView};
use super::layout::TuiLayout;
use super::screener::ScreenerView;
use super::view::View;

const TAB_COUNT: usize = 2;

pub struct ScreenerApp {
    source: Box<dyn DatasetSource + Send>,
    prices: Arc<dyn PriceHistoryProvider>,
    dataset: Arc<Dataset>,
    export_dir: PathBuf,
    pub screener: ScreenerView,
    pub evaluator: EvaluateView,
    pub selected_tab: usize,
    pub should_quit: bool,
    pub status_message: String,
    pending_history: Option<String>,
}

impl ScreenerApp {
    pub fn new(
        config: &Config,
        source: Box<dyn DatasetSource + Send>,
        prices: Arc<dyn PriceHistoryProvider>,
    ) -> Result<Self> {
        let dataset = source.load()?;
        let status_message = format!("Loaded {} stocks", dataset.len());

        Ok(Self {
            screener: ScreenerView::new(Arc::clone(&dataset), config.top_n),
            evaluator: EvaluateView::new(Arc::clone(&dataset)),
            dataset,
            source,
            prices,
            export_dir: config.export_dir.clone(),
            selected_tab: 0,
            should_quit: false,
            status_message,
            pending_history: None,
        })
    }

    fn current_view(&self) -> &dyn View {
        match self.selected_tab {
            0 => &self.screener,
            _ => &self.evaluator,
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let layout = TuiLayout::new(f.area());
        let titles = [self.screener.title(), self.evaluator.title()];
        layout.render_tab_bar(f, &titles, self.selected_tab);

        let view = self.current_view();
        view.render(f, layout.content);
        layout.render_status_bar(f, &view.hints(), &self.status_message);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => {
                self.selected_tab = (self.selected_tab + 1) % TAB_COUNT;
                return Ok(());
            }
            KeyCode::BackTab => {
                self.selected_tab = if self.selected_tab == 0 { TAB_COUNT - 1 } else { self.selected_tab - 1 };
                return Ok(());
            }
            _ => {}
        }

        if self.selected_tab == 0 {
            self.handle_screener_key(key.code)
        } else {
            self.handle_evaluator_key(key.code)
        }
    }

    fn handle_screener_key(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload(),
            other => {
                self.screener.handle_key(other);
                if let Some(error) = &self.screener.error {
                    self.status_message = error.clone();
                } else if let Some(outcome) = &self.screener.outcome {
                    self.status_message = format!(
                        "{} of {} stocks match",
                        outcome.filtered.len(),
                        outcome.scored.len()
                    );
                }
            }
        }
        Ok(())
    }

    fn handle_evaluator_key(&mut self, key: KeyCode) -> Result<()> {
        if key == KeyCode::Esc {
            if self.evaluator.query.is_empty() {
                self.should_quit = true;
            } else {
                self.evaluator.clear_query();
            }
            return Ok(());
        }

        if let EvaluateAction::FetchHistory(ticker) = self.evaluator.handle_key(key) {
            self.status_message = format!("Loading price history for {}...", ticker);
            self.pending_history = Some(ticker);
        }
        Ok(())
    }

    pub fn has_pending_fetch(&self) -> bool {
        self.pending_history.is_some()
    }

    /// Run the history fetch queued by the last selection, if any.
    /// The loop draws once before calling this so the loading status is visible.
    pub async fn run_pending_fetch(&mut self) {
        if let Some(ticker) = self.pending_history.take() {
            self.fetch_history(&ticker).await;
        }
    }

    /// Fetch the chart series for `ticker` through the injected provider
    pub async fn fetch_history(&mut self, ticker: &str) {
        let range = self.evaluator.history_range;
        let result = self.prices.price_history(ticker, range).await;
        self.status_message = match &result {
            Ok(points) => format!("Showing {} price points for {}", points.len(), ticker),
            Err(e) => {
                error!("Price history for {} failed: {}", ticker, e);
                format!("Price history unavailable for {}", ticker)
            }
        };
        self.evaluator.set_history(result);
    }

    fn export(&mut self) {
        let Some(outcome) = &self.screener.outcome else {
            self.status_message = "Nothing to export".to_string();
            return;
        };
        self.status_message = match export_to_dir(
            &self.export_dir,
            self.dataset.columns(),
            &outcome.filtered,
            Utc::now(),
        ) {
            Ok(path) => format!("Exported {} rows to {}", outcome.filtered.len(), path.display()),
            Err(e) => format!("Export failed: {}", e),
        };
    }

    fn reload(&mut self) {
        match self.source.reload() {
            Ok(dataset) => self.install(dataset, "Reloaded"),
            Err(e) => {
                self.status_message = format!("Reload failed: {}", e);
            }
        }
    }

    /// Pick up a new dataset if the source's reload policy produced one
    pub fn refresh_if_changed(&mut self) {
        match self.source.load() {
            Ok(dataset) if !Arc::ptr_eq(&dataset, &self.dataset) => {
                info!("Data source changed, {} stocks loaded", dataset.len());
                self.install(dataset, "Data file changed, loaded");
            }
            Ok(_) => {}
            Err(e) => {
                self.status_message = format!("Reload failed: {}", e);
            }
        }
    }

    fn install(&mut self, dataset: Arc<Dataset>, verb: &str) {
        self.status_message = format!("{} {} stocks", verb, dataset.len());
        self.screener.set_dataset(Arc::clone(&dataset));
        self.evaluator.set_dataset(Arc::clone(&dataset));
        self.dataset = dataset;
    }
}

/// Run the dashboard until the user quits
pub async fn run_app(
    config: &Config,
    source: Box<dyn DatasetSource + Send>,
    prices: Arc<dyn PriceHistoryProvider>,
) -> Result<()> {
    // Load before touching the terminal so errors print normally
    let mut app = ScreenerApp::new(config, source, prices)?;

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    info!("Dashboard started");

    let result = loop {
        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        match event::poll(Duration::from_millis(250)) {
            Ok(true) => {}
            Ok(false) => {
                app.refresh_if_changed();
                continue;
            }
            Err(e) => break Err(e.into()),
        }

        if let Ok(Event::Key(key)) = event::read() {
            if key.kind == KeyEventKind::Press {
                if let Err(e) = app.handle_key_event(key) {
                    break Err(e);
                }

                if app.has_pending_fetch() {
                    if let Err(e) = terminal.draw(|f| app.draw(f)) {
                        break Err(e.into());
                    }
                    app.run_pending_fetch().await;
                }

                if app.should_quit {
                    break Ok(());
                }
            }
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
