use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset as ChartDataset, GraphType, List, ListItem, Paragraph},
    Frame,
};

use crate::analysis::{evaluate_ticker, TickerEvaluation, INVESTMENT_STEP, MIN_INVESTMENT};
use crate::api::HistoryRange;
use crate::data::Dataset;
use crate::error::ScreenerError;
use crate::models::{Currency, PricePoint, StockRecord};
use super::components::{format_optional, format_price, render_error, render_notice, styled_percentage_change};
use super::layout::sidebar_split;
use super::view::View;

/// Which control on the evaluate tab receives typed keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluateFocus {
    Ticker,
    Currency,
    Amount,
}

impl EvaluateFocus {
    fn next(self) -> Self {
        match self {
            EvaluateFocus::Ticker => EvaluateFocus::Currency,
            EvaluateFocus::Currency => EvaluateFocus::Amount,
            EvaluateFocus::Amount => EvaluateFocus::Ticker,
        }
    }

    fn previous(self) -> Self {
        match self {
            EvaluateFocus::Ticker => EvaluateFocus::Amount,
            EvaluateFocus::Currency => EvaluateFocus::Ticker,
            EvaluateFocus::Amount => EvaluateFocus::Currency,
        }
    }
}

/// Follow-up the app must perform after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluateAction {
    None,
    FetchHistory(String),
}

/// Ticker detail with price chart and investment-return calculator
pub struct EvaluateView {
    dataset: Arc<Dataset>,
    pub focus: EvaluateFocus,
    pub query: String,
    pub matches: Vec<String>,
    pub match_index: usize,
    pub selected: Option<String>,
    pub currency: Currency,
    pub amount_input: String,
    pub history_range: HistoryRange,
    pub history: Option<Result<Vec<PricePoint>, String>>,
}

impl EvaluateView {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let mut view = Self {
            dataset,
            focus: EvaluateFocus::Ticker,
            query: String::new(),
            matches: Vec::new(),
            match_index: 0,
            selected: None,
            currency: Currency::default(),
            amount_input: format!("{:.0}", MIN_INVESTMENT),
            history_range: HistoryRange::default(),
            history: None,
        };
        view.refresh_matches();
        view
    }

    fn refresh_matches(&mut self) {
        self.matches = self
            .dataset
            .search(&self.query)
            .into_iter()
            .map(|r| r.ticker.clone())
            .collect();
        self.match_index = 0;
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.refresh_matches();
    }

    pub fn selected_record(&self) -> Option<&StockRecord> {
        self.selected.as_deref().and_then(|t| self.dataset.find(t))
    }

    /// Parsed amount, rejecting anything below the minimum
    pub fn amount(&self) -> Result<f64, String> {
        let amount: f64 = self
            .amount_input
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid amount", self.amount_input))?;
        if amount < MIN_INVESTMENT {
            return Err(format!("Minimum investment is {:.0} {}", MIN_INVESTMENT, self.currency));
        }
        Ok(amount)
    }

    /// Calculator result for the current selection and amount
    pub fn evaluation(&self) -> Option<Result<TickerEvaluation, String>> {
        let ticker = self.selected.as_deref()?;
        let result = self
            .amount()
            .and_then(|amount| {
                evaluate_ticker(&self.dataset, ticker, amount, self.currency).map_err(|e| e.to_string())
            });
        Some(result)
    }

    /// Select a ticker directly, returning the fetch request for its history
    pub fn select(&mut self, ticker: &str) -> EvaluateAction {
        self.selected = Some(ticker.to_string());
        self.history = None;
        EvaluateAction::FetchHistory(ticker.to_string())
    }

    pub fn set_history(&mut self, result: Result<Vec<PricePoint>, ScreenerError>) {
        self.history = Some(result.map_err(|e| e.to_string()));
    }

    pub fn handle_key(&mut self, key: KeyCode) -> EvaluateAction {
        match key {
            KeyCode::Right => {
                self.focus = self.focus.next();
                return EvaluateAction::None;
            }
            KeyCode::Left => {
                self.focus = self.focus.previous();
                return EvaluateAction::None;
            }
            _ => {}
        }

        match self.focus {
            EvaluateFocus::Ticker => self.handle_ticker_key(key),
            EvaluateFocus::Currency => {
                if matches!(key, KeyCode::Up | KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ')) {
                    self.currency = self.currency.next();
                }
                EvaluateAction::None
            }
            EvaluateFocus::Amount => {
                self.handle_amount_key(key);
                EvaluateAction::None
            }
        }
    }

    fn handle_ticker_key(&mut self, key: KeyCode) -> EvaluateAction {
        match key {
            KeyCode::Up => {
                self.match_index = self.match_index.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.match_index + 1 < self.matches.len() {
                    self.match_index += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(ticker) = self.matches.get(self.match_index).cloned() {
                    return self.select(&ticker);
                }
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.refresh_matches();
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.refresh_matches();
            }
            _ => {}
        }
        EvaluateAction::None
    }

    fn handle_amount_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up => {
                let current = self.amount_input.trim().parse::<f64>().unwrap_or(0.0);
                self.amount_input = format!("{}", (current + INVESTMENT_STEP).max(MIN_INVESTMENT));
            }
            KeyCode::Down => {
                let current = self.amount_input.trim().parse::<f64>().unwrap_or(MIN_INVESTMENT);
                self.amount_input = format!("{}", (current - INVESTMENT_STEP).max(MIN_INVESTMENT));
            }
            KeyCode::Backspace => {
                self.amount_input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || (c == '.' && !self.amount_input.contains('.')) => {
                self.amount_input.push(c);
            }
            _ => {}
        }
    }

    fn focus_style(&self, focus: EvaluateFocus) -> Style {
        if self.focus == focus {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    }

    fn render_selector(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let search = Paragraph::new(format!("{}▏", self.query)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select a stock (type to search)")
                .border_style(self.focus_style(EvaluateFocus::Ticker)),
        );
        f.render_widget(search, chunks[0]);

        let visible = chunks[1].height.saturating_sub(2) as usize;
        let start = self.match_index.saturating_sub(visible.saturating_sub(1));
        let items: Vec<ListItem> = self
            .matches
            .iter()
            .enumerate()
            .skip(start)
            .take(visible.max(1))
            .map(|(i, ticker)| {
                let name = self.dataset.find(ticker).map(|r| r.company_name.as_str()).unwrap_or("");
                let style = if i == self.match_index {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else if Some(ticker) == self.selected.as_ref() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{:<10} {}", ticker, name)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} matches", self.matches.len())),
        );
        f.render_widget(list, chunks[1]);
    }

    fn render_metrics(&self, f: &mut Frame, area: Rect, record: &StockRecord) {
        let pct = |v: Option<f64>| v.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "N/A".to_string());
        let lines = vec![
            Line::from(Span::styled(
                format!("{} ({})", record.company_name, record.ticker),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Current Price: {:<12} PE Ratio (TTM): {:<10} Forward PE: {}",
                format_price(record.price),
                format_optional(record.pe_ratio_ttm, 2),
                format_optional(record.pe_forward, 2)
            )),
            Line::from(format!(
                "ROE: {:<21} ROA: {:<20} Dividend Yield: {}",
                pct(record.roe),
                pct(record.roa),
                pct(record.dividend_paid)
            )),
        ];
        let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Evaluate a Stock"));
        f.render_widget(panel, area);
    }

    fn render_history(&self, f: &mut Frame, area: Rect) {
        let title = format!("Price Chart ({})", self.history_range);
        let points = match &self.history {
            None => return render_notice(f, area, &title, "Loading price history..."),
            Some(Err(e)) => return render_error(f, area, &format!("Price history unavailable: {}", e)),
            Some(Ok(points)) => points,
        };

        let data: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.timestamp.timestamp() as f64, p.close))
            .collect();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return render_notice(f, area, &title, "No price history");
        };
        let (lo, hi) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
        let pad = ((hi - lo) * 0.05).max(0.01);

        let datasets = vec![ChartDataset::default()
            .name("Close")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&data)];

        let chart = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(title))
            .x_axis(
                Axis::default()
                    .bounds([data[0].0, data[data.len() - 1].0])
                    .labels(vec![
                        Span::raw(first.timestamp.format("%Y-%m-%d").to_string()),
                        Span::raw(last.timestamp.format("%Y-%m-%d").to_string()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .bounds([lo - pad, hi + pad])
                    .labels(vec![Span::raw(format!("{:.2}", lo)), Span::raw(format!("{:.2}", hi))]),
            );
        f.render_widget(chart, area);
    }

    fn render_calculator(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Currency: ", self.focus_style(EvaluateFocus::Currency)),
                Span::raw(self.currency.to_string()),
                Span::styled("   Amount: ", self.focus_style(EvaluateFocus::Amount)),
                Span::raw(format!("{} {}", self.amount_input, self.currency)),
            ]),
            Line::from(""),
        ];

        match self.evaluation() {
            None => lines.push(Line::from("Select a stock to evaluate")),
            Some(Err(e)) => lines.push(Line::from(Span::styled(e, Style::default().fg(Color::Red)))),
            Some(Ok(evaluation)) => {
                lines.push(Line::from(Span::styled(evaluation.shares_line(), Style::default().fg(Color::Green))));
                lines.push(Line::from(evaluation.expected_value_line()));
                lines.push(Line::from(vec![
                    Span::raw(format!(
                        "Estimated Gain: {:.2} {} ",
                        evaluation.projection.gain, evaluation.currency
                    )),
                    styled_percentage_change(evaluation.projection.gain_pct),
                ]));
            }
        }

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Investment Return Calculator"),
        );
        f.render_widget(panel, area);
    }
}

impl View for EvaluateView {
    fn render(&self, f: &mut Frame, area: Rect) {
        let (selector, detail) = sidebar_split(area, 44);
        self.render_selector(f, selector);

        let Some(record) = self.selected_record() else {
            render_notice(f, detail, "Evaluate a Stock", "Pick a ticker and press Enter");
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(8), Constraint::Length(7)])
            .split(detail);

        self.render_metrics(f, chunks[0], record);
        self.render_history(f, chunks[1]);
        self.render_calculator(f, chunks[2]);
    }

    fn title(&self) -> &'static str {
        "Evaluate a Stock"
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("←→", "focus"),
            ("↑↓", "choose/adjust"),
            ("Enter", "select"),
            ("Tab", "switch"),
            ("Esc", "clear/quit"),
        ]
    }

    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.dataset = dataset;
        self.refresh_matches();
        if self.selected_record().is_none() {
            self.selected = None;
            self.history = None;
        }
    }
}
