use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use tracing::debug;

use crate::analysis::{screen, ScreeningOutcome};
use crate::data::Dataset;
use crate::models::{FilterCriteria, WeightVector};
use super::components::{format_optional, format_price, render_notice, slider_line, Slider};
use super::layout::{sidebar_split, two_columns};
use super::view::View;

const WEIGHT_STEP: f64 = 0.05;
const SLIDER_COUNT: usize = 7;
// Tallest bar chart drawn, in bars
const MAX_CHART_BARS: usize = 50;

/// What the user did with a key on the screener tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenerInput {
    Ignored,
    Navigated,
    Recomputed,
}

/// Weight and filter controls plus the ranked result of the latest pass
pub struct ScreenerView {
    dataset: Arc<Dataset>,
    pub weights: [Slider; 4],
    pub min_score: Slider,
    pub max_pe: Slider,
    pub min_roe: Slider,
    pub selected: usize,
    pub top_n: usize,
    pub table_offset: usize,
    pub outcome: Option<ScreeningOutcome>,
    pub error: Option<String>,
}

impl ScreenerView {
    pub fn new(dataset: Arc<Dataset>, top_n: usize) -> Self {
        let defaults = WeightVector::default();
        let weights = [
            Slider::new("PE Score Weight", "Lower PE means better value", 0.0, 1.0, defaults.pe, WEIGHT_STEP),
            Slider::new("ROE Score Weight", "Higher ROE means better profitability", 0.0, 1.0, defaults.roe, WEIGHT_STEP),
            Slider::new("ROA Score Weight", "Higher ROA means better asset efficiency", 0.0, 1.0, defaults.roa, WEIGHT_STEP),
            Slider::new("Dividend Score Weight", "Higher dividends attract income investors", 0.0, 1.0, defaults.dividend, WEIGHT_STEP),
        ];

        let mut view = Self {
            dataset,
            weights,
            min_score: Slider::over_range("Minimum Score", "Hide stocks scoring below this", 0.0, 0.0, 0.0),
            max_pe: Slider::over_range("Max PE Ratio", "Hide stocks with a higher trailing PE", 0.0, 0.0, 0.0),
            min_roe: Slider::over_range("Min ROE", "Hide stocks with a lower ROE", 0.0, 0.0, 0.0),
            selected: 0,
            top_n,
            table_offset: 0,
            outcome: None,
            error: None,
        };
        view.reset_filters();
        view
    }

    /// Set the filters to the widest observed bounds, then recompute
    pub fn reset_filters(&mut self) {
        if let Some(bounds) = self.dataset.filter_bounds() {
            self.max_pe = Slider::over_range(self.max_pe.label, self.max_pe.help, bounds.pe_min, bounds.pe_max, bounds.pe_max);
            self.min_roe = Slider::over_range(self.min_roe.label, self.min_roe.help, bounds.roe_min, bounds.roe_max, bounds.roe_min);
        }

        // Score bounds depend on the weights, so run once unfiltered first
        let criteria = FilterCriteria::new(f64::NEG_INFINITY, self.max_pe.value, self.min_roe.value);
        if let Ok(outcome) = screen(self.dataset.records(), &self.raw_weights(), &criteria, self.top_n) {
            if let Some((lo, hi)) = outcome.score_range() {
                self.min_score = Slider::over_range(self.min_score.label, self.min_score.help, lo, hi, lo);
            }
        }

        self.recompute();
    }

    pub fn raw_weights(&self) -> WeightVector {
        WeightVector::new(
            self.weights[0].value,
            self.weights[1].value,
            self.weights[2].value,
            self.weights[3].value,
        )
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.min_score.value, self.max_pe.value, self.min_roe.value)
    }

    /// Full normalize, score, filter, rank pass over the dataset
    pub fn recompute(&mut self) {
        self.table_offset = 0;
        match screen(self.dataset.records(), &self.raw_weights(), &self.criteria(), self.top_n) {
            Ok(outcome) => {
                // Weight changes move the score range; keep the control inside it
                if let Some((lo, hi)) = outcome.score_range() {
                    let before = self.min_score.value;
                    self.min_score.set_bounds(lo, hi);
                    if self.min_score.value != before {
                        self.recompute();
                        return;
                    }
                }
                debug!("Screener recomputed: {} matches", outcome.filtered.len());
                self.outcome = Some(outcome);
                self.error = None;
            }
            Err(e) => {
                self.outcome = None;
                self.error = Some(e.to_string());
            }
        }
    }

    fn slider_mut(&mut self, index: usize) -> &mut Slider {
        match index {
            0..=3 => &mut self.weights[index],
            4 => &mut self.min_score,
            5 => &mut self.max_pe,
            _ => &mut self.min_roe,
        }
    }

    fn sliders(&self) -> [&Slider; SLIDER_COUNT] {
        [
            &self.weights[0],
            &self.weights[1],
            &self.weights[2],
            &self.weights[3],
            &self.min_score,
            &self.max_pe,
            &self.min_roe,
        ]
    }

    pub fn selected_slider(&self) -> &Slider {
        self.sliders()[self.selected]
    }

    /// Rows for the top-N chart including its border
    pub fn chart_height(&self) -> u16 {
        self.top_n.min(MAX_CHART_BARS) as u16 + 2
    }

    pub fn handle_key(&mut self, key: KeyCode) -> ScreenerInput {
        match key {
            KeyCode::Up => {
                self.selected = if self.selected == 0 { SLIDER_COUNT - 1 } else { self.selected - 1 };
                ScreenerInput::Navigated
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1) % SLIDER_COUNT;
                ScreenerInput::Navigated
            }
            KeyCode::Left | KeyCode::Right => {
                let index = self.selected;
                let slider = self.slider_mut(index);
                let changed = if key == KeyCode::Right { slider.increase() } else { slider.decrease() };
                if changed {
                    self.recompute();
                    ScreenerInput::Recomputed
                } else {
                    ScreenerInput::Ignored
                }
            }
            KeyCode::PageDown => {
                let len = self.outcome.as_ref().map_or(0, |o| o.filtered.len());
                self.table_offset = (self.table_offset + 10).min(len.saturating_sub(1));
                ScreenerInput::Navigated
            }
            KeyCode::PageUp => {
                self.table_offset = self.table_offset.saturating_sub(10);
                ScreenerInput::Navigated
            }
            KeyCode::Char('0') => {
                self.reset_filters();
                ScreenerInput::Recomputed
            }
            _ => ScreenerInput::Ignored,
        }
    }

    fn render_controls(&self, f: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            "Adjust Weights",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (i, slider) in self.sliders().iter().enumerate() {
            if i == 4 {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Filter Criteria",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            lines.push(slider_line(slider, i == self.selected, 12));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            self.selected_slider().help,
            Style::default().fg(Color::Gray),
        )));

        let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(panel, area);
    }

    fn render_top_pick(&self, f: &mut Frame, area: Rect, outcome: &ScreeningOutcome) {
        match outcome.best_pick() {
            Ok(top) => {
                let r = &top.record;
                let lines = vec![
                    Line::from(vec![Span::raw("Company: "), Span::styled(r.company_name.clone(), Style::default().add_modifier(Modifier::BOLD))]),
                    Line::from(format!("Ticker:  {}", r.ticker)),
                    Line::from(format!("Score:   {:.2}", top.score)),
                    Line::from(format!("Price:   {}", format_price(r.price))),
                    Line::from(format!("Target:  {}", format_price(r.y_target))),
                ];
                let panel = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("Top Scoring Stock"));
                f.render_widget(panel, area);
            }
            Err(e) => render_notice(f, area, "Top Scoring Stock", &e.to_string()),
        }
    }

    fn render_summary(&self, f: &mut Frame, area: Rect, outcome: &ScreeningOutcome) {
        let lines: Vec<Line> = outcome
            .summary
            .lines()
            .into_iter()
            .map(|l| Line::from(format!("• {}", l)))
            .collect();
        let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Summary"));
        f.render_widget(panel, area);
    }

    fn render_top_chart(&self, f: &mut Frame, area: Rect, outcome: &ScreeningOutcome) {
        let title = format!("Top {} Stocks by Score", self.top_n);
        if outcome.top.is_empty() {
            render_notice(f, area, &title, "Nothing to chart");
            return;
        }

        let bars: Vec<Bar> = outcome
            .top
            .iter()
            .map(|s| {
                Bar::default()
                    .label(Line::from(s.record.ticker.clone()))
                    .value((s.score.max(0.0) * 1000.0).round() as u64)
                    .text_value(format!("{:.3}", s.score))
            })
            .collect();

        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Cyan))
            .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .data(BarGroup::default().bars(&bars));
        f.render_widget(chart, area);
    }

    fn render_table(&self, f: &mut Frame, area: Rect, outcome: &ScreeningOutcome) {
        let header = Row::new(["Ticker", "Company", "Score", "Price", "Target", "PE TTM", "ROE"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = outcome
            .filtered
            .iter()
            .skip(self.table_offset)
            .map(|s| {
                let r = &s.record;
                Row::new(vec![
                    Cell::from(r.ticker.clone()),
                    Cell::from(r.company_name.clone()),
                    Cell::from(format!("{:.3}", s.score)),
                    Cell::from(format_optional(r.price, 2)),
                    Cell::from(format_optional(r.y_target, 2)),
                    Cell::from(format_optional(r.pe_ratio_ttm, 2)),
                    Cell::from(format_optional(r.roe, 2)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Min(16),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(8),
        ];
        let title = format!(
            "Filtered Stock Table ({} rows, PgUp/PgDn to scroll)",
            outcome.filtered.len()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(table, area);
    }
}

impl View for ScreenerView {
    fn render(&self, f: &mut Frame, area: Rect) {
        let (controls, main) = sidebar_split(area, 50);
        self.render_controls(f, controls);

        let outcome = match (&self.outcome, &self.error) {
            (Some(outcome), _) => outcome,
            (None, Some(error)) => {
                render_notice(f, main, "Cannot compute", error);
                return;
            }
            (None, None) => {
                render_notice(f, main, "Screener", "No data loaded");
                return;
            }
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Length(self.chart_height()),
                Constraint::Min(5),
            ])
            .split(main);

        let (pick_area, summary_area) = two_columns(chunks[0]);
        self.render_top_pick(f, pick_area, outcome);
        self.render_summary(f, summary_area, outcome);
        self.render_top_chart(f, chunks[1], outcome);
        self.render_table(f, chunks[2], outcome);
    }

    fn title(&self) -> &'static str {
        "Stock Screener"
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("↑↓", "select"),
            ("←→", "adjust"),
            ("0", "reset filters"),
            ("E", "export CSV"),
            ("R", "reload"),
            ("Tab", "switch"),
            ("Q", "quit"),
        ]
    }

    fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.dataset = dataset;
        self.reset_filters();
    }
}
