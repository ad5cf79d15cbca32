/// UI components and formatting helpers shared by the screener views
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// A bounded numeric control adjusted in fixed steps
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub label: &'static str,
    pub help: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Slider {
    pub fn new(label: &'static str, help: &'static str, min: f64, max: f64, value: f64, step: f64) -> Self {
        let mut slider = Self {
            label,
            help,
            value,
            min,
            max,
            step,
        };
        slider.value = slider.clamp(value);
        slider
    }

    /// Slider over an observed range, stepping in hundredths of the span
    pub fn over_range(label: &'static str, help: &'static str, min: f64, max: f64, value: f64) -> Self {
        Self::new(label, help, min, max, value, range_step(min, max))
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn increase(&mut self) -> bool {
        self.set_value(self.value + self.step)
    }

    pub fn decrease(&mut self) -> bool {
        self.set_value(self.value - self.step)
    }

    /// Set the value, clamped to the bounds. Returns true if it changed.
    pub fn set_value(&mut self, value: f64) -> bool {
        // Snap away floating drift from repeated stepping, then clamp so the
        // bounds themselves stay exact
        let next = self.clamp((value * 1e9).round() / 1e9);
        let changed = next != self.value;
        self.value = next;
        changed
    }

    /// Move the bounds, keeping the value inside them
    pub fn set_bounds(&mut self, min: f64, max: f64) {
        self.min = min;
        self.max = max;
        self.step = range_step(min, max);
        self.value = self.clamp(self.value);
    }

    /// Position of the value within the bounds, 0.0 to 1.0
    pub fn fraction(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.value - self.min) / span).clamp(0.0, 1.0)
    }
}

fn range_step(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        span / 100.0
    } else {
        0.01
    }
}

/// Text track for a slider, e.g. `███████───`
pub fn slider_track(fraction: f64, width: usize) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "─".repeat(width - filled))
}

/// One line per slider, with the selected slider highlighted
pub fn slider_line(slider: &Slider, selected: bool, track_width: usize) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let label_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    Line::from(vec![
        Span::styled(format!("{}{:<22}", marker, slider.label), label_style),
        Span::styled(format!("{:>9.2} ", slider.value), Style::default().fg(Color::Cyan)),
        Span::styled(slider_track(slider.fraction(), track_width), Style::default().fg(Color::Green)),
    ])
}

/// Create a percentage change span with + or - prefix
pub fn styled_percentage_change(value: f64) -> Span<'static> {
    let formatted = if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    };

    if value >= 0.0 {
        Span::styled(formatted, Style::default().fg(Color::Green))
    } else {
        Span::styled(formatted, Style::default().fg(Color::Red))
    }
}

/// Format an optional metric, showing N/A when it is missing
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

/// Format an optional metric as a price
pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}", v),
        None => "N/A".to_string(),
    }
}

/// Create a simple ASCII chart from price data
pub fn create_ascii_chart(data: &[(f64, f64)], width: usize, height: usize) -> Vec<String> {
    if data.is_empty() || width == 0 || height == 0 {
        return vec!["No data".to_string()];
    }

    let min_val = data.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max_val = data.iter().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);

    if (max_val - min_val).abs() < f64::EPSILON {
        return vec!["─".repeat(width); height];
    }

    let mut chart = vec![vec![' '; width]; height];

    // Sample evenly when there are more points than columns
    for col in 0..width.min(data.len()) {
        let index = if data.len() > width {
            col * (data.len() - 1) / (width - 1).max(1)
        } else {
            col
        };
        let (_, y) = data[index];

        let normalized = (y - min_val) / (max_val - min_val);
        let row = ((1.0 - normalized) * (height - 1) as f64).round() as usize;
        let row = row.min(height - 1);

        chart[row][col] = '█';
    }

    chart.into_iter().map(|row| row.into_iter().collect()).collect()
}

/// Render a message panel, e.g. "no matches" or "cannot compute"
pub fn render_notice(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let notice = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true });

    f.render_widget(notice, area);
}

/// Render error message
pub fn render_error(f: &mut Frame, area: Rect, error: &str) {
    let error_paragraph = Paragraph::new(error.to_string())
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, area);
}
