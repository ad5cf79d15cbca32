use std::sync::Arc;

use ratatui::{prelude::Rect, Frame};

use crate::data::Dataset;

/// Contract shared by the dashboard tabs
pub trait View {
    /// Render the view
    fn render(&self, f: &mut Frame, area: Rect);

    /// Tab title
    fn title(&self) -> &'static str;

    /// Key hints for the status bar
    fn hints(&self) -> Vec<(&'static str, &'static str)>;

    /// Swap in a freshly loaded dataset and recompute derived state
    fn set_dataset(&mut self, dataset: Arc<Dataset>);
}
