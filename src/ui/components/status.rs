use ratatui::{
    layout::Alignment,
    prelude::{Color, Style, Stylize},
    widgets::Paragraph,
};

use super::UiComponent;

impl UiComponent {
    /// Transient notice line, e.g. after a simulated recording.
    pub fn status(status: &str) -> Paragraph {
        Paragraph::new(status)
            .style(Style::default().fg(Color::Black).bg(Color::Yellow).bold())
            .alignment(Alignment::Center)
    }
}
