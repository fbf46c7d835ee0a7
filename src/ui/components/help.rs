use ratatui::{
    layout::Alignment,
    prelude::{Color, Style},
    widgets::Paragraph,
};

use super::UiComponent;

pub const KEY_HELP: &str =
    "Enter send • F2 language • F3 calm • F5 human • F6 cancel • F7/F8 callback • F9 audio • Esc quit";

impl UiComponent {
    pub fn help(text: &str) -> Paragraph {
        Paragraph::new(text)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
    }
}
