#[allow(unused_imports)] /// Needed for Stylize in this scope
use ratatui::style::{Style, Stylize};
use ratatui::style::Color;

use crate::chat::Role;

pub const BRAND_BLUE: Color = Color::Rgb(0, 38, 99);

/// Calm mode drops bold emphasis everywhere.
pub fn emphasis(calm_mode: bool, style: Style) -> Style {
    if calm_mode { style } else { style.bold() }
}

pub fn sender_style(role: Role, calm_mode: bool) -> Style {
    let base = match role {
        Role::Bot => Style::default().fg(Color::LightBlue),
        Role::Agent => Style::default().fg(Color::LightGreen),
        Role::User => Style::default().fg(Color::Gray),
    };
    emphasis(calm_mode, base)
}

pub fn follow_up_style() -> Style {
    Style::default().fg(Color::DarkGray).italic()
}
