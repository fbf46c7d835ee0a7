pub mod components;
pub mod screens;
pub mod style;
pub mod widgets;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::Widget,
};
use crate::app::App;
use crate::ui::screens::support::{render_support_screen, SupportView};

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = SupportView {
            state: &self.snapshot,
            config: &self.config,
            input: &self.input,
            scroll_offset: self.scroll_offset,
            pulse: self.pulse,
        };
        render_support_screen(&view, area, buf);
    }
}
