// src/ui/widgets/transcript.rs
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap},
};

use crate::chat::SessionState;
use crate::ui::style::{follow_up_style, sender_style};

/// Transcript lines; calm mode puts a blank line between messages.
pub fn transcript_lines(state: &SessionState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, msg) in state.conversation.messages().iter().enumerate() {
        if state.calm_mode && i > 0 {
            lines.push(Line::from(""));
        }

        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", msg.sender), sender_style(msg.role, state.calm_mode)),
            Span::styled(msg.content.clone(), Style::default().fg(Color::White)),
        ]));

        if let Some(hint) = &msg.follow_up {
            lines.push(Line::from(Span::styled(format!("    ↳ {}", hint), follow_up_style())));
        }
    }

    lines
}

/// Rows `lines` occupy once word-wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    Paragraph::new(Text::from(lines.to_vec()))
        .wrap(Wrap { trim: false })
        .line_count(width.max(1))
}

/// `scroll_offset` counts rows up from the newest message.
pub fn render_transcript(state: &SessionState, scroll_offset: usize, area: Rect, buf: &mut Buffer) {
    let padding = if state.calm_mode { Padding::horizontal(2) } else { Padding::ZERO };
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .padding(padding)
        .title(if scroll_offset == 0 {
            " Conversation [LIVE] ".to_string()
        } else {
            format!(" Conversation ↑{} ", scroll_offset)
        });

    let inner = block.inner(area);
    let lines = transcript_lines(state);
    let total = wrapped_height(&lines, inner.width);
    let visible = inner.height as usize;
    let max_scroll = total.saturating_sub(visible);
    let top = max_scroll.saturating_sub(scroll_offset.min(max_scroll));

    Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((top.min(u16::MAX as usize) as u16, 0))
        .render(area, buf);
}
