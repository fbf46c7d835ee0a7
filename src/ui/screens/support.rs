// src/ui/screens/support.rs
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::chat::{Language, SessionState};
use crate::config::SupportConfig;
use crate::ui::components::{UiComponent, KEY_HELP};
use crate::ui::style::{emphasis, BRAND_BLUE};
use crate::ui::widgets::{
    escalation_panel::{panel_height, render_escalation_panel},
    transcript::render_transcript,
};

/// Everything the support screen draws from.
pub struct SupportView<'a> {
    pub state: &'a SessionState,
    pub config: &'a SupportConfig,
    pub input: &'a str,
    pub scroll_offset: usize,
    pub pulse: bool,
}

pub fn render_support_screen(view: &SupportView, area: Rect, buf: &mut Buffer) {
    let state = view.state;
    let strings = view.config.strings(state.language);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                  // Header
            Constraint::Length(1),                  // Language bar
            Constraint::Min(3),                     // Transcript
            Constraint::Length(panel_height(state)), // Countdown / callback offer
            Constraint::Length(3),                  // Input
            Constraint::Length(3),                  // Speak to a human
            Constraint::Length(1),                  // Help or notice
        ])
        .split(area);

    Paragraph::new(strings.header.as_str())
        .block(Block::bordered().border_type(BorderType::Rounded))
        .style(emphasis(state.calm_mode, Style::default().fg(Color::White).bg(BRAND_BLUE)))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

    Paragraph::new(language_bar(state.language, state.calm_mode))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

    render_transcript(state, view.scroll_offset, layout[2], buf);
    render_escalation_panel(state, view.pulse, layout[3], buf);

    Paragraph::new(format!("> {}", view.input))
        .block(
            Block::bordered()
                .title(" Type your message here… ")
                .border_type(BorderType::Rounded),
        )
        .fg(Color::Yellow)
        .render(layout[4], buf);

    let (speak_label, speak_style) = if state.is_escalated() {
        (format!("{} ✓", strings.speak), Style::default().fg(Color::DarkGray))
    } else {
        (
            format!("[F5] {}", strings.speak),
            emphasis(state.calm_mode, Style::default().fg(Color::White).bg(Color::Blue)),
        )
    };
    Paragraph::new(speak_label)
        .block(Block::bordered().border_type(BorderType::Rounded))
        .style(speak_style)
        .alignment(Alignment::Center)
        .render(layout[5], buf);

    match &state.notice {
        Some(notice) => UiComponent::status(notice).render(layout[6], buf),
        None => UiComponent::help(KEY_HELP).render(layout[6], buf),
    }
}

fn language_bar(current: Language, calm_mode: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, language) in Language::all().into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let label = format!("{} {}", language.flag(), language.code());
        if language == current {
            spans.push(Span::styled(label, emphasis(calm_mode, Style::default().reversed())));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        }
    }
    spans.push(Span::styled("   [F2]", Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}
