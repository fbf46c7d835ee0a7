// src/ui/widgets/escalation_panel.rs
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::chat::SessionState;
use crate::ui::style::emphasis;

/// `m:ss`, e.g. 120 -> "2:00".
pub fn format_countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Rows the panel needs for this state (0 when there is nothing to show).
pub fn panel_height(state: &SessionState) -> u16 {
    let mut rows = 0;
    if state.countdown_secs() > 0 {
        rows += 2;
    }
    if state.offer_visible() {
        rows += 1;
    }
    if rows == 0 { 0 } else { rows + 2 }
}

pub fn panel_lines(state: &SessionState, pulse: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let remaining = state.countdown_secs();

    if remaining > 0 {
        let dot = if pulse { "●" } else { "○" };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", dot), Style::default().fg(Color::Red)),
            Span::styled(
                format!("Agent connecting in: {}", format_countdown(remaining)),
                emphasis(state.calm_mode, Style::default().fg(Color::LightRed)),
            ),
            Span::styled("   [F6] Cancel", Style::default().fg(Color::Gray)),
        ]));
        let case = state
            .case_number
            .map(|n| format!("Priority case #{} - Security team notified", n))
            .unwrap_or_default();
        lines.push(Line::from(Span::styled(case, Style::default().fg(Color::Red))));
    }

    if state.offer_visible() {
        lines.push(Line::from(vec![
            Span::styled("📞 [F7] Instant Callback", Style::default().fg(Color::White)),
            Span::raw("     "),
            Span::styled("🗓 [F8] Schedule Callback", Style::default().fg(Color::White)),
        ]));
    }

    lines
}

pub fn render_escalation_panel(state: &SessionState, pulse: bool, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }

    let border = if state.countdown_secs() > 0 { Color::Red } else { Color::Green };
    Paragraph::new(panel_lines(state, pulse))
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border))
                .title(" Escalation ".bold()),
        )
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{CallbackOffer, EscalationState, RiskLevel};
    use crate::config::SupportConfig;
    use chrono::Local;

    fn state() -> SessionState {
        SessionState::new("t".into(), &SupportConfig::builtin().unwrap(), Local::now())
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(120), "2:00");
        assert_eq!(format_countdown(299), "4:59");
        assert_eq!(format_countdown(7), "0:07");
        assert_eq!(format_countdown(0), "0:00");
    }

    #[test]
    fn test_hidden_when_idle() {
        let state = state();
        assert_eq!(panel_height(&state), 0);
        assert!(panel_lines(&state, false).is_empty());
    }

    #[test]
    fn test_countdown_and_offer_lines() {
        let mut state = state();
        state.escalation = EscalationState::AutoEscalating { risk: RiskLevel::High, remaining_secs: 118 };
        state.case_number = Some(77);
        state.callback_offer = CallbackOffer::Shown;

        let lines: Vec<String> = panel_lines(&state, true).iter().map(|l| l.to_string()).collect();
        assert_eq!(panel_height(&state), 5);
        assert!(lines[0].contains("Agent connecting in: 1:58"));
        assert!(lines[1].contains("Priority case #77"));
        assert!(lines[2].contains("Instant Callback"));
        assert!(lines[2].contains("Schedule Callback"));
    }
}
