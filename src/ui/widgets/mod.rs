pub mod escalation_panel;
pub mod transcript;
