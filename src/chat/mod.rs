// src/chat/mod.rs

//! Support chat core: keyword classification, the escalation state
//! machine and the session actor that owns its timers.

pub mod classifier;
pub mod language;
pub mod message;
pub mod session;
pub mod state;

pub use classifier::{Classification, KeywordClassifier};
pub use language::Language;
pub use message::{Conversation, Message, Role};
pub use session::{SessionHandle, SupportSession};
pub use state::{
    AgentKind, CallbackChoice, CallbackOffer, EscalationState, RiskLevel, SessionEvent,
    SessionIntent, SessionState, SessionStateMachine,
};
