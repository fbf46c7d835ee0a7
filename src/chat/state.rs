// src/chat/state.rs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::classifier::{Classification, KeywordClassifier};
use super::language::Language;
use super::message::{Conversation, Role};
use crate::config::{fill, SupportConfig};

/// Sender label for everything the customer types.
pub const USER_SENDER: &str = "You";
pub const AUDIO_SENDER: &str = "You (audio)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
}

/// Which agent persona picks up the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    Security,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationState {
    Idle,
    AutoEscalating { risk: RiskLevel, remaining_secs: u32 },
    /// `greeted` stays false while a manual request waits for its agent.
    AgentJoined { agent: AgentKind, greeted: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackChoice {
    Instant,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackOffer {
    Hidden,
    Shown,
    Answered(CallbackChoice),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub conversation: Conversation,
    pub escalation: EscalationState,
    pub callback_offer: CallbackOffer,
    pub language: Language,
    pub calm_mode: bool,
    /// Priority case number shown while a case is open.
    pub case_number: Option<u32>,
    /// Bumped every time an automatic countdown starts.
    pub escalation_epoch: u64,
    pub notice: Option<String>,
}

impl SessionState {
    pub fn new(session_id: String, config: &SupportConfig, now: DateTime<Local>) -> Self {
        let language = config.default_language;
        let mut conversation = Conversation::new();
        conversation.reset(&config.personas.bot, &config.welcome(language), now);

        Self {
            session_id,
            conversation,
            escalation: EscalationState::Idle,
            callback_offer: CallbackOffer::Hidden,
            language,
            calm_mode: false,
            case_number: None,
            escalation_epoch: 0,
            notice: None,
        }
    }

    /// Seconds left before an agent joins; zero outside of a countdown.
    pub fn countdown_secs(&self) -> u32 {
        match self.escalation {
            EscalationState::AutoEscalating { remaining_secs, .. } => remaining_secs,
            _ => 0,
        }
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self.escalation, EscalationState::AgentJoined { .. })
    }

    pub fn offer_visible(&self) -> bool {
        self.callback_offer == CallbackOffer::Shown
    }
}

// ----------------------------------------------------------------------------
// INTENT - Messages that express what user wants to do
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionIntent {
    SubmitText(String),
    RequestHuman,
    CancelEscalation,
    InstantCallback,
    ScheduleCallback,
    RecordAudio,
    SetLanguage(Language),
    NextLanguage,
    ToggleCalmMode,
    DismissNotice,

    // Internal events (sent by the session's own timers)
    CountdownTick { epoch: u64 },
    CallbackOfferDue { epoch: u64 },
    AgentGreetingDue,

    Shutdown,
}

// ----------------------------------------------------------------------------
// EVENTS - Things that happened (past tense)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    MessageAppended { id: u64, role: Role },
    EscalationStarted { risk: RiskLevel, countdown_secs: u32, epoch: u64 },
    EscalationUpgraded { remaining_secs: u32, epoch: u64 },
    CallbackOfferScheduled { epoch: u64 },
    CountdownTicked { remaining_secs: u32 },
    CountdownStopped,
    EscalationCancelled,
    AgentRequested,
    AgentJoined { agent: AgentKind },
    CallbackOfferShown,
    CallbackChosen(CallbackChoice),
    LanguageChanged(Language),
    CalmModeChanged(bool),
    NoticeRaised(String),
    NoticeDismissed,
    SessionClosed,
}

/// Everything a transition may read besides the state itself.
pub struct TransitionContext<'a> {
    pub config: &'a SupportConfig,
    pub classifier: &'a KeywordClassifier,
    pub now: DateTime<Local>,
    /// Case number to assign if this transition opens a case.
    pub case_number: u32,
}

// ----------------------------------------------------------------------------
// STATE MACHINE - Pure function: (State, Intent) -> (State, Vec<Event>)
// ----------------------------------------------------------------------------

pub struct SessionStateMachine;

impl SessionStateMachine {
    pub fn transition(
        state: SessionState,
        intent: SessionIntent,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        use SessionIntent::*;

        match intent {
            SubmitText(text) => Self::handle_submit(state, text, ctx),
            RequestHuman => Self::handle_request_human(state, ctx),
            CancelEscalation => Self::handle_cancel(state, ctx),
            InstantCallback => Self::handle_callback(state, CallbackChoice::Instant, ctx),
            ScheduleCallback => Self::handle_callback(state, CallbackChoice::Scheduled, ctx),
            RecordAudio => Self::handle_record_audio(state, ctx),
            SetLanguage(language) => Self::handle_set_language(state, language, ctx),
            NextLanguage => {
                let next = state.language.next();
                Self::handle_set_language(state, next, ctx)
            }
            ToggleCalmMode => Self::handle_toggle_calm(state),
            DismissNotice => Self::handle_dismiss_notice(state),
            CountdownTick { epoch } => Self::handle_tick(state, epoch, ctx),
            CallbackOfferDue { epoch } => Self::handle_offer_due(state, epoch, ctx),
            AgentGreetingDue => Self::handle_greeting_due(state, ctx),
            Shutdown => (state, vec![SessionEvent::CountdownStopped, SessionEvent::SessionClosed]),
        }
    }

    fn append(
        state: &mut SessionState,
        events: &mut Vec<SessionEvent>,
        sender: &str,
        content: &str,
        role: Role,
        ctx: &TransitionContext,
    ) {
        let id = state.conversation.append(sender, content, role, ctx.now).id;
        events.push(SessionEvent::MessageAppended { id, role });
    }

    fn handle_submit(
        mut state: SessionState,
        text: String,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        let text = text.trim();
        if text.is_empty() {
            return (state, vec![]);
        }

        let mut events = Vec::new();
        Self::append(&mut state, &mut events, USER_SENDER, text, Role::User, ctx);

        if let Some(term) = ctx.classifier.glossary_command(text) {
            let reply = ctx.classifier.definition_reply(term);
            Self::append(&mut state, &mut events, &ctx.config.personas.bot, &reply, Role::Bot, ctx);
            return (state, events);
        }

        let classification = ctx.classifier.classify(text);
        match (classification, state.escalation) {
            (Classification::HighRisk, EscalationState::Idle) => {
                Self::start_escalation(state, events, RiskLevel::High, ctx)
            }
            (Classification::Emotional, EscalationState::Idle) => {
                Self::start_escalation(state, events, RiskLevel::Medium, ctx)
            }
            (
                Classification::HighRisk,
                EscalationState::AutoEscalating { risk: RiskLevel::Medium, remaining_secs },
            ) => Self::upgrade_escalation(state, events, remaining_secs, ctx),
            _ => {
                let reply = ctx.classifier.normal_reply(text);
                let id = state
                    .conversation
                    .append_with_hint(&ctx.config.personas.bot, &reply.content, Role::Bot, ctx.now, reply.follow_up)
                    .id;
                events.push(SessionEvent::MessageAppended { id, role: Role::Bot });
                (state, events)
            }
        }
    }

    fn start_escalation(
        mut state: SessionState,
        mut events: Vec<SessionEvent>,
        risk: RiskLevel,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        let (sender, alert, countdown_secs) = match risk {
            RiskLevel::High => (
                &ctx.config.personas.security_bot,
                &ctx.config.scripts.high_risk_alert,
                ctx.config.timing.high_risk_countdown_secs,
            ),
            RiskLevel::Medium => (
                &ctx.config.personas.bot,
                &ctx.config.scripts.emotional_alert,
                ctx.config.timing.emotional_countdown_secs,
            ),
        };
        Self::append(&mut state, &mut events, sender, alert, Role::Bot, ctx);

        // Every new case gets a fresh callback offer.
        state.escalation_epoch += 1;
        state.case_number = Some(ctx.case_number);
        state.callback_offer = CallbackOffer::Hidden;
        state.escalation = EscalationState::AutoEscalating { risk, remaining_secs: countdown_secs };

        let epoch = state.escalation_epoch;
        events.push(SessionEvent::EscalationStarted { risk, countdown_secs, epoch });
        if risk == RiskLevel::High {
            events.push(SessionEvent::CallbackOfferScheduled { epoch });
        }
        (state, events)
    }

    fn upgrade_escalation(
        mut state: SessionState,
        mut events: Vec<SessionEvent>,
        remaining_secs: u32,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        Self::append(
            &mut state,
            &mut events,
            &ctx.config.personas.security_bot,
            &ctx.config.scripts.high_risk_alert,
            Role::Bot,
            ctx,
        );

        let remaining_secs = remaining_secs.min(ctx.config.timing.high_risk_countdown_secs);
        state.escalation = EscalationState::AutoEscalating { risk: RiskLevel::High, remaining_secs };

        let epoch = state.escalation_epoch;
        events.push(SessionEvent::EscalationUpgraded { remaining_secs, epoch });
        events.push(SessionEvent::CallbackOfferScheduled { epoch });
        (state, events)
    }

    fn handle_tick(
        mut state: SessionState,
        epoch: u64,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        // Ticks from a countdown that has since been cancelled or replaced.
        if epoch != state.escalation_epoch {
            return (state, vec![]);
        }

        match state.escalation {
            EscalationState::AutoEscalating { risk, remaining_secs } if remaining_secs > 1 => {
                let remaining_secs = remaining_secs - 1;
                state.escalation = EscalationState::AutoEscalating { risk, remaining_secs };
                (state, vec![SessionEvent::CountdownTicked { remaining_secs }])
            }
            EscalationState::AutoEscalating { risk, .. } => {
                let agent = match risk {
                    RiskLevel::High => AgentKind::Security,
                    RiskLevel::Medium => AgentKind::Regular,
                };
                let mut events = vec![
                    SessionEvent::CountdownTicked { remaining_secs: 0 },
                    SessionEvent::CountdownStopped,
                ];
                Self::agent_joins(&mut state, &mut events, agent, ctx);
                (state, events)
            }
            _ => (state, vec![]),
        }
    }

    fn agent_joins(
        state: &mut SessionState,
        events: &mut Vec<SessionEvent>,
        agent: AgentKind,
        ctx: &TransitionContext,
    ) {
        let persona = match agent {
            AgentKind::Security => &ctx.config.personas.security_agent,
            AgentKind::Regular => &ctx.config.personas.agent,
        };
        let greeting = fill(&persona.greeting, &[("customer", ctx.config.customer_name.as_str())]);
        Self::append(state, events, &persona.name, &greeting, Role::Agent, ctx);

        state.escalation = EscalationState::AgentJoined { agent, greeted: true };
        events.push(SessionEvent::AgentJoined { agent });

        if state.callback_offer == CallbackOffer::Hidden {
            state.callback_offer = CallbackOffer::Shown;
            events.push(SessionEvent::CallbackOfferShown);
        }
    }

    fn handle_offer_due(
        mut state: SessionState,
        epoch: u64,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        let still_open = epoch == state.escalation_epoch
            && matches!(
                state.escalation,
                EscalationState::AutoEscalating { risk: RiskLevel::High, .. }
            );
        if !still_open || state.callback_offer != CallbackOffer::Hidden {
            return (state, vec![]);
        }

        let mut events = vec![];
        state.callback_offer = CallbackOffer::Shown;
        events.push(SessionEvent::CallbackOfferShown);
        Self::append(
            &mut state,
            &mut events,
            &ctx.config.personas.security_bot,
            &ctx.config.scripts.callback_offer,
            Role::Bot,
            ctx,
        );
        (state, events)
    }

    fn handle_cancel(
        mut state: SessionState,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        if !matches!(state.escalation, EscalationState::AutoEscalating { .. }) {
            return (state, vec![]);
        }

        let mut events = vec![SessionEvent::CountdownStopped, SessionEvent::EscalationCancelled];
        state.escalation = EscalationState::Idle;
        state.case_number = None;
        if state.callback_offer == CallbackOffer::Shown {
            state.callback_offer = CallbackOffer::Hidden;
        }
        Self::append(
            &mut state,
            &mut events,
            &ctx.config.personas.bot,
            &ctx.config.scripts.cancelled,
            Role::Bot,
            ctx,
        );
        (state, events)
    }

    fn handle_request_human(
        mut state: SessionState,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        if state.escalation != EscalationState::Idle {
            return (state, vec![]);
        }

        let mut events = vec![];
        Self::append(
            &mut state,
            &mut events,
            &ctx.config.personas.bot,
            &ctx.config.scripts.manual_connecting,
            Role::Bot,
            ctx,
        );
        state.escalation = EscalationState::AgentJoined { agent: AgentKind::Regular, greeted: false };
        events.push(SessionEvent::AgentRequested);
        (state, events)
    }

    fn handle_greeting_due(
        mut state: SessionState,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        match state.escalation {
            EscalationState::AgentJoined { agent, greeted: false } => {
                let mut events = vec![];
                Self::agent_joins(&mut state, &mut events, agent, ctx);
                (state, events)
            }
            _ => (state, vec![]),
        }
    }

    fn handle_callback(
        mut state: SessionState,
        choice: CallbackChoice,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        if state.callback_offer != CallbackOffer::Shown {
            return (state, vec![]);
        }

        let confirmation = match choice {
            CallbackChoice::Instant => &ctx.config.scripts.instant_callback,
            CallbackChoice::Scheduled => &ctx.config.scripts.scheduled_callback,
        };
        let mut events = vec![];
        Self::append(
            &mut state,
            &mut events,
            &ctx.config.personas.agent.name,
            confirmation,
            Role::Agent,
            ctx,
        );
        state.callback_offer = CallbackOffer::Answered(choice);
        events.push(SessionEvent::CallbackChosen(choice));
        (state, events)
    }

    fn handle_record_audio(
        mut state: SessionState,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        let mut events = vec![];
        Self::append(
            &mut state,
            &mut events,
            AUDIO_SENDER,
            &ctx.config.scripts.audio_placeholder,
            Role::User,
            ctx,
        );
        let notice = ctx.config.scripts.audio_notice.clone();
        state.notice = Some(notice.clone());
        events.push(SessionEvent::NoticeRaised(notice));
        (state, events)
    }

    fn handle_set_language(
        mut state: SessionState,
        language: Language,
        ctx: &TransitionContext,
    ) -> (SessionState, Vec<SessionEvent>) {
        if state.language == language {
            return (state, vec![]);
        }

        state.language = language;
        state
            .conversation
            .reset(&ctx.config.personas.bot, &ctx.config.welcome(language), ctx.now);

        let welcome_id = state.conversation.last().map(|m| m.id).unwrap_or_default();
        (state, vec![
            SessionEvent::LanguageChanged(language),
            SessionEvent::MessageAppended { id: welcome_id, role: Role::Bot },
        ])
    }

    fn handle_toggle_calm(mut state: SessionState) -> (SessionState, Vec<SessionEvent>) {
        state.calm_mode = !state.calm_mode;
        let calm = state.calm_mode;
        (state, vec![SessionEvent::CalmModeChanged(calm)])
    }

    fn handle_dismiss_notice(mut state: SessionState) -> (SessionState, Vec<SessionEvent>) {
        match state.notice.take() {
            Some(_) => (state, vec![SessionEvent::NoticeDismissed]),
            None => (state, vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        config: SupportConfig,
        classifier: KeywordClassifier,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SupportConfig::builtin().unwrap();
            let classifier = KeywordClassifier::from_config(&config);
            Self { config, classifier }
        }

        fn ctx(&self) -> TransitionContext<'_> {
            TransitionContext {
                config: &self.config,
                classifier: &self.classifier,
                now: Local::now(),
                case_number: 4242,
            }
        }

        fn initial(&self) -> SessionState {
            SessionState::new("test-session".to_string(), &self.config, Local::now())
        }

        fn apply(&self, state: SessionState, intent: SessionIntent) -> (SessionState, Vec<SessionEvent>) {
            SessionStateMachine::transition(state, intent, &self.ctx())
        }

        fn apply_all(&self, mut state: SessionState, intents: Vec<SessionIntent>) -> SessionState {
            for intent in intents {
                state = self.apply(state, intent).0;
            }
            state
        }
    }

    fn ticks(epoch: u64, n: usize) -> Vec<SessionIntent> {
        (0..n).map(|_| SessionIntent::CountdownTick { epoch }).collect()
    }

    fn count_joins(events: &[SessionEvent]) -> usize {
        events.iter().filter(|e| matches!(e, SessionEvent::AgentJoined { .. })).count()
    }

    #[test]
    fn test_initial_state_has_welcome() {
        let f = Fixture::new();
        let state = f.initial();
        assert_eq!(state.conversation.messages().len(), 1);
        assert_eq!(state.escalation, EscalationState::Idle);
        assert_eq!(state.countdown_secs(), 0);
        assert_eq!(state.conversation.messages()[0].sender, "Bot");
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::SubmitText("   \t ".into()));
        assert!(events.is_empty());
        assert_eq!(state.conversation.messages().len(), 1);
    }

    #[test]
    fn test_normal_message_gets_acknowledged() {
        let f = Fixture::new();
        let (state, _) = f.apply(f.initial(), SessionIntent::SubmitText("hello".into()));

        let messages = state.conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, "You");
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].content, "Thank you for your message! 😊");
        assert_eq!(state.escalation, EscalationState::Idle);
    }

    #[test]
    fn test_high_risk_starts_two_minute_countdown() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::SubmitText("I was hacked".into()));

        assert_eq!(
            state.escalation,
            EscalationState::AutoEscalating { risk: RiskLevel::High, remaining_secs: 120 }
        );
        assert_eq!(state.case_number, Some(4242));
        assert!(events.contains(&SessionEvent::EscalationStarted {
            risk: RiskLevel::High,
            countdown_secs: 120,
            epoch: 1
        }));
        assert!(events.contains(&SessionEvent::CallbackOfferScheduled { epoch: 1 }));
        assert_eq!(state.conversation.last().unwrap().sender, "Security Bot");
    }

    #[test]
    fn test_emotional_starts_five_minute_countdown_without_offer() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::SubmitText("I'm so worried".into()));

        assert_eq!(state.countdown_secs(), 300);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::CallbackOfferScheduled { .. })));
    }

    #[test]
    fn test_countdown_to_zero_joins_exactly_once() {
        let f = Fixture::new();
        let mut state = f.apply(f.initial(), SessionIntent::SubmitText("fraud!".into())).0;

        let mut joins = 0;
        let mut stops = 0;
        for intent in ticks(1, 125) {
            let (next, events) = f.apply(state, intent);
            joins += count_joins(&events);
            stops += events.iter().filter(|e| **e == SessionEvent::CountdownStopped).count();
            state = next;
        }

        assert_eq!(joins, 1);
        assert_eq!(stops, 1);
        assert_eq!(state.countdown_secs(), 0);
        assert_eq!(
            state.escalation,
            EscalationState::AgentJoined { agent: AgentKind::Security, greeted: true }
        );
        assert_eq!(state.conversation.last().unwrap().sender, "Security Agent Mike");
    }

    #[test]
    fn test_emotional_origin_gets_regular_agent() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("I'm upset".into())).0;
        let state = f.apply_all(state, ticks(1, 300));

        let agent_line = state
            .conversation
            .messages()
            .iter()
            .find(|m| m.role == Role::Agent)
            .unwrap();
        assert_eq!(agent_line.sender, "Agent Sarah");
        assert_eq!(agent_line.content, "Hi Margaret, I'm here to help right away.");
    }

    #[test]
    fn test_cancel_returns_to_idle_and_never_joins() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("suspicious payment".into())).0;
        let state = f.apply_all(state, ticks(1, 10));
        let (state, events) = f.apply(state, SessionIntent::CancelEscalation);

        assert!(events.contains(&SessionEvent::CountdownStopped));
        assert_eq!(state.escalation, EscalationState::Idle);
        assert_eq!(state.countdown_secs(), 0);
        assert_eq!(state.case_number, None);
        assert_eq!(
            state.conversation.last().unwrap().content,
            "Escalation cancelled. How else can I help you?"
        );

        // Late ticks from the discarded countdown change nothing.
        let mut state = state;
        for intent in ticks(1, 200) {
            let (next, events) = f.apply(state, intent);
            assert!(events.is_empty());
            state = next;
        }
        assert_eq!(state.escalation, EscalationState::Idle);
    }

    #[test]
    fn test_cancel_outside_countdown_is_noop() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::CancelEscalation);
        assert!(events.is_empty());
        assert_eq!(state.conversation.messages().len(), 1);
    }

    #[test]
    fn test_stale_ticks_do_not_touch_new_countdown() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("scam".into())).0;
        let state = f.apply(state, SessionIntent::CancelEscalation).0;
        let state = f.apply(state, SessionIntent::SubmitText("scam again".into())).0;
        assert_eq!(state.escalation_epoch, 2);

        let state = f.apply_all(state, ticks(1, 5));
        assert_eq!(state.countdown_secs(), 120);
        let state = f.apply_all(state, ticks(2, 5));
        assert_eq!(state.countdown_secs(), 115);
    }

    #[test]
    fn test_manual_escalation_then_noop() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::RequestHuman);
        assert!(events.contains(&SessionEvent::AgentRequested));
        assert!(state.is_escalated());
        assert_eq!(
            state.conversation.last().unwrap().content,
            "Connecting you to a human agent… ⏳"
        );

        let (state, events) = f.apply(state, SessionIntent::AgentGreetingDue);
        assert_eq!(count_joins(&events), 1);
        assert_eq!(state.conversation.last().unwrap().sender, "Agent Sarah");
        let len = state.conversation.messages().len();

        let (state, events) = f.apply(state, SessionIntent::RequestHuman);
        assert!(events.is_empty());
        let (state, events) = f.apply(state, SessionIntent::AgentGreetingDue);
        assert!(events.is_empty());
        assert_eq!(state.conversation.messages().len(), len);
    }

    #[test]
    fn test_manual_escalation_ignored_during_countdown() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("I'm anxious".into())).0;
        let (state, events) = f.apply(state, SessionIntent::RequestHuman);
        assert!(events.is_empty());
        assert_eq!(state.countdown_secs(), 300);
    }

    #[test]
    fn test_callback_offer_flow() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("I was hacked".into())).0;

        // Nothing to answer before the offer appears.
        let (state, events) = f.apply(state, SessionIntent::InstantCallback);
        assert!(events.is_empty());

        let (state, events) = f.apply(state, SessionIntent::CallbackOfferDue { epoch: 1 });
        assert!(events.contains(&SessionEvent::CallbackOfferShown));
        assert!(state.offer_visible());
        assert_eq!(
            state.conversation.last().unwrap().content,
            "Would you like an immediate callback while we prepare your case?"
        );

        let (state, events) = f.apply(state, SessionIntent::ScheduleCallback);
        assert!(events.contains(&SessionEvent::CallbackChosen(CallbackChoice::Scheduled)));
        assert_eq!(state.callback_offer, CallbackOffer::Answered(CallbackChoice::Scheduled));
        assert!(!state.offer_visible());

        // Mutually exclusive: the other choice is gone.
        let (state, events) = f.apply(state, SessionIntent::InstantCallback);
        assert!(events.is_empty());

        // An answered offer is not surfaced again when the agent joins.
        let state = f.apply_all(state, ticks(1, 120));
        assert!(state.is_escalated());
        assert!(!state.offer_visible());
    }

    #[test]
    fn test_offer_after_cancel_is_dropped() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("fraud".into())).0;
        let state = f.apply(state, SessionIntent::CancelEscalation).0;
        let (state, events) = f.apply(state, SessionIntent::CallbackOfferDue { epoch: 1 });
        assert!(events.is_empty());
        assert!(!state.offer_visible());
    }

    #[test]
    fn test_join_surfaces_offer() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("confused".into())).0;
        let state = f.apply_all(state, ticks(1, 300));
        assert!(state.offer_visible());

        let (state, _) = f.apply(state, SessionIntent::InstantCallback);
        assert_eq!(
            state.conversation.last().unwrap().content,
            "Great! We'll call you in the next few minutes. 📞"
        );
    }

    #[test]
    fn test_high_risk_upgrades_emotional_countdown() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("I'm stressed".into())).0;
        let (state, events) = f.apply(state, SessionIntent::SubmitText("my card was stolen".into()));

        assert_eq!(
            state.escalation,
            EscalationState::AutoEscalating { risk: RiskLevel::High, remaining_secs: 120 }
        );
        assert!(events.contains(&SessionEvent::CallbackOfferScheduled { epoch: 1 }));
    }

    #[test]
    fn test_risk_words_during_high_countdown_get_normal_reply() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("hacked".into())).0;
        let state = f.apply_all(state, ticks(1, 3));
        let (state, events) = f.apply(state, SessionIntent::SubmitText("it's urgent".into()));

        assert_eq!(state.countdown_secs(), 117);
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::EscalationStarted { .. })));
        assert_eq!(state.conversation.last().unwrap().content, "Thank you for your message! 😊");
    }

    #[test]
    fn test_glossary_command_is_not_classified() {
        let f = Fixture::new();
        let (state, _) = f.apply(f.initial(), SessionIntent::SubmitText("/define phishing".into()));
        assert_eq!(state.escalation, EscalationState::Idle);
        assert!(state.conversation.last().unwrap().content.starts_with("phishing: "));
    }

    #[test]
    fn test_language_change_resets_conversation() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("hello".into())).0;
        let last_id = state.conversation.last().unwrap().id;

        let (state, events) = f.apply(state, SessionIntent::SetLanguage(Language::Fr));
        assert!(events.contains(&SessionEvent::LanguageChanged(Language::Fr)));
        assert_eq!(state.conversation.messages().len(), 1);
        let welcome = state.conversation.last().unwrap();
        assert!(welcome.id > last_id);
        assert!(welcome.content.starts_with("👋 Bonjour"));

        let (_, events) = f.apply(state, SessionIntent::SetLanguage(Language::Fr));
        assert!(events.is_empty());
    }

    #[test]
    fn test_toggles_do_not_affect_escalation() {
        let f = Fixture::new();
        let state = f.apply(f.initial(), SessionIntent::SubmitText("emergency".into())).0;
        let state = f.apply_all(
            state,
            vec![SessionIntent::ToggleCalmMode, SessionIntent::NextLanguage],
        );
        assert!(state.calm_mode);
        assert_eq!(state.language, Language::Ga);
        assert_eq!(state.countdown_secs(), 120);
    }

    #[test]
    fn test_record_audio_appends_placeholder() {
        let f = Fixture::new();
        let (state, events) = f.apply(f.initial(), SessionIntent::RecordAudio);
        let last = state.conversation.last().unwrap();
        assert_eq!(last.sender, "You (audio)");
        assert_eq!(last.content, "🎤 [Audio message sent]");
        assert_eq!(state.notice.as_deref(), Some("Audio recorded and sent (simulation)."));
        assert!(matches!(events.last(), Some(SessionEvent::NoticeRaised(_))));

        let (state, events) = f.apply(state, SessionIntent::DismissNotice);
        assert!(state.notice.is_none());
        assert_eq!(events, vec![SessionEvent::NoticeDismissed]);

        let (_, events) = f.apply(state, SessionIntent::DismissNotice);
        assert!(events.is_empty());
    }

    #[test]
    fn test_new_case_offers_callback_again() {
        let f = Fixture::new();
        let state = f.apply_all(
            f.initial(),
            vec![
                SessionIntent::SubmitText("I was hacked".into()),
                SessionIntent::CallbackOfferDue { epoch: 1 },
                SessionIntent::InstantCallback,
                SessionIntent::CancelEscalation,
            ],
        );
        assert_eq!(state.callback_offer, CallbackOffer::Answered(CallbackChoice::Instant));

        let (state, events) = f.apply(state, SessionIntent::SubmitText("fraud again".into()));
        assert_eq!(state.callback_offer, CallbackOffer::Hidden);
        assert!(events.contains(&SessionEvent::CallbackOfferScheduled { epoch: 2 }));

        let (state, _) = f.apply(state, SessionIntent::CallbackOfferDue { epoch: 2 });
        assert!(state.offer_visible());
    }
}
