// src/chat/session.rs

use chrono::Local;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use super::classifier::KeywordClassifier;
use super::language::Language;
use super::state::{
    SessionEvent, SessionIntent, SessionState, SessionStateMachine, TransitionContext,
};
use crate::config::SupportConfig;
use crate::error::{Result, SupportError};
use crate::{log_debug, log_info};

/// Timer tasks owned by one session. Every handle is aborted on drop.
#[derive(Debug, Default)]
struct SessionTimers {
    countdown: Option<JoinHandle<()>>,
    callback_offer: Option<JoinHandle<()>>,
    agent_greeting: Option<JoinHandle<()>>,
}

impl SessionTimers {
    fn replace(slot: &mut Option<JoinHandle<()>>, task: JoinHandle<()>) {
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    fn stop(slot: &mut Option<JoinHandle<()>>) {
        if let Some(task) = slot.take() {
            task.abort();
        }
    }

    fn abort_all(&mut self) {
        Self::stop(&mut self.countdown);
        Self::stop(&mut self.callback_offer);
        Self::stop(&mut self.agent_greeting);
    }

    fn countdown_running(&self) -> bool {
        self.countdown.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Owns the session state and every scheduled task; processes intents one at a time.
pub struct SupportSession {
    state: SessionState,
    config: Arc<SupportConfig>,
    classifier: KeywordClassifier,
    intent_rx: mpsc::UnboundedReceiver<SessionIntent>,
    // Weak so the session ends once every handle is dropped.
    intent_tx: mpsc::WeakUnboundedSender<SessionIntent>,
    state_tx: watch::Sender<SessionState>,
    timers: SessionTimers,
}

/// Cloneable front end used by the UI (and tests) to drive a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    intent_tx: mpsc::UnboundedSender<SessionIntent>,
    state_rx: watch::Receiver<SessionState>,
}

impl SupportSession {
    pub fn new(config: Arc<SupportConfig>) -> (Self, SessionHandle) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let session_id = uuid::Uuid::new_v4().to_string();
        let state = SessionState::new(session_id, &config, Local::now());
        let (state_tx, state_rx) = watch::channel(state.clone());

        let session = Self {
            state,
            classifier: KeywordClassifier::from_config(&config),
            config,
            intent_rx,
            intent_tx: intent_tx.downgrade(),
            state_tx,
            timers: SessionTimers::default(),
        };

        (session, SessionHandle { intent_tx, state_rx })
    }

    /// Spawn the session onto the current tokio runtime.
    pub fn spawn(config: Arc<SupportConfig>) -> (SessionHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(config);
        let span = tracing::info_span!("support_session", id = %session.state.session_id);
        let task = tokio::spawn(session.run().instrument(span));
        (handle, task)
    }

    pub async fn run(mut self) {
        tracing::info!("session started");
        log_info!("Support session {} started", self.state.session_id);

        while let Some(intent) = self.intent_rx.recv().await {
            let closing = matches!(intent, SessionIntent::Shutdown);
            self.process_intent(intent);
            if closing {
                break;
            }
        }

        self.timers.abort_all();
        log_info!("Support session {} closed", self.state.session_id);
        tracing::info!("session closed");
    }

    fn process_intent(&mut self, intent: SessionIntent) {
        log_debug!("session intent: {:?}", intent);

        let ctx = TransitionContext {
            config: &self.config,
            classifier: &self.classifier,
            now: Local::now(),
            case_number: rand::thread_rng().gen_range(0..10000),
        };

        // Pure state transition
        let (new_state, events) =
            SessionStateMachine::transition(self.state.clone(), intent, &ctx);
        self.state = new_state;

        // Timers are the only side effects
        self.handle_side_effects(&events);

        for event in &events {
            if let Ok(payload) = serde_json::to_string(event) {
                log_debug!("session event: {}", payload);
            }
        }

        if !events.is_empty() {
            self.state_tx.send_replace(self.state.clone());
        }
    }

    fn handle_side_effects(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::EscalationStarted { risk, countdown_secs, epoch } => {
                    log_info!(
                        "Escalation started: risk={:?} countdown={}s case={:?}",
                        risk,
                        countdown_secs,
                        self.state.case_number
                    );
                    let task = self.spawn_countdown(*epoch);
                    SessionTimers::replace(&mut self.timers.countdown, task);
                }
                SessionEvent::CallbackOfferScheduled { epoch } => {
                    let task = self.spawn_delayed(
                        self.config.timing.callback_offer_delay(),
                        SessionIntent::CallbackOfferDue { epoch: *epoch },
                    );
                    SessionTimers::replace(&mut self.timers.callback_offer, task);
                }
                SessionEvent::CountdownStopped => {
                    SessionTimers::stop(&mut self.timers.countdown);
                }
                SessionEvent::EscalationCancelled => {
                    log_info!("Escalation cancelled by customer");
                    SessionTimers::stop(&mut self.timers.callback_offer);
                }
                SessionEvent::AgentRequested => {
                    log_info!("Customer asked for a human agent");
                    let task = self.spawn_delayed(
                        self.config.timing.manual_join_delay(),
                        SessionIntent::AgentGreetingDue,
                    );
                    SessionTimers::replace(&mut self.timers.agent_greeting, task);
                }
                SessionEvent::AgentJoined { agent } => {
                    log_info!("Agent joined: {:?}", agent);
                }
                SessionEvent::SessionClosed => {
                    self.timers.abort_all();
                }
                _ => {}
            }
        }
    }

    fn spawn_countdown(&self, epoch: u64) -> JoinHandle<()> {
        let intent_tx = self.intent_tx.clone();
        let period = self.config.timing.tick_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(tx) = intent_tx.upgrade() else { break };
                if tx.send(SessionIntent::CountdownTick { epoch }).is_err() {
                    break;
                }
            }
        })
    }

    fn spawn_delayed(&self, delay: Duration, intent: SessionIntent) -> JoinHandle<()> {
        let intent_tx = self.intent_tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = intent_tx.upgrade() {
                let _ = tx.send(intent);
            }
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn countdown_running(&self) -> bool {
        self.timers.countdown_running()
    }
}

impl SessionHandle {
    pub fn send(&self, intent: SessionIntent) -> Result<()> {
        self.intent_tx
            .send(intent)
            .map_err(|_| SupportError::SessionClosed)
    }

    pub fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.send(SessionIntent::SubmitText(text.into()))
    }

    pub fn request_human(&self) -> Result<()> {
        self.send(SessionIntent::RequestHuman)
    }

    pub fn cancel_escalation(&self) -> Result<()> {
        self.send(SessionIntent::CancelEscalation)
    }

    pub fn instant_callback(&self) -> Result<()> {
        self.send(SessionIntent::InstantCallback)
    }

    pub fn schedule_callback(&self) -> Result<()> {
        self.send(SessionIntent::ScheduleCallback)
    }

    pub fn record_audio(&self) -> Result<()> {
        self.send(SessionIntent::RecordAudio)
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.send(SessionIntent::SetLanguage(language))
    }

    pub fn next_language(&self) -> Result<()> {
        self.send(SessionIntent::NextLanguage)
    }

    pub fn toggle_calm_mode(&self) -> Result<()> {
        self.send(SessionIntent::ToggleCalmMode)
    }

    pub fn dismiss_notice(&self) -> Result<()> {
        self.send(SessionIntent::DismissNotice)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionIntent::Shutdown)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Waits until the session publishes a new state.
    pub async fn changed(&mut self) -> Result<()> {
        self.state_rx
            .changed()
            .await
            .map_err(|_| SupportError::SessionClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }
}
