use crate::chat::{SessionHandle, SessionState, SupportSession};
use crate::config::SupportConfig;
use crate::event::{AppEvent, Event, EventHandler};
use crate::{log_error, log_info};
use color_eyre::Result;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub running: bool,
    pub config: Arc<SupportConfig>,
    /// Front end of the support session actor
    pub session: SessionHandle,
    session_task: Option<JoinHandle<()>>,
    state_rx: watch::Receiver<SessionState>,
    /// Last state published by the session; everything drawn comes from here
    pub snapshot: SessionState,
    /// Text typed but not yet sent
    pub input: String,
    /// Lines scrolled up from the bottom of the transcript (0 = live)
    pub scroll_offset: usize,
    /// Blink phase of the countdown indicator
    pub pulse: bool,
    /// Event handler.
    pub events: EventHandler,
}

impl App {
    /// Constructs a new instance of [`App`] and starts its support session.
    pub async fn new(config: Arc<SupportConfig>) -> Result<Self> {
        let (session, session_task) = SupportSession::spawn(config.clone());
        let state_rx = session.subscribe();
        let snapshot = session.snapshot();
        log_info!("App started with language {}", snapshot.language.code());

        Ok(Self {
            running: true,
            config,
            session,
            session_task: Some(session_task),
            state_rx,
            snapshot,
            input: String::new(),
            scroll_offset: 0,
            pulse: false,
            events: EventHandler::new(),
        })
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut needs_redraw = true;

        while self.running {
            if needs_redraw {
                terminal.draw(|frame| frame.render_widget(&self, frame.area()))?;
                needs_redraw = false;
            }

            tokio::select! {
                event = self.events.next() => {
                    match event? {
                        Event::Tick => {
                            if self.snapshot.countdown_secs() > 0 {
                                self.pulse = !self.pulse;
                                needs_redraw = true;
                            }
                        }
                        Event::Crossterm(event) => match event {
                            CrosstermEvent::Key(key_event)
                                if key_event.kind == KeyEventKind::Press =>
                            {
                                self.handle_key_events(key_event);
                            }
                            CrosstermEvent::Resize(_, _) => needs_redraw = true,
                            _ => {}
                        },
                        Event::App(app_event) => {
                            self.handle_app_event(app_event)?;
                            needs_redraw = true;
                        }
                    }
                }
                changed = self.state_rx.changed() => {
                    if changed.is_err() {
                        log_error!("Support session ended unexpectedly");
                        self.quit();
                    } else {
                        let snapshot = self.state_rx.borrow_and_update().clone();
                        self.apply_snapshot(snapshot);
                        needs_redraw = true;
                    }
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Handles the key events and queues the matching [`AppEvent`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) {
        if let Some(app_event) = key_to_event(key_event) {
            self.events.send(app_event);
        }
    }

    pub fn handle_app_event(&mut self, app_event: AppEvent) -> Result<()> {
        match app_event {
            AppEvent::Quit => self.quit(),
            AppEvent::InputChar(ch) => {
                if self.snapshot.notice.is_some() {
                    self.session.dismiss_notice()?;
                }
                self.input.push(ch);
            }
            AppEvent::InputBackspace => {
                self.input.pop();
            }
            AppEvent::Submit => self.submit()?,
            AppEvent::ScrollUp => self.scroll_offset = self.scroll_offset.saturating_add(1),
            AppEvent::ScrollDown => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            AppEvent::RequestHuman => self.session.request_human()?,
            AppEvent::CancelEscalation => self.session.cancel_escalation()?,
            AppEvent::InstantCallback => self.session.instant_callback()?,
            AppEvent::ScheduleCallback => self.session.schedule_callback()?,
            AppEvent::RecordAudio => self.session.record_audio()?,
            AppEvent::NextLanguage => self.session.next_language()?,
            AppEvent::ToggleCalmMode => self.session.toggle_calm_mode()?,
        }
        Ok(())
    }

    /// Sends the input line; blank lines are left for the session to ignore.
    pub fn submit(&mut self) -> Result<()> {
        let text = std::mem::take(&mut self.input);
        self.session.submit(text)?;
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: SessionState) {
        // Jump back to the live end when something new arrives.
        if snapshot.conversation.last().map(|m| m.id) != self.snapshot.conversation.last().map(|m| m.id) {
            self.scroll_offset = 0;
        }
        self.snapshot = snapshot;
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    async fn shutdown(&mut self) {
        let _ = self.session.shutdown();
        if let Some(task) = self.session_task.take() {
            if let Err(e) = task.await {
                log_error!("Support session task failed: {}", e);
            }
        }
    }
}

/// Key bindings of the support screen.
pub fn key_to_event(key_event: KeyEvent) -> Option<AppEvent> {
    match key_event.code {
        KeyCode::Esc => Some(AppEvent::Quit),
        KeyCode::Char('c' | 'C') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppEvent::Quit)
        }
        KeyCode::Enter => Some(AppEvent::Submit),
        KeyCode::Backspace => Some(AppEvent::InputBackspace),
        KeyCode::PageUp | KeyCode::Up => Some(AppEvent::ScrollUp),
        KeyCode::PageDown | KeyCode::Down => Some(AppEvent::ScrollDown),
        KeyCode::F(2) => Some(AppEvent::NextLanguage),
        KeyCode::F(3) => Some(AppEvent::ToggleCalmMode),
        KeyCode::F(5) => Some(AppEvent::RequestHuman),
        KeyCode::F(6) => Some(AppEvent::CancelEscalation),
        KeyCode::F(7) => Some(AppEvent::InstantCallback),
        KeyCode::F(8) => Some(AppEvent::ScheduleCallback),
        KeyCode::F(9) => Some(AppEvent::RecordAudio),
        KeyCode::Char(ch) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppEvent::InputChar(ch))
        }
        _ => None,
    }
}
