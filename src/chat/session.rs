//! Core chat session management.
//!
//! This module provides the `ChatSession` handle which owns the
//! conversation state: the input line, the active turn, the prompt history
//! and the reveal of the current answer.  The handle is cheap to clone and
//! every clone sees the same state; it is only mutated through
//! [`ChatSession::set_input`], [`ChatSession::submit`],
//! [`ChatSession::reset_turn`] and [`ChatSession::skip_reveal`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chat::config::ChatConfig;
use crate::error::Error;
use crate::markup::render_markup;
use crate::model_client::ModelClient;
use crate::observability::{
    CHAT_BUSY_REJECTIONS, CHAT_DISCARDED_RESPONSES, CHAT_IGNORED_SUBMITS, CHAT_TURN_FAILURES,
    CHAT_TURNS,
};
use crate::reveal::{RevealHandle, RevealScheduler, RevealState};

/// Shown when the turn itself fails, as opposed to the model call.
pub const LOCAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Identity of a turn.
///
/// Every submit and every reset allocates a fresh id, so work belonging to
/// an older turn can recognize that it is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of the active turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnStatus {
    /// No request in flight.
    #[default]
    Idle,

    /// Waiting for the model.
    Busy,

    /// The turn failed and shows the local error message.
    Error,
}

/// The active prompt/response exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    /// Identity of the turn.
    pub id: TurnId,
    /// The submitted prompt; empty after a reset.
    pub prompt: String,
    /// Model text as received.
    pub raw_response: Option<String>,
    /// Markup produced from the response.
    pub rendered_markup: String,
    /// Lifecycle state.
    pub status: TurnStatus,
}

/// Result of a call to [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The text was blank; nothing changed.
    Ignored,

    /// Another turn is still waiting for the model; nothing changed.
    Busy,

    /// The response arrived and its reveal has started.
    Completed(TurnId),

    /// The turn failed and shows [`LOCAL_ERROR_MESSAGE`].
    Failed(TurnId),

    /// The turn was reset or superseded before the response arrived.
    Discarded(TurnId),
}

/// Notifications about state changes, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A prompt was accepted and the model was called.
    TurnStarted {
        /// The new turn.
        turn: TurnId,
        /// The submitted prompt.
        prompt: String,
    },

    /// The model answered; loading is over and the reveal begins.
    ResponseReady {
        /// The turn.
        turn: TurnId,
        /// Number of tokens that will be revealed.
        tokens: usize,
    },

    /// A token was appended to the displayed markup.
    Appended {
        /// The turn.
        turn: TurnId,
        /// The token followed by a space.
        piece: String,
    },

    /// Every token of the turn has been appended.
    RevealFinished {
        /// The turn.
        turn: TurnId,
    },

    /// The turn failed.
    TurnFailed {
        /// The turn.
        turn: TurnId,
        /// The message now displayed.
        message: String,
    },

    /// The active turn was cleared.
    TurnReset {
        /// The empty turn that replaced it.
        turn: TurnId,
    },
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// Current input line.
    pub input: String,
    /// Prompt of the active turn.
    pub recent_prompt: String,
    /// Whether a turn is on display.
    pub show_result: bool,
    /// Whether the model call is in flight.
    pub loading: bool,
    /// Markup revealed so far.
    pub result_data: String,
    /// Every submitted prompt, oldest first.
    pub prev_prompts: Vec<String>,
}

struct SessionState {
    input: String,
    history: Vec<String>,
    turn: Turn,
    show_result: bool,
    reveal: RevealState,
    reveal_handle: Option<RevealHandle>,
    last_turn_id: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            input: String::new(),
            history: Vec::new(),
            turn: Turn::default(),
            show_result: false,
            reveal: RevealState::default(),
            reveal_handle: None,
            last_turn_id: 0,
        }
    }

    fn allocate_turn_id(&mut self) -> TurnId {
        self.last_turn_id += 1;
        TurnId(self.last_turn_id)
    }

    fn cancel_reveal(&mut self) {
        if let Some(handle) = self.reveal_handle.take() {
            handle.cancel();
        }
    }

    fn begin_turn(&mut self, prompt: &str) -> TurnId {
        self.cancel_reveal();
        self.history.push(prompt.to_string());
        let id = self.allocate_turn_id();
        self.turn = Turn {
            id,
            prompt: prompt.to_string(),
            raw_response: None,
            rendered_markup: String::new(),
            status: TurnStatus::Busy,
        };
        self.reveal = RevealState::default();
        self.show_result = true;
        self.input.clear();
        id
    }
}

struct Shared {
    state: Mutex<SessionState>,
    events: Option<mpsc::UnboundedSender<ChatEvent>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    /// Appends the tokens of `turn` up to `index`.
    ///
    /// Text comes from the turn's own reveal state, so a delivery that fires
    /// early catches up on the ones before it and a late one is a no-op.
    fn deliver(&self, turn: TurnId, index: usize) {
        let mut state = self.lock();
        if state.turn.id != turn || state.reveal.is_complete() {
            return;
        }
        let pieces = state.reveal.advance_to(index);
        self.emit_appended(turn, pieces, state.reveal.is_complete());
    }

    fn emit_appended(&self, turn: TurnId, pieces: Vec<String>, finished: bool) {
        for piece in pieces {
            self.emit(ChatEvent::Appended { turn, piece });
        }
        if finished {
            self.emit(ChatEvent::RevealFinished { turn });
        }
    }
}

/// A chat session that manages conversation state and model interactions.
///
/// Clones share state.  At most one turn waits for the model at a time.
pub struct ChatSession<C: ModelClient> {
    client: Arc<C>,
    config: Arc<ChatConfig>,
    scheduler: RevealScheduler,
    shared: Arc<Shared>,
}

impl<C: ModelClient> Clone for ChatSession<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
            scheduler: self.scheduler,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: ModelClient> ChatSession<C> {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: C, config: ChatConfig) -> Self {
        Self::build(client, config, None)
    }

    /// Creates a session that reports every state change on the returned
    /// channel.
    pub fn with_events(client: C, config: ChatConfig) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::build(client, config, Some(tx)), rx)
    }

    fn build(
        client: C,
        config: ChatConfig,
        events: Option<mpsc::UnboundedSender<ChatEvent>>,
    ) -> Self {
        let scheduler = RevealScheduler::new(config.reveal_delay);
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
            scheduler,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::new()),
                events,
            }),
        }
    }

    /// The session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The model client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Replaces the input line.
    pub fn set_input(&self, text: impl Into<String>) {
        self.shared.lock().input = text.into();
    }

    /// The input line.
    pub fn input(&self) -> String {
        self.shared.lock().input.clone()
    }

    /// Submits the current input line.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input();
        self.submit(&text).await
    }

    /// Submits the input line on a background task.
    ///
    /// Pass the handle to [`ChatSession::abandon`] to give up on the turn
    /// while it waits for the model.
    pub fn spawn_submit_input(&self) -> JoinHandle<SubmitOutcome>
    where
        C: 'static,
    {
        let session = self.clone();
        tokio::spawn(async move { session.submit_input().await })
    }

    /// Resets the turn and stops the background submit behind `pending`.
    ///
    /// The model call is dropped with the task, so a new submit never runs
    /// alongside it.
    pub fn abandon(&self, pending: &JoinHandle<SubmitOutcome>) {
        self.reset_turn();
        pending.abort();
    }

    /// Submits `text` as a new turn.
    ///
    /// Blank text is ignored and a submit while another turn is busy is
    /// rejected; neither changes any state.  Otherwise the prompt is added to
    /// the history before the model is called, and the session is idle again
    /// as soon as the model answers, while the reveal continues in the
    /// background.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            CHAT_IGNORED_SUBMITS.click();
            return SubmitOutcome::Ignored;
        }
        let turn = {
            let mut state = self.shared.lock();
            if state.turn.status == TurnStatus::Busy {
                CHAT_BUSY_REJECTIONS.click();
                tracing::debug!(active = %state.turn.id, "submit rejected while busy");
                return SubmitOutcome::Busy;
            }
            let turn = state.begin_turn(text);
            self.shared.emit(ChatEvent::TurnStarted {
                turn,
                prompt: text.to_string(),
            });
            turn
        };
        CHAT_TURNS.click();
        tracing::info!(%turn, "turn started");

        match self.client.send(text).await {
            Ok(raw) => self.complete_turn(turn, raw),
            Err(err) => self.fail_turn(turn, err),
        }
    }

    fn complete_turn(&self, turn: TurnId, raw: String) -> SubmitOutcome {
        let markup = render_markup(&raw, self.config.markup_policy);
        let mut state = self.shared.lock();
        if state.turn.id != turn {
            CHAT_DISCARDED_RESPONSES.click();
            tracing::debug!(%turn, active = %state.turn.id, "discarding stale response");
            return SubmitOutcome::Discarded(turn);
        }
        state.turn.raw_response = Some(raw);
        state.turn.rendered_markup = markup.clone();
        state.turn.status = TurnStatus::Idle;
        state.reveal = RevealState::new(&markup);

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = self.scheduler.schedule(&markup, move |index, _| {
            if let Some(shared) = shared.upgrade() {
                shared.deliver(turn, index);
            }
        });
        self.shared.emit(ChatEvent::ResponseReady {
            turn,
            tokens: handle.token_count(),
        });
        state.reveal_handle = Some(handle);
        tracing::info!(%turn, "response ready");
        SubmitOutcome::Completed(turn)
    }

    fn fail_turn(&self, turn: TurnId, err: Error) -> SubmitOutcome {
        CHAT_TURN_FAILURES.click();
        tracing::error!(%turn, error = %err, "turn failed");
        let mut state = self.shared.lock();
        if state.turn.id != turn {
            CHAT_DISCARDED_RESPONSES.click();
            return SubmitOutcome::Discarded(turn);
        }
        state.turn.rendered_markup = LOCAL_ERROR_MESSAGE.to_string();
        state.turn.status = TurnStatus::Error;
        state.reveal = RevealState::settled(LOCAL_ERROR_MESSAGE);
        self.shared.emit(ChatEvent::TurnFailed {
            turn,
            message: LOCAL_ERROR_MESSAGE.to_string(),
        });
        SubmitOutcome::Failed(turn)
    }

    /// Starts a new chat.
    ///
    /// Clears the active turn and the input line and stops its reveal.  The
    /// history is kept.  A response still in flight is dropped on arrival.
    pub fn reset_turn(&self) {
        let mut state = self.shared.lock();
        state.cancel_reveal();
        let id = state.allocate_turn_id();
        state.turn = Turn {
            id,
            ..Turn::default()
        };
        state.reveal = RevealState::default();
        state.show_result = false;
        state.input.clear();
        self.shared.emit(ChatEvent::TurnReset { turn: id });
        tracing::info!(turn = %id, "turn reset");
    }

    /// Stops the animation and appends every remaining token at once.
    ///
    /// Returns false when no reveal was in progress.
    pub fn skip_reveal(&self) -> bool {
        let mut state = self.shared.lock();
        let Some(handle) = state.reveal_handle.take() else {
            return false;
        };
        handle.cancel();
        if state.reveal.is_complete() {
            return false;
        }
        let turn = state.turn.id;
        let pieces = state.reveal.advance_to_end();
        self.shared.emit_appended(turn, pieces, true);
        true
    }

    /// True while tokens of the current turn are still scheduled.
    pub fn is_revealing(&self) -> bool {
        let state = self.shared.lock();
        state.reveal_handle.is_some() && !state.reveal.is_complete()
    }

    /// Every submitted prompt, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.shared.lock().history.clone()
    }

    /// Number of submitted prompts.
    pub fn history_len(&self) -> usize {
        self.shared.lock().history.len()
    }

    /// A copy of the active turn.
    pub fn turn(&self) -> Turn {
        self.shared.lock().turn.clone()
    }

    /// Lifecycle state of the active turn.
    pub fn status(&self) -> TurnStatus {
        self.shared.lock().turn.status
    }

    /// Markup revealed so far.
    pub fn result_data(&self) -> String {
        self.shared.lock().reveal.accumulated().to_string()
    }

    /// A consistent view of everything the presentation layer reads.
    pub fn snapshot(&self) -> ChatSnapshot {
        let state = self.shared.lock();
        ChatSnapshot {
            input: state.input.clone(),
            recent_prompt: state.turn.prompt.clone(),
            show_result: state.show_result,
            loading: state.turn.status == TurnStatus::Busy,
            result_data: state.reveal.accumulated().to_string(),
            prev_prompts: state.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::markup::MarkupPolicy;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Answers prompts from a script, in order.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for ScriptedClient {
        async fn send(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    /// Holds every call until released.
    struct GatedClient {
        gate: Arc<Notify>,
        reply: String,
    }

    #[async_trait::async_trait]
    impl ModelClient for GatedClient {
        async fn send(&self, _: &str) -> Result<String> {
            self.gate.notified().await;
            Ok(self.reply.clone())
        }
    }

    /// Never answers; counts calls that are still alive.
    struct StalledClient {
        in_flight: Arc<AtomicUsize>,
    }

    struct InFlight(Arc<AtomicUsize>);

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for StalledClient {
        async fn send(&self, _: &str) -> Result<String> {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let _call = InFlight(Arc::clone(&self.in_flight));
            std::future::pending().await
        }
    }

    fn session(replies: Vec<Result<String>>) -> ChatSession<ScriptedClient> {
        ChatSession::new(ScriptedClient::new(replies), ChatConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn blank_submits_are_ignored() {
        let session = session(vec![]);
        session.set_input("draft");
        assert_eq!(session.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(session.submit("   ").await, SubmitOutcome::Ignored);
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.turn(), Turn::default());
        assert_eq!(session.input(), "draft");
        assert!(session.client().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_records_prompt_once() {
        let session = session(vec![Ok("Hi".to_string())]);
        let outcome = session.submit("Hello").await;
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert_eq!(session.history(), vec!["Hello".to_string()]);
        assert_eq!(
            *session.client().prompts.lock().unwrap(),
            vec!["Hello".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_turn_still_recorded() {
        let session = session(vec![Err(Error::unknown("malformed"))]);
        let outcome = session.submit("Hello").await;
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(session.history(), vec!["Hello".to_string()]);
        assert_eq!(session.status(), TurnStatus::Error);
        assert_eq!(session.result_data(), LOCAL_ERROR_MESSAGE);
        assert_eq!(session.turn().rendered_markup, LOCAL_ERROR_MESSAGE);
        assert!(!session.snapshot().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_before_reveal_finishes() {
        let session = session(vec![Ok("Hi **there**".to_string())]);
        session.submit("Hello").await;
        assert_eq!(session.status(), TurnStatus::Idle);
        assert!(session.is_revealing());
        let turn = session.turn();
        assert_eq!(turn.raw_response.as_deref(), Some("Hi **there**"));
        assert_eq!(turn.rendered_markup, "Hi <b>there</b>");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(session.result_data(), "Hi ");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.result_data(), "Hi <b>there</b> ");
        assert!(!session.is_revealing());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_clears_input_and_shows_result() {
        let session = session(vec![Ok("ok".to_string())]);
        session.set_input("What now?");
        session.submit_input().await;
        let snapshot = session.snapshot();
        assert_eq!(snapshot.input, "");
        assert_eq!(snapshot.recent_prompt, "What now?");
        assert!(snapshot.show_result);
        assert_eq!(snapshot.prev_prompts, vec!["What now?".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_keeps_history() {
        let session = session(vec![Ok("one two three".to_string())]);
        session.submit("first").await;
        session.set_input("half typed");
        session.reset_turn();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.input, "");
        assert_eq!(snapshot.recent_prompt, "");
        assert_eq!(snapshot.result_data, "");
        assert!(!snapshot.show_result);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.prev_prompts, vec!["first".to_string()]);
        assert_eq!(session.turn().raw_response, None);

        // Nothing from the cancelled reveal shows up later.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.result_data(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn new_turn_cancels_previous_reveal() {
        let session = session(vec![
            Ok("a b c d e f".to_string()),
            Ok("x y".to_string()),
        ]);
        session.submit("first").await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.submit("second").await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(session.result_data(), "x y ");
        assert_eq!(session.history_len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_session_rejects_second_submit() {
        let gate = Arc::new(Notify::new());
        let session = ChatSession::new(
            GatedClient {
                gate: Arc::clone(&gate),
                reply: "done".to_string(),
            },
            ChatConfig::default(),
        );
        let background = session.clone();
        let first = tokio::spawn(async move { background.submit("first").await });
        while session.status() != TurnStatus::Busy {
            tokio::task::yield_now().await;
        }
        assert!(session.snapshot().loading);
        assert_eq!(session.submit("second").await, SubmitOutcome::Busy);
        assert_eq!(session.history(), vec!["first".to_string()]);

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            SubmitOutcome::Completed(_)
        ));
        assert_eq!(session.status(), TurnStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_busy_discards_response() {
        let gate = Arc::new(Notify::new());
        let session = ChatSession::new(
            GatedClient {
                gate: Arc::clone(&gate),
                reply: "late answer".to_string(),
            },
            ChatConfig::default(),
        );
        let background = session.clone();
        let first = tokio::spawn(async move { background.submit("first").await });
        while session.status() != TurnStatus::Busy {
            tokio::task::yield_now().await;
        }
        session.reset_turn();
        assert_eq!(session.status(), TurnStatus::Idle);

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            SubmitOutcome::Discarded(_)
        ));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.result_data(), "");
        assert_eq!(session.turn().prompt, "");
        assert_eq!(session.history_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_reveal_flushes_remaining_tokens() {
        let session = session(vec![Ok("one two three four".to_string())]);
        session.submit("go").await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.result_data(), "one ");
        assert!(session.skip_reveal());
        assert_eq!(session.result_data(), "one two three four ");
        assert!(!session.is_revealing());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(session.result_data(), "one two three four ");
        assert!(!session.skip_reveal());
    }

    #[tokio::test(start_paused = true)]
    async fn escaped_policy_applies_to_turns() {
        let session = session(vec![Ok("<i>x</i> **y**".to_string())]);
        session.submit("go").await;
        assert_eq!(
            session.turn().rendered_markup,
            "&lt;i&gt;x&lt;/i&gt; <b>y</b>"
        );

        let trusted = ChatSession::new(
            ScriptedClient::new(vec![Ok("<i>x</i>".to_string())]),
            ChatConfig::new().with_markup_policy(MarkupPolicy::Trusted),
        );
        trusted.submit("go").await;
        assert_eq!(trusted.turn().rendered_markup, "<i>x</i>");
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_the_turn() {
        let (session, mut events) = ChatSession::with_events(
            ScriptedClient::new(vec![Ok("Hi **there**".to_string())]),
            ChatConfig::default(),
        );
        let SubmitOutcome::Completed(turn) = session.submit("Hello").await else {
            panic!("turn should complete");
        };
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            let done = matches!(event, ChatEvent::RevealFinished { .. });
            seen.push(event);
            if done {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                ChatEvent::TurnStarted {
                    turn,
                    prompt: "Hello".to_string()
                },
                ChatEvent::ResponseReady { turn, tokens: 2 },
                ChatEvent::Appended {
                    turn,
                    piece: "Hi ".to_string()
                },
                ChatEvent::Appended {
                    turn,
                    piece: "<b>there</b> ".to_string()
                },
                ChatEvent::RevealFinished { turn },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn reveal_stays_ordered_when_deadlines_pile_up() {
        let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
        let reply = words.join(" ");
        let expected = format!("{reply} ");
        let (session, mut events) = ChatSession::with_events(
            ScriptedClient::new(vec![Ok(reply)]),
            ChatConfig::new().with_reveal_delay(Duration::from_millis(1)),
        );
        assert!(matches!(
            session.submit("go").await,
            SubmitOutcome::Completed(_)
        ));

        // Block every worker so all deadlines pass before any timer fires.
        let stalls: Vec<_> = (0..4)
            .map(|_| tokio::spawn(async { std::thread::sleep(Duration::from_millis(200)) }))
            .collect();
        for stall in stalls {
            stall.await.unwrap();
        }

        let mut shown = String::new();
        while let Some(event) = events.recv().await {
            match event {
                ChatEvent::Appended { piece, .. } => {
                    shown.push_str(&piece);
                    assert!(expected.starts_with(&shown), "out of order: {shown}");
                }
                ChatEvent::RevealFinished { .. } => break,
                _ => {}
            }
        }
        assert_eq!(shown, expected);
        assert_eq!(session.result_data(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_drops_the_model_call() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let session = ChatSession::new(
            StalledClient {
                in_flight: Arc::clone(&in_flight),
            },
            ChatConfig::default(),
        );
        session.set_input("first");
        let pending = session.spawn_submit_input();
        while session.status() != TurnStatus::Busy {
            tokio::task::yield_now().await;
        }
        assert_eq!(in_flight.load(Ordering::SeqCst), 1);

        session.abandon(&pending);
        assert!(pending.await.unwrap_err().is_cancelled());
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(session.status(), TurnStatus::Idle);
        assert_eq!(session.turn().prompt, "");
        assert_eq!(session.history(), vec!["first".to_string()]);
    }

    #[test]
    fn turn_ids_display() {
        assert_eq!(TurnId(7).to_string(), "#7");
        assert_eq!(TurnId::default().to_string(), "#0");
    }
}
