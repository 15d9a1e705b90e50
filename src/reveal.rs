//! Timed, word-by-word reveal of rendered markup.
//!
//! The markup is split on single spaces and every token is delivered, with a
//! trailing space, at `delay * index` after the call to
//! [`RevealScheduler::schedule`].  Deadlines are absolute rather than chained,
//! so a slow consumer does not stretch the animation.  Splitting happens
//! after markup conversion, which means a bold run spanning several words is
//! delivered across several tokens.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::observability::{REVEAL_CANCELLATIONS, REVEAL_TOKENS};

/// Delay between consecutive tokens.
pub const DEFAULT_TOKEN_DELAY: Duration = Duration::from_millis(75);

/// Splits markup into reveal tokens.
///
/// Only the ASCII space separates tokens; empty tokens are kept so that the
/// reassembled text preserves runs of spaces.
pub fn tokenize(markup: &str) -> Vec<String> {
    markup.split(' ').map(str::to_string).collect()
}

/// Progress of one reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    tokens: Vec<String>,
    next_index: usize,
    accumulated: String,
}

impl RevealState {
    /// Starts a reveal of `markup` with nothing displayed yet.
    pub fn new(markup: &str) -> Self {
        Self {
            tokens: tokenize(markup),
            next_index: 0,
            accumulated: String::new(),
        }
    }

    /// A reveal that is already complete and displays `text` verbatim.
    pub fn settled(text: impl Into<String>) -> Self {
        Self {
            tokens: Vec::new(),
            next_index: 0,
            accumulated: text.into(),
        }
    }

    /// Appends every token up to and including `index`, in order.
    ///
    /// Returns the pieces appended, each token followed by a space.  Indices
    /// that were already appended yield nothing, so deliveries that fire out
    /// of order still build the markup front to back.
    pub fn advance_to(&mut self, index: usize) -> Vec<String> {
        let end = (index + 1).min(self.tokens.len());
        let mut pieces = Vec::new();
        while self.next_index < end {
            let piece = format!("{} ", self.tokens[self.next_index]);
            self.accumulated.push_str(&piece);
            self.next_index += 1;
            pieces.push(piece);
        }
        pieces
    }

    /// Appends every remaining token.
    pub fn advance_to_end(&mut self) -> Vec<String> {
        match self.tokens.len() {
            0 => Vec::new(),
            len => self.advance_to(len - 1),
        }
    }

    /// Markup displayed so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// True when there is nothing left to append.
    pub fn is_complete(&self) -> bool {
        self.next_index >= self.tokens.len()
    }
}

/// Schedules token deliveries on the tokio runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealScheduler {
    delay: Duration,
}

impl RevealScheduler {
    /// Creates a scheduler with the given per-token delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Schedules every token of `markup` for delivery to `on_append`.
    ///
    /// Each token is its own task and is delivered with its index.  Tasks
    /// whose deadlines pass together may fire in any order on a
    /// multi-threaded runtime, so consumers order by index.  Must be called
    /// from within a tokio runtime.
    pub fn schedule<F>(&self, markup: &str, on_append: F) -> RevealHandle
    where
        F: Fn(usize, String) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let on_append = Arc::new(on_append);
        let cancel = CancellationToken::new();
        let tokens = tokenize(markup);
        let token_count = tokens.len();
        let mut tasks = Vec::with_capacity(token_count);
        for (index, token) in tokens.into_iter().enumerate() {
            let deadline = start + self.delay * index as u32;
            let piece = token + " ";
            let on_append = Arc::clone(&on_append);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = time::sleep_until(deadline) => {
                        REVEAL_TOKENS.click();
                        on_append(index, piece);
                    }
                }
            }));
        }
        RevealHandle {
            cancel,
            tasks,
            token_count,
        }
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_DELAY)
    }
}

/// Outstanding deliveries of one [`RevealScheduler::schedule`] call.
///
/// Dropping the handle does not stop the deliveries; call
/// [`RevealHandle::cancel`] for that.
#[derive(Debug)]
pub struct RevealHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    token_count: usize,
}

impl RevealHandle {
    /// Number of tokens scheduled.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Stops every delivery that has not fired yet.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() && !self.is_finished() {
            REVEAL_CANCELLATIONS.click();
        }
        self.cancel.cancel();
    }

    /// True when every delivery has fired or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Waits for every delivery to fire or be cancelled.
    pub async fn finished(self) {
        for result in join_all(self.tasks).await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "reveal delivery task failed");
            }
        }
    }
}
