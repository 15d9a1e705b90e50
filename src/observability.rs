use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatbox.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatbox.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatbox.client.request_duration_seconds");
pub(crate) static CLIENT_FALLBACKS: Counter = Counter::new("chatbox.client.fallbacks");

pub(crate) static CHAT_TURNS: Counter = Counter::new("chatbox.chat.turns");
pub(crate) static CHAT_IGNORED_SUBMITS: Counter = Counter::new("chatbox.chat.ignored_submits");
pub(crate) static CHAT_BUSY_REJECTIONS: Counter = Counter::new("chatbox.chat.busy_rejections");
pub(crate) static CHAT_TURN_FAILURES: Counter = Counter::new("chatbox.chat.turn_failures");
pub(crate) static CHAT_DISCARDED_RESPONSES: Counter =
    Counter::new("chatbox.chat.discarded_responses");

pub(crate) static REVEAL_TOKENS: Counter = Counter::new("chatbox.reveal.tokens");
pub(crate) static REVEAL_CANCELLATIONS: Counter = Counter::new("chatbox.reveal.cancellations");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENT_FALLBACKS);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_IGNORED_SUBMITS);
    collector.register_counter(&CHAT_BUSY_REJECTIONS);
    collector.register_counter(&CHAT_TURN_FAILURES);
    collector.register_counter(&CHAT_DISCARDED_RESPONSES);

    collector.register_counter(&REVEAL_TOKENS);
    collector.register_counter(&REVEAL_CANCELLATIONS);
}
