use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatterbox.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("chatterbox.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatterbox.client.request_duration_seconds");

pub(crate) static CONTROLLER_OPERATIONS: Counter =
    Counter::new("chatterbox.controller.operations");
pub(crate) static CONTROLLER_ERRORS: Counter = Counter::new("chatterbox.controller.errors");
pub(crate) static OPTIMISTIC_ROLLBACKS: Counter =
    Counter::new("chatterbox.controller.optimistic_rollbacks");
pub(crate) static STARTUP_FALLBACKS: Counter =
    Counter::new("chatterbox.controller.startup_fallbacks");
pub(crate) static STORE_ERRORS: Counter = Counter::new("chatterbox.store.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CONTROLLER_OPERATIONS);
    collector.register_counter(&CONTROLLER_ERRORS);
    collector.register_counter(&OPTIMISTIC_ROLLBACKS);
    collector.register_counter(&STARTUP_FALLBACKS);
    collector.register_counter(&STORE_ERRORS);
}
