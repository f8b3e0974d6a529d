#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Notification system that surfaces rejected operations to the player.

use code_defence_core::{Event, MessageChannel};
use tracing::trace;

/// Pure system forwarding rejection messages to a message channel.
#[derive(Debug, Default)]
pub struct Notifier {
    delivered: u64,
}

impl Notifier {
    /// Creates a notifier that has not delivered anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { delivered: 0 }
    }

    /// Reports the player-facing text of every rejection in `events`.
    pub fn handle(&mut self, events: &[Event], channel: &mut dyn MessageChannel) {
        for event in events {
            if let Event::OperationRejected { reason } = event {
                let message = reason.to_string();
                trace!(%message, "delivering notification");
                channel.report(&message);
                self.delivered = self.delivered.saturating_add(1);
            }
        }
    }

    /// Number of messages delivered since creation.
    #[must_use]
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }
}
