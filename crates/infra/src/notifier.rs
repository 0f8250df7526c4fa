//! Out-of-band delivery of confirmation codes.
//!
//! Delivery is fire-and-forget: a notifier that fails logs and moves on, and
//! the caller's signup still succeeds. The user can always sign up again to
//! get a fresh code.

use std::collections::HashMap;
use std::sync::RwLock;

use yamdb_auth::{ConfirmationCode, Email, Username};

/// What a notifier is asked to deliver.
#[derive(Debug, Clone)]
pub struct CodeDelivery {
    pub username: Username,
    pub email: Email,
    pub code: ConfirmationCode,
}

pub trait Notifier: Send + Sync {
    fn deliver(&self, delivery: CodeDelivery);
}

/// Development notifier: writes the code to the log at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, delivery: CodeDelivery) {
        tracing::debug!(
            username = %delivery.username,
            email = %delivery.email,
            confirmation_code = delivery.code.as_str(),
            "confirmation code ready for delivery"
        );
    }
}

/// Keeps the latest code per username. Intended for tests.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    latest: RwLock<HashMap<String, CodeDelivery>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_code(&self, username: &str) -> Option<String> {
        self.latest
            .read()
            .ok()?
            .get(username)
            .map(|d| d.code.as_str().to_string())
    }

    pub fn delivered_to(&self, username: &str) -> Option<Email> {
        self.latest
            .read()
            .ok()?
            .get(username)
            .map(|d| d.email.clone())
    }
}

impl Notifier for InMemoryOutbox {
    fn deliver(&self, delivery: CodeDelivery) {
        match self.latest.write() {
            Ok(mut latest) => {
                latest.insert(delivery.username.to_string(), delivery);
            }
            Err(_) => tracing::warn!("outbox lock poisoned; delivery dropped"),
        }
    }
}
