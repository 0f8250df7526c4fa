use std::sync::Arc;

use yamdb_auth::{ConfirmationCode, User};

use crate::notifier::{CodeDelivery, Notifier};

/// Issues confirmation codes and hands them to the notifier.
///
/// The plaintext code never reaches storage; callers persist `code.digest()`
/// and dispatch only after the write succeeded.
#[derive(Clone)]
pub struct ConfirmationIssuer {
    notifier: Arc<dyn Notifier>,
}

impl ConfirmationIssuer {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn issue(&self) -> ConfirmationCode {
        ConfirmationCode::generate()
    }

    pub fn dispatch(&self, user: &User, code: ConfirmationCode) {
        self.notifier.deliver(CodeDelivery {
            username: user.username.clone(),
            email: user.email.clone(),
            code,
        });
    }
}
