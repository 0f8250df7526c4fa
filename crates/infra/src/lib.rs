//! Storage adapters and the services built on them.
//!
//! Domain crates stay free of IO; everything here talks to a `Store` and is
//! driven by the HTTP layer.

pub mod catalog;
pub mod comments;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod ledger;
pub mod notifier;
pub mod services;
pub mod store;
pub mod tokens;

pub use catalog::{Catalog, RatedTitle};
pub use comments::CommentBook;
pub use error::{ServiceError, ServiceResult};
pub use identity::IdentityRegistry;
pub use issuer::ConfirmationIssuer;
pub use ledger::ReviewLedger;
pub use notifier::{CodeDelivery, InMemoryOutbox, Notifier, TracingNotifier};
pub use services::Services;
pub use store::{
    CatalogStore, CommentStore, Constraint, InMemoryStore, PostgresStore, ReviewStore,
    SignupOutcome, Store, StoreError, StoreResult, UserStore,
};
pub use tokens::TokenService;
