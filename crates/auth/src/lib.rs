//! `yamdb-auth`: pure identity/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it owns the
//! role model, the permission evaluator, access-token claims and their codec,
//! confirmation codes, and the `User` entity's validation rules.

pub mod authorize;
pub mod claims;
pub mod confirmation;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, Capability, Decision, decide, evaluate};
pub use claims::{AccessClaims, TokenError, validate_claims};
pub use confirmation::{CodeDigest, ConfirmationCode};
pub use permissions::{Action, Resource, Scope};
pub use principal::{Actor, Principal};
pub use roles::Role;
pub use token::{Hs256TokenCodec, IssuedToken, TokenValidator};
pub use user::{AdminUpdate, Email, NewUser, ProfileUpdate, User, Username};
