//! Token Service: confirmation code in, bearer token out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use yamdb_auth::{Hs256TokenCodec, IssuedToken, Username};

use crate::error::{ServiceError, ServiceResult};
use crate::store::Store;

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    codec: Arc<Hs256TokenCodec>,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>, codec: Arc<Hs256TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Exchange `(username, code)` for a token carrying the role held now.
    ///
    /// Unknown usernames are `NotFound`; every other failure is
    /// `InvalidCredentials`. A code mints at most one token.
    pub async fn exchange(
        &self,
        username: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<IssuedToken> {
        let username = Username::parse(username)?;
        if code.trim().is_empty() {
            return Err(ServiceError::Validation(
                "confirmation_code is required".to_string(),
            ));
        }

        let user = self
            .store
            .find_by_username(&username)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        let Some(digest) = user.confirmation.as_ref().filter(|d| d.matches(code)) else {
            warn!(username = %username, "token exchange rejected");
            return Err(ServiceError::InvalidCredentials);
        };
        if !user.is_active {
            warn!(user_id = %user.id, "token exchange for inactive user");
            return Err(ServiceError::InvalidCredentials);
        }
        if !self.store.consume_code(user.id, digest).await? {
            // A concurrent exchange or a newer signup won.
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self
            .codec
            .mint(&user.principal(), now)
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        info!(user_id = %user.id, role = %issued.claims.role, "access token issued");
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityRegistry;
    use crate::issuer::ConfirmationIssuer;
    use crate::notifier::InMemoryOutbox;
    use crate::store::InMemoryStore;
    use chrono::Duration;
    use yamdb_auth::{AdminUpdate, Role, TokenValidator};

    struct Fixture {
        registry: IdentityRegistry,
        tokens: TokenService,
        outbox: Arc<InMemoryOutbox>,
        codec: Arc<Hs256TokenCodec>,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let outbox = Arc::new(InMemoryOutbox::new());
        let codec = Arc::new(Hs256TokenCodec::new(b"test-secret", Duration::hours(1)));
        Fixture {
            registry: IdentityRegistry::new(store.clone(), ConfirmationIssuer::new(outbox.clone())),
            tokens: TokenService::new(store, codec.clone()),
            outbox,
            codec,
        }
    }

    #[tokio::test]
    async fn correct_code_mints_token_with_current_role() {
        let f = fixture();
        let now = Utc::now();
        let user = f.registry.signup("erin", "erin@example.com", now).await.unwrap();
        f.registry
            .admin_update(
                &user.username,
                &AdminUpdate {
                    role: Some(Role::Moderator),
                    ..AdminUpdate::default()
                },
            )
            .await
            .unwrap();

        let code = f.outbox.latest_code("erin").unwrap();
        let issued = f.tokens.exchange("erin", &code, now).await.unwrap();

        let claims = f.codec.validate(&issued.token, now).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Moderator);
    }

    #[tokio::test]
    async fn role_is_a_snapshot_at_exchange_time() {
        let f = fixture();
        let now = Utc::now();
        let user = f.registry.signup("fay", "fay@example.com", now).await.unwrap();
        let code = f.outbox.latest_code("fay").unwrap();
        let issued = f.tokens.exchange("fay", &code, now).await.unwrap();

        f.registry
            .admin_update(
                &user.username,
                &AdminUpdate {
                    role: Some(Role::Admin),
                    ..AdminUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(f.codec.validate(&issued.token, now).unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn wrong_code_is_invalid_credentials() {
        let f = fixture();
        let now = Utc::now();
        f.registry.signup("gus", "gus@example.com", now).await.unwrap();
        assert_eq!(
            f.tokens.exchange("gus", "not-the-code", now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.tokens.exchange("nobody", "abc", Utc::now()).await.unwrap_err(),
            ServiceError::NotFound("user")
        );
    }

    #[tokio::test]
    async fn reserved_username_is_rejected() {
        let f = fixture();
        assert!(matches!(
            f.tokens.exchange("me", "abc", Utc::now()).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn code_is_single_use_and_superseded_by_new_signup() {
        let f = fixture();
        let now = Utc::now();
        f.registry.signup("hal", "hal@example.com", now).await.unwrap();
        let old = f.outbox.latest_code("hal").unwrap();

        f.registry.signup("hal", "hal@example.com", now).await.unwrap();
        let new = f.outbox.latest_code("hal").unwrap();

        assert_eq!(
            f.tokens.exchange("hal", &old, now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
        f.tokens.exchange("hal", &new, now).await.unwrap();
        assert_eq!(
            f.tokens.exchange("hal", &new, now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn deactivated_user_cannot_exchange() {
        let f = fixture();
        let now = Utc::now();
        let user = f.registry.signup("ivy", "ivy@example.com", now).await.unwrap();
        f.registry.deactivate(&user.username).await.unwrap();
        let code = f.outbox.latest_code("ivy").unwrap();
        assert_eq!(
            f.tokens.exchange("ivy", &code, now).await.unwrap_err(),
            ServiceError::InvalidCredentials
        );
    }
}
