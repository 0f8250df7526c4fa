//! Identity Registry: user records, signup and account administration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use yamdb_auth::{AdminUpdate, Email, NewUser, ProfileUpdate, Role, User, Username};
use yamdb_core::UserId;

use crate::error::{ServiceError, ServiceResult};
use crate::issuer::ConfirmationIssuer;
use crate::store::{SignupOutcome, Store, StoreError};

#[derive(Clone)]
pub struct IdentityRegistry {
    store: Arc<dyn Store>,
    issuer: ConfirmationIssuer,
}

impl IdentityRegistry {
    pub fn new(store: Arc<dyn Store>, issuer: ConfirmationIssuer) -> Self {
        Self { store, issuer }
    }

    pub async fn find_by_username(&self, username: &Username) -> ServiceResult<Option<User>> {
        Ok(self.store.find_by_username(username).await?)
    }

    pub async fn find_by_email(&self, email: &Email) -> ServiceResult<Option<User>> {
        Ok(self.store.find_by_email(email).await?)
    }

    /// Parse raw signup input, then create or refresh the identity.
    pub async fn signup(&self, username: &str, email: &str, now: DateTime<Utc>) -> ServiceResult<User> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        self.create_or_refresh(username, email, None, now).await
    }

    /// Create the identity, or re-issue its code if the exact pair exists.
    ///
    /// `role` applies only when a new record is created; refreshing an
    /// existing identity never touches its role.
    pub async fn create_or_refresh(
        &self,
        username: Username,
        email: Email,
        role: Option<Role>,
        now: DateTime<Utc>,
    ) -> ServiceResult<User> {
        let mut candidate = User::register(username, email, now);
        if let Some(role) = role {
            candidate.role = role;
        }

        let code = self.issuer.issue();
        match self.store.signup(candidate, code.digest()).await? {
            SignupOutcome::Created(user) => {
                info!(user_id = %user.id, username = %user.username, "signup created identity");
                self.issuer.dispatch(&user, code);
                Ok(user)
            }
            SignupOutcome::Refreshed(user) => {
                info!(user_id = %user.id, username = %user.username, "signup re-issued confirmation code");
                self.issuer.dispatch(&user, code);
                Ok(user)
            }
            SignupOutcome::Conflict(kind) => {
                info!(field = %kind, "signup rejected by uniqueness");
                Err(ServiceError::Conflict(kind))
            }
        }
    }

    pub async fn profile(&self, id: UserId) -> ServiceResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// Self-service update. Role is not part of `ProfileUpdate`.
    pub async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> ServiceResult<User> {
        update.validate()?;
        match self.store.update_profile(id, update).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(ServiceError::NotFound("user")),
            Err(other) => Err(other.into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn list(&self, search: Option<&str>) -> ServiceResult<Vec<User>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.store.list_users(search).await?)
    }

    pub async fn get(&self, username: &Username) -> ServiceResult<User> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn create(&self, new: NewUser, now: DateTime<Utc>) -> ServiceResult<User> {
        new.validate()?;
        let user = User::from_new(new, now);
        self.store.insert_user(user.clone()).await?;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "user created by admin");
        Ok(user)
    }

    pub async fn admin_update(&self, username: &Username, update: &AdminUpdate) -> ServiceResult<User> {
        update.profile.validate()?;
        let id = self.get(username).await?.id;
        let (user, previous_role) = match self.store.admin_update(id, update).await {
            Ok(updated) => updated,
            Err(StoreError::NotFound) => return Err(ServiceError::NotFound("user")),
            Err(other) => return Err(other.into()),
        };
        if user.role != previous_role {
            // Outstanding tokens keep the old role until they expire.
            info!(user_id = %user.id, from = %previous_role, to = %user.role, "role changed");
        }
        Ok(user)
    }

    /// Users are never hard-deleted; this clears `is_active`.
    pub async fn deactivate(&self, username: &Username) -> ServiceResult<()> {
        let user = self.get(username).await?;
        if !self.store.set_active(user.id, false).await? {
            return Ok(());
        }
        info!(user_id = %user.id, username = %user.username, "user deactivated");
        Ok(())
    }

    /// Make sure a superuser with this username exists and is active.
    pub async fn ensure_superuser(
        &self,
        username: Username,
        email: Email,
        now: DateTime<Utc>,
    ) -> ServiceResult<User> {
        if let Some(existing) = self.store.find_by_username(&username).await? {
            if existing.email != email {
                warn!(username = %username, "superuser exists with a different email; keeping the stored one");
            }
            let user = self.store.promote_superuser(existing.id).await?;
            info!(user_id = %user.id, "superuser promoted");
            return Ok(user);
        }

        let user = User {
            role: Role::Admin,
            is_staff: true,
            is_superuser: true,
            ..User::register(username, email, now)
        };
        self.store.insert_user(user.clone()).await?;
        info!(user_id = %user.id, username = %user.username, "superuser created");
        Ok(user)
    }
}
