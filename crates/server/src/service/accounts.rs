#![forbid(unsafe_code)]

use super::TaskService;
use crate::ServiceError;
use vt_core::{Principal, PrincipalId, Tier};
use vt_storage::{AdminGrant, NewUser, ProfileUpdate};

const MIN_ADMIN_PASSWORD_LEN: usize = 6;

/// Identity asserted by an external provider that already authenticated the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Operator-supplied credentials for `create-admin`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminAccount {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl TaskService {
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Principal, ServiceError> {
        let email = normalize_email(email)?;
        let user = NewUser {
            id: self.fresh_principal_id()?,
            email,
            name: name.trim().to_string(),
            picture: None,
            password_hash: Some(self.collaborators.hasher.hash(password)),
            tier: Tier::Free,
            grant: AdminGrant::FirstUserOnly,
            created_at_ms: self.now_ms(),
        };

        let principal = self.store().insert_user(user)?;
        tracing::info!(user_id = %principal.id, is_admin = principal.is_admin, "user registered");
        Ok(principal)
    }

    /// Credentials are checked before the blocked flag: a wrong password on a blocked account is
    /// `InvalidCredentials`.
    pub fn login(&self, email: &str, password: &str) -> Result<Principal, ServiceError> {
        let Ok(email) = normalize_email(email) else {
            return Err(ServiceError::InvalidCredentials);
        };
        let Some(principal) = self.store().find_user_by_email(&email)? else {
            return Err(ServiceError::InvalidCredentials);
        };
        let Some(stored) = principal.password_hash.as_deref() else {
            return Err(ServiceError::InvalidCredentials);
        };
        if !self.collaborators.hasher.verify(password, stored) {
            return Err(ServiceError::InvalidCredentials);
        }
        if principal.is_blocked {
            tracing::info!(user_id = %principal.id, "blocked user refused at login");
            return Err(ServiceError::Blocked);
        }
        Ok(principal)
    }

    /// Upserts an externally authenticated principal: matched by id first, then by email.
    /// A blocked match is refused without touching its profile.
    pub fn sync_external_identity(
        &self,
        identity: ExternalIdentity,
    ) -> Result<Principal, ServiceError> {
        let ExternalIdentity {
            id,
            email,
            name,
            picture,
        } = identity;
        let id = PrincipalId::try_new(id)
            .map_err(|_| ServiceError::InvalidInput("external id is not a valid principal id"))?;
        let email = normalize_email(&email)?;
        let name = name.trim().to_string();

        let mut store = self.store();
        let existing = match store.get_user(&id)? {
            Some(found) => Some(found),
            None => store.find_user_by_email(&email)?,
        };

        if let Some(existing) = existing {
            if existing.is_blocked {
                tracing::info!(user_id = %existing.id, "blocked user refused at sync");
                return Err(ServiceError::Blocked);
            }
            // An email claimed by another account stays with that account.
            let email_taken = store
                .find_user_by_email(&email)?
                .is_some_and(|owner| owner.id != existing.id);
            let email = if email_taken {
                tracing::info!(user_id = %existing.id, "sync kept stored email");
                existing.email
            } else {
                email
            };
            let updated = store.update_profile(
                &existing.id,
                ProfileUpdate {
                    email,
                    name,
                    picture,
                },
            )?;
            return Ok(updated);
        }

        let principal = store.insert_user(NewUser {
            id,
            email,
            name,
            picture,
            password_hash: None,
            tier: Tier::Free,
            grant: AdminGrant::FirstUserOnly,
            created_at_ms: self.now_ms(),
        })?;
        tracing::info!(
            user_id = %principal.id,
            is_admin = principal.is_admin,
            "external user created"
        );
        Ok(principal)
    }

    pub fn upgrade_tier(&self, principal_id: &PrincipalId) -> Result<Principal, ServiceError> {
        let principal = self.store().set_tier(principal_id, Tier::Pro)?;
        tracing::info!(user_id = %principal.id, "tier upgraded");
        Ok(principal)
    }

    /// Operator bootstrap: a pro-tier admin, regardless of how many users exist.
    pub fn create_admin(&self, account: AdminAccount) -> Result<Principal, ServiceError> {
        let AdminAccount {
            email,
            name,
            password,
        } = account;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput("name must not be empty"));
        }
        let email = normalize_email(&email)?;
        if password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
            return Err(ServiceError::InvalidInput(
                "password must be at least 6 characters",
            ));
        }

        let principal = self.store().insert_user(NewUser {
            id: self.fresh_principal_id()?,
            email,
            name,
            picture: None,
            password_hash: Some(self.collaborators.hasher.hash(&password)),
            tier: Tier::Pro,
            grant: AdminGrant::Operator,
            created_at_ms: self.now_ms(),
        })?;
        Ok(principal)
    }

    fn fresh_principal_id(&self) -> Result<PrincipalId, ServiceError> {
        PrincipalId::try_new(self.next_id())
            .map_err(|_| ServiceError::InvalidInput("id generator produced an invalid id"))
    }
}

fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ServiceError::InvalidInput("email must not be empty"));
    }
    Ok(email)
}
