//! Authentication service
//!
//! Admins and interns log in with email and password and receive an opaque
//! session token. The token resolves back to an [`Actor`] on every request.

use crate::config::AuthConfig;
use crate::db::repositories::{AdminRepository, InternRepository, SessionRepository};
use crate::models::{Admin, CreateAdminInput, Intern, Participant, Session};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::PortalError;

pub const MIN_PASSWORD_LEN: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub enum Actor {
    Admin(Admin),
    Intern(Intern),
}

impl Actor {
    pub fn participant(&self) -> Participant {
        match self {
            Actor::Admin(a) => Participant::Admin(a.id),
            Actor::Intern(i) => Participant::Intern(i.id),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Actor::Admin(a) => &a.name,
            Actor::Intern(i) => &i.name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    pub fn intern_id(&self) -> Option<i64> {
        match self {
            Actor::Intern(i) => Some(i.id),
            Actor::Admin(_) => None,
        }
    }

    pub fn require_admin(&self) -> Result<(), PortalError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(PortalError::forbidden("Admin access required"))
        }
    }

    /// The caller's intern record, or `Forbidden` for admins
    pub fn require_intern(&self) -> Result<&Intern, PortalError> {
        match self {
            Actor::Intern(i) => Ok(i),
            Actor::Admin(_) => Err(PortalError::forbidden("Intern access required")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub principal: Participant,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    admin_repo: Arc<dyn AdminRepository>,
    intern_repo: Arc<dyn InternRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_hours: i64,
}

impl AuthService {
    pub fn new(
        admin_repo: Arc<dyn AdminRepository>,
        intern_repo: Arc<dyn InternRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_hours: i64,
    ) -> Self {
        Self {
            admin_repo,
            intern_repo,
            session_repo,
            session_hours,
        }
    }

    pub async fn login_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResult, AuthServiceError> {
        let admin = self
            .admin_repo
            .get_by_email(email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password, &admin.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        tracing::info!("Admin {} logged in", admin.id);
        self.start_session(Participant::Admin(admin.id), admin.name)
            .await
    }

    pub async fn login_intern(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResult, AuthServiceError> {
        let intern = self
            .intern_repo
            .get_by_email(email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(password, &intern.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }
        // Checked after the password so status is not leaked to guessers
        if !intern.is_active() {
            return Err(AuthServiceError::AccountInactive);
        }

        tracing::info!("Intern {} logged in", intern.id);
        self.start_session(Participant::Intern(intern.id), intern.name)
            .await
    }

    async fn start_session(
        &self,
        principal: Participant,
        name: String,
    ) -> Result<LoginResult, AuthServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            principal,
            expires_at: now + Duration::hours(self.session_hours),
            created_at: now,
        };
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(LoginResult {
            token: session.id,
            principal,
            name,
            expires_at: session.expires_at,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.session_repo.delete(token).await?;
        Ok(())
    }

    /// Resolve a session token to its actor.
    ///
    /// Expired sessions are deleted. A session whose account has gone away,
    /// or whose intern was deactivated, is rejected.
    pub async fn current(&self, token: &str) -> Result<Actor, AuthServiceError> {
        let session = self
            .session_repo
            .get_by_id(token)
            .await?
            .ok_or(AuthServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Err(AuthServiceError::SessionExpired);
        }

        match session.principal {
            Participant::Admin(id) => self
                .admin_repo
                .get_by_id(id)
                .await?
                .map(Actor::Admin)
                .ok_or(AuthServiceError::SessionNotFound),
            Participant::Intern(id) => {
                let intern = self
                    .intern_repo
                    .get_by_id(id)
                    .await?
                    .ok_or(AuthServiceError::SessionNotFound)?;
                if !intern.is_active() {
                    return Err(AuthServiceError::AccountInactive);
                }
                Ok(Actor::Intern(intern))
            }
            Participant::AdminTeam => Err(AuthServiceError::SessionNotFound),
        }
    }

    pub async fn change_password(
        &self,
        actor: &Actor,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let stored_hash = match actor {
            Actor::Admin(a) => &a.password_hash,
            Actor::Intern(i) => &i.password_hash,
        };
        if !verify_password(current_password, stored_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let hash = hash_password(new_password)?;
        match actor {
            Actor::Admin(a) => self.admin_repo.update_password(a.id, &hash).await?,
            Actor::Intern(i) => self.intern_repo.update_password(i.id, &hash).await?,
        };

        tracing::info!("Password changed for {}", actor.participant());
        Ok(())
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>, AuthServiceError> {
        Ok(self.admin_repo.list().await?)
    }

    pub async fn create_admin(&self, input: CreateAdminInput) -> Result<Admin, AuthServiceError> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Name and email are required".to_string(),
            ));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.admin_repo.get_by_email(email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken(email.to_string()));
        }

        let admin = Admin {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(&input.password)?,
            created_at: Utc::now(),
        };
        let admin = self.admin_repo.create(&admin).await?;
        tracing::info!("Created admin {} ({})", admin.id, admin.email);
        Ok(admin)
    }

    /// Create the first admin from configuration when the table is empty.
    pub async fn bootstrap_admin(
        &self,
        config: &AuthConfig,
    ) -> Result<Option<Admin>, AuthServiceError> {
        let (Some(email), Some(password)) = (
            config.bootstrap_admin_email.as_deref(),
            config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(None);
        };

        if self.admin_repo.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_admin(CreateAdminInput {
                name: config.bootstrap_admin_name.clone(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        tracing::info!("Bootstrapped admin account {}", admin.email);
        Ok(Some(admin))
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthServiceError> {
        let removed = self.session_repo.delete_expired().await?;
        if removed > 0 {
            tracing::debug!("Removed {} expired sessions", removed);
        }
        Ok(removed)
    }

    /// End every session of a principal, e.g. after deactivation
    pub async fn revoke_sessions(&self, principal: Participant) -> Result<(), AuthServiceError> {
        self.session_repo.delete_by_principal(principal).await?;
        Ok(())
    }
}
