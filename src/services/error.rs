//! Error type shared by the portal's domain services

use super::email::EmailError;
use super::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PortalError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

/// Reject a value that is empty after trimming
pub fn require(value: &str, field: &str) -> Result<(), PortalError> {
    if value.trim().is_empty() {
        return Err(PortalError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Loose shape check: `local@domain.tld` with no whitespace
pub fn require_email(value: &str) -> Result<(), PortalError> {
    let value = value.trim();
    let valid = !value.chars().any(char::is_whitespace)
        && value
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            });
    if !valid {
        return Err(PortalError::validation(format!("Invalid email: {}", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("x", "Title").is_ok());
        let err = require("   ", "Title").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Title is required");
    }

    #[test]
    fn test_require_email() {
        assert!(require_email("r200123@rgukt.ac.in").is_ok());
        assert!(require_email(" a@b.co ").is_ok());
        assert!(require_email("no-at-sign.com").is_err());
        assert!(require_email("@rgukt.ac.in").is_err());
        assert!(require_email("a@localhost").is_err());
        assert!(require_email("a b@x.com").is_err());
        assert!(require_email("a@x.").is_err());
    }
}
