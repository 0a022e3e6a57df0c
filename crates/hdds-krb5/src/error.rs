// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Authentication error types
//!
//! # Taxonomy
//!
//! | Kind | Variants | Surfaces as |
//! |------|----------|-------------|
//! | Configuration | `Config`, `LoginFailed` | logged, token stays unauthenticated |
//! | Transport | (`std::io::Error`) | propagated to the caller |
//! | Trust | `ValidationFailed`, `PrincipalMismatch`, `NotAuthenticated` | `authenticate() == false` |
//!
//! `ContextFailed` is the one provider failure that crosses into the transport
//! class: it is raised while serializing an outbound ticket and is converted
//! into an I/O error so the send attempt aborts.

use std::fmt;
use std::io;

/// Errors raised by the security context provider and the token configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Subject establishment failed (unknown principal, bad password, bad login config)
    LoginFailed(String),

    /// Outbound ticket could not be produced (unknown target, expired subject)
    ContextFailed(String),

    /// Inbound ticket rejected (malformed, expired, forged)
    ValidationFailed(String),

    /// Ticket was valid but asserted a different principal than expected
    PrincipalMismatch {
        /// Principal the local token expects peers to present
        expected: String,
        /// Principal asserted by the validated ticket
        asserted: String,
    },

    /// Operation requires an established subject
    NotAuthenticated,

    /// Missing or invalid configuration value
    Config(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginFailed(msg) => write!(f, "Login failed: {}", msg),
            Self::ContextFailed(msg) => write!(f, "Failed to generate service ticket: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "Service ticket validation failed: {}", msg),
            Self::PrincipalMismatch { expected, asserted } => write!(
                f,
                "Client principal names did not match (expected '{}', ticket asserts '{}')",
                expected, asserted
            ),
            Self::NotAuthenticated => write!(f, "Token is not authenticated"),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for io::Error {
    fn from(err: AuthError) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::LoginFailed("bad password".to_string());
        assert_eq!(err.to_string(), "Login failed: bad password");

        let err = AuthError::PrincipalMismatch {
            expected: "alice".to_string(),
            asserted: "bob".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Client principal names did not match (expected 'alice', ticket asserts 'bob')"
        );

        assert_eq!(
            AuthError::NotAuthenticated.to_string(),
            "Token is not authenticated"
        );
    }

    #[test]
    fn test_context_failure_into_io_error() {
        let io_err: io::Error = AuthError::ContextFailed("unknown service".to_string()).into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);

        let inner = io_err
            .get_ref()
            .and_then(|e| e.downcast_ref::<AuthError>())
            .expect("AuthError should be preserved as the io::Error source");
        assert!(matches!(inner, AuthError::ContextFailed(_)));
    }
}
