// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Security context provider (SPI)
//!
//! The platform security service sits behind this narrow contract:
//!
//! ```text
//! Krb5Token                         SecurityContextProvider
//!    |                                      |
//!    |  establish_subject(principal, pw)    |
//!    |------------------------------------->|  LoginFailed
//!    |<--------------- Subject -------------|
//!    |                                      |
//!    |  generate_ticket(subject, service)   |
//!    |------------------------------------->|  ContextFailed
//!    |<---------------- ticket -------------|
//!    |                                      |
//!    |  validate_ticket(subject, ticket)    |
//!    |------------------------------------->|  ValidationFailed
//!    |<----------- client principal --------|
//! ```
//!
//! Implementations may block on network or local security-service calls and
//! must be safe to share between tokens (`Send + Sync`). Ticket freshness is
//! the provider's responsibility; the token only compares principal names.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::AuthError;

/// Security context provider trait (SPI)
///
/// # Lifecycle
///
/// 1. `establish_subject()` -- Log in with long-lived credentials
/// 2. `generate_ticket()` -- Issue a fresh ticket for a target service (per send)
/// 3. `validate_ticket()` -- Accept a peer ticket and report who it vouches for
pub trait SecurityContextProvider: fmt::Debug + Send + Sync {
    /// Log in `principal` with `secret`.
    ///
    /// `config_name` selects the provider-side login configuration.
    ///
    /// # Errors
    ///
    /// [`AuthError::LoginFailed`] for bad credentials or configuration.
    fn establish_subject(
        &self,
        principal: &str,
        secret: &str,
        config_name: &str,
    ) -> Result<Subject, AuthError>;

    /// Produce a ticket asserting `subject`'s identity, bound to `service_principal`.
    ///
    /// # Errors
    ///
    /// [`AuthError::ContextFailed`] if no ticket can be produced (unknown
    /// target, expired subject, service unreachable).
    fn generate_ticket(
        &self,
        subject: &Subject,
        service_principal: &str,
    ) -> Result<Vec<u8>, AuthError>;

    /// Validate `ticket` against the local `subject`.
    ///
    /// # Returns
    ///
    /// The client principal asserted by the ticket.
    ///
    /// # Errors
    ///
    /// [`AuthError::ValidationFailed`] for malformed, expired or forged tickets.
    fn validate_ticket(&self, subject: &Subject, ticket: &[u8]) -> Result<String, AuthError>;
}

/// Authenticated local identity
///
/// Opaque to the token; only the provider that issued it interprets the
/// credential. Owned exclusively by the token that established it.
///
/// # Contents
///
/// - Principal name the subject was established for
/// - Expiration timestamp (Unix epoch, milliseconds)
/// - Provider credential (wiped on drop)
pub struct Subject {
    principal: String,
    expiration_ms: u64,
    credential: Zeroizing<Vec<u8>>,
}

impl Subject {
    /// Create a new subject
    pub fn new(principal: String, expiration_ms: u64, credential: Vec<u8>) -> Self {
        Self {
            principal,
            expiration_ms,
            credential: Zeroizing::new(credential),
        }
    }

    /// Principal this subject was established for
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Expiration timestamp (Unix epoch, milliseconds)
    pub fn expiration_ms(&self) -> u64 {
        self.expiration_ms
    }

    /// Provider-specific credential
    pub fn credential(&self) -> &[u8] {
        &self.credential
    }

    /// Check if the subject is expired
    ///
    /// Returns `true` if the expiration time has passed, or if system time is
    /// unavailable (fail-safe: treat time errors as expired).
    pub fn is_expired(&self) -> bool {
        match unix_time_ms() {
            Some(now) => now >= self.expiration_ms,
            None => true,
        }
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("principal", &self.principal)
            .field("expiration_ms", &self.expiration_ms)
            .field("credential", &format_args!("<{} bytes>", self.credential.len()))
            .finish()
    }
}

/// Current time as milliseconds since the Unix epoch, `None` if the system
/// clock is before the epoch.
pub(crate) fn unix_time_ms() -> Option<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
}
