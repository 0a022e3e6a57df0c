// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process ticket realm.
//!
//! [`LocalRealm`] implements [`SecurityContextProvider`] without an external
//! KDC: principals are registered with a password, logins are checked against
//! a PBKDF2-derived long-term key, and service tickets are sealed with
//! HMAC-SHA256 under the target service principal's key, and only a subject
//! logged in as that service principal can accept them. One realm instance is
//! shared (`Arc`) by every token of a process; all operations take `&self`.
//!
//! Suitable for single-host groups and for exercising the membership
//! handshake in tests. Ticket freshness is enforced here, not by the token.

mod keys;
mod ticket;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use parking_lot::RwLock;
use ring::hmac;
use ring::rand::SystemRandom;

use crate::error::AuthError;
use crate::provider::{unix_time_ms, SecurityContextProvider, Subject};

use keys::{random_bytes, LongTermKey};
use ticket::{ParsedTicket, TicketBody, NONCE_LEN};

/// Default lifetime of an established subject.
pub const DEFAULT_SUBJECT_LIFETIME: Duration = Duration::from_secs(10 * 60 * 60);
/// Default lifetime of a service ticket.
pub const DEFAULT_TICKET_LIFETIME: Duration = Duration::from_secs(5 * 60);
/// Default PBKDF2 iteration count for long-term keys.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// In-process ticket realm
pub struct LocalRealm {
    name: String,
    login_config: Option<String>,
    master_key: hmac::Key,
    principals: RwLock<HashMap<String, LongTermKey>>,
    pbkdf2_iterations: NonZeroU32,
    subject_lifetime: Duration,
    ticket_lifetime: Duration,
    rng: SystemRandom,
}

impl LocalRealm {
    /// Create a realm builder
    pub fn builder<S: Into<String>>(name: S) -> LocalRealmBuilder {
        LocalRealmBuilder {
            name: name.into(),
            login_config: None,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            subject_lifetime: DEFAULT_SUBJECT_LIFETIME,
            ticket_lifetime: DEFAULT_TICKET_LIFETIME,
        }
    }

    /// Realm name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `principal` with `password`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Config`] for an empty principal or password
    /// - [`AuthError::Config`] if the CSPRNG fails
    pub fn add_principal(&self, principal: &str, password: &str) -> Result<(), AuthError> {
        if principal.is_empty() || password.is_empty() {
            return Err(AuthError::Config(
                "principal and password must not be empty".to_string(),
            ));
        }

        let key = LongTermKey::derive(&self.rng, self.pbkdf2_iterations, password)?;
        self.principals.write().insert(principal.to_string(), key);
        log::debug!("[krb5] Registered principal {} in realm {}", principal, self.name);
        Ok(())
    }

    /// Whether `principal` is registered
    pub fn contains_principal(&self, principal: &str) -> bool {
        self.principals.read().contains_key(principal)
    }

    fn subject_message(principal: &str, expiration_ms: u64) -> Vec<u8> {
        let mut message = Vec::with_capacity(principal.len() + 8);
        message.extend_from_slice(principal.as_bytes());
        message.extend_from_slice(&expiration_ms.to_be_bytes());
        message
    }

    /// Check that `subject` was issued by this realm and is still valid.
    fn verify_subject(&self, subject: &Subject) -> Result<(), String> {
        let message = Self::subject_message(subject.principal(), subject.expiration_ms());
        hmac::verify(&self.master_key, &message, subject.credential())
            .map_err(|_| format!("subject {} was not issued by realm {}", subject.principal(), self.name))?;

        if subject.is_expired() {
            return Err(format!("subject {} has expired", subject.principal()));
        }

        Ok(())
    }

    fn ticket_key(&self, principal: &str) -> Option<hmac::Key> {
        self.principals.read().get(principal).map(LongTermKey::ticket_key)
    }
}

impl SecurityContextProvider for LocalRealm {
    fn establish_subject(
        &self,
        principal: &str,
        secret: &str,
        config_name: &str,
    ) -> Result<Subject, AuthError> {
        if let Some(expected) = &self.login_config {
            if expected != config_name {
                return Err(AuthError::LoginFailed(format!(
                    "no login configuration named '{}'",
                    config_name
                )));
            }
        }

        let verified = self
            .principals
            .read()
            .get(principal)
            .map(|key| key.verify(self.pbkdf2_iterations, secret));

        match verified {
            None => {
                return Err(AuthError::LoginFailed(format!(
                    "client {} not found in realm {}",
                    principal, self.name
                )))
            }
            Some(false) => {
                return Err(AuthError::LoginFailed(format!(
                    "pre-authentication failed for {}",
                    principal
                )))
            }
            Some(true) => {}
        }

        let now = unix_time_ms()
            .ok_or_else(|| AuthError::LoginFailed("system clock unavailable".to_string()))?;
        let expiration_ms = now.saturating_add(duration_ms(self.subject_lifetime));

        let credential = hmac::sign(
            &self.master_key,
            &Self::subject_message(principal, expiration_ms),
        );

        Ok(Subject::new(
            principal.to_string(),
            expiration_ms,
            credential.as_ref().to_vec(),
        ))
    }

    fn generate_ticket(
        &self,
        subject: &Subject,
        service_principal: &str,
    ) -> Result<Vec<u8>, AuthError> {
        self.verify_subject(subject).map_err(AuthError::ContextFailed)?;

        let key = self.ticket_key(service_principal).ok_or_else(|| {
            AuthError::ContextFailed(format!(
                "server {} not found in realm {}",
                service_principal, self.name
            ))
        })?;

        let issued_ms = unix_time_ms()
            .ok_or_else(|| AuthError::ContextFailed("system clock unavailable".to_string()))?;
        let nonce = random_bytes::<NONCE_LEN>(&self.rng)
            .map_err(|e| AuthError::ContextFailed(e.to_string()))?;

        TicketBody {
            client: subject.principal().to_string(),
            service: service_principal.to_string(),
            issued_ms,
            expires_ms: issued_ms.saturating_add(duration_ms(self.ticket_lifetime)),
            nonce,
        }
        .seal(&key)
    }

    fn validate_ticket(&self, subject: &Subject, ticket: &[u8]) -> Result<String, AuthError> {
        self.verify_subject(subject)
            .map_err(|e| AuthError::ValidationFailed(format!("local {}", e)))?;

        if ticket.is_empty() {
            return Err(AuthError::ValidationFailed(
                "no service ticket presented".to_string(),
            ));
        }

        let parsed = ParsedTicket::parse(ticket)?;

        // Only the target service can accept its tickets
        if parsed.body.service != subject.principal() {
            return Err(AuthError::ValidationFailed(format!(
                "ticket not addressed to {} (issued for {})",
                subject.principal(),
                parsed.body.service
            )));
        }

        let key = self.ticket_key(&parsed.body.service).ok_or_else(|| {
            AuthError::ValidationFailed(format!(
                "ticket addressed to unknown server {}",
                parsed.body.service
            ))
        })?;

        hmac::verify(&key, parsed.signed, parsed.tag).map_err(|_| {
            AuthError::ValidationFailed("ticket integrity check failed".to_string())
        })?;

        let now = unix_time_ms()
            .ok_or_else(|| AuthError::ValidationFailed("system clock unavailable".to_string()))?;
        if now >= parsed.body.expires_ms {
            return Err(AuthError::ValidationFailed(format!(
                "ticket for {} expired",
                parsed.body.client
            )));
        }

        Ok(parsed.body.client)
    }
}

impl fmt::Debug for LocalRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalRealm")
            .field("name", &self.name)
            .field("login_config", &self.login_config)
            .field("principals", &self.principals.read().len())
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .field("subject_lifetime", &self.subject_lifetime)
            .field("ticket_lifetime", &self.ticket_lifetime)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LocalRealm`].
#[derive(Debug, Clone)]
pub struct LocalRealmBuilder {
    name: String,
    login_config: Option<String>,
    pbkdf2_iterations: u32,
    subject_lifetime: Duration,
    ticket_lifetime: Duration,
}

impl LocalRealmBuilder {
    /// Only accept logins naming this login configuration
    pub fn login_config<S: Into<String>>(mut self, name: S) -> Self {
        self.login_config = Some(name.into());
        self
    }

    /// PBKDF2 iteration count (default: [`DEFAULT_PBKDF2_ITERATIONS`])
    pub fn pbkdf2_iterations(mut self, iterations: u32) -> Self {
        self.pbkdf2_iterations = iterations;
        self
    }

    /// Lifetime of established subjects (default: 10 h)
    pub fn subject_lifetime(mut self, lifetime: Duration) -> Self {
        self.subject_lifetime = lifetime;
        self
    }

    /// Lifetime of issued service tickets (default: 5 min)
    pub fn ticket_lifetime(mut self, lifetime: Duration) -> Self {
        self.ticket_lifetime = lifetime;
        self
    }

    /// Build the realm with a fresh random master key
    ///
    /// # Errors
    ///
    /// - [`AuthError::Config`] for an empty realm name or zero iterations
    /// - [`AuthError::Config`] if the CSPRNG fails
    pub fn build(self) -> Result<LocalRealm, AuthError> {
        if self.name.is_empty() {
            return Err(AuthError::Config("realm name must not be empty".to_string()));
        }

        let pbkdf2_iterations = NonZeroU32::new(self.pbkdf2_iterations)
            .ok_or_else(|| AuthError::Config("PBKDF2 iterations must be non-zero".to_string()))?;

        let rng = SystemRandom::new();
        let master = zeroize::Zeroizing::new(random_bytes::<32>(&rng)?);

        Ok(LocalRealm {
            name: self.name,
            login_config: self.login_config,
            master_key: hmac::Key::new(hmac::HMAC_SHA256, &*master),
            principals: RwLock::new(HashMap::new()),
            pbkdf2_iterations,
            subject_lifetime: self.subject_lifetime,
            ticket_lifetime: self.ticket_lifetime,
            rng,
        })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
