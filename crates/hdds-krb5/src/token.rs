// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kerberos V5 authentication token
//!
//! # Protocol
//!
//! ```text
//! Joining node (B)                          Member (A)
//!    |                                         |
//!    | configure() -> Subject(B)               | configure() -> Subject(A)
//!    |                                         |
//!    | write_to(): fresh ticket for service    |
//!    |---------- [i32 len][ticket] ----------->|
//!    |                                         | read_from() into a blank token
//!    |                                         | authenticate(blank):
//!    |                                         |   provider.validate_ticket(Subject(A))
//!    |                                         |   asserted == expected principal?
//! ```
//!
//! # States
//!
//! - **Unauthenticated** -- initial, and the fallback after any login failure.
//!   Writes nothing, rejects every peer.
//! - **Authenticated** -- a subject is held; tickets can be issued and validated.

use std::any::Any;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::authenticator::{AuthContext, AuthToken, TokenRegistry};
use crate::codec;
use crate::config::Krb5Config;
use crate::error::AuthError;
use crate::events::{AuthEvent, AuthEventSink, LogEventSink};
use crate::provider::{SecurityContextProvider, Subject};

/// Scheme identifier of [`Krb5Token`] on the wire.
pub const KRB5_TOKEN_SCHEME: &str = "hdds.auth.Krb5Token";

/// Kerberos-style authentication token.
///
/// The same type plays two roles: the long-lived local token that owns a
/// subject, and a short-lived blank token that only carries one decoded peer
/// ticket until it is handed to the local token's `authenticate`.
pub struct Krb5Token {
    provider: Arc<dyn SecurityContextProvider>,
    events: Arc<dyn AuthEventSink>,
    config: Option<Krb5Config>,
    configured: bool,
    subject: Option<Subject>,
    /// Most recently issued outbound ticket
    service_ticket: Option<Vec<u8>>,
    /// Ticket decoded from a peer, taken by the first `authenticate`
    remote_service_ticket: Mutex<Option<Vec<u8>>>,
}

impl Krb5Token {
    /// Create an unauthenticated token backed by `provider`.
    pub fn new(provider: Arc<dyn SecurityContextProvider>) -> Self {
        Self {
            provider,
            events: Arc::new(LogEventSink),
            config: None,
            configured: false,
            subject: None,
            service_ticket: None,
            remote_service_ticket: Mutex::new(None),
        }
    }

    /// Add a [`KRB5_TOKEN_SCHEME`] factory to `registry`; blank tokens share `provider`.
    pub fn register(
        registry: TokenRegistry,
        provider: Arc<dyn SecurityContextProvider>,
    ) -> TokenRegistry {
        registry.register(KRB5_TOKEN_SCHEME, move || {
            Box::new(Krb5Token::new(Arc::clone(&provider)))
        })
    }

    /// Report events to `sink` instead of the `log` facade.
    pub fn with_event_sink(mut self, sink: Arc<dyn AuthEventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Establish the local subject from `config`.
    ///
    /// Never fails: any login error is reported as an event and leaves the
    /// token unauthenticated. Only the first call has an effect.
    pub fn configure(&mut self, config: Krb5Config) {
        self.apply_config(Ok(config));
    }

    /// Configure from membership-layer properties, consuming the keys read.
    ///
    /// Missing keys leave the token unauthenticated, like a failed login.
    pub fn configure_from_properties(
        &mut self,
        properties: &mut std::collections::HashMap<String, String>,
    ) {
        self.apply_config(Krb5Config::from_properties(properties));
    }

    fn apply_config(&mut self, config: Result<Krb5Config, AuthError>) {
        if self.configured {
            log::warn!("[krb5] Krb5Token already configured, ignoring new credentials");
            return;
        }
        self.configured = true;

        let config = match config {
            Ok(config) => config,
            Err(e) => {
                self.subject = None;
                self.events.record(&AuthEvent::ConfigurationFailed {
                    principal: None,
                    reason: e.to_string(),
                });
                return;
            }
        };

        match self.provider.establish_subject(
            config.client_principal_name(),
            config.client_password(),
            config.security_config_name(),
        ) {
            Ok(subject) => {
                self.events.record(&AuthEvent::SubjectEstablished {
                    principal: subject.principal().to_string(),
                });
                self.subject = Some(subject);
            }
            Err(e) => {
                // If we get any kind of error then blank the subject
                self.subject = None;
                self.events.record(&AuthEvent::ConfigurationFailed {
                    principal: Some(config.client_principal_name().to_string()),
                    reason: e.to_string(),
                });
            }
        }

        self.config = Some(config);
    }

    /// True iff a subject is held
    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    /// Credentials this token was configured with
    pub fn config(&self) -> Option<&Krb5Config> {
        self.config.as_ref()
    }

    /// Wire size of the currently held outbound ticket (0 if none)
    pub fn size(&self) -> usize {
        self.service_ticket
            .as_deref()
            .map_or(0, codec::encoded_len)
    }

    /// Serialize a fresh service ticket.
    ///
    /// Writes nothing while unauthenticated.
    ///
    /// # Errors
    ///
    /// - the provider cannot issue a ticket (surfaced as `ErrorKind::Other`
    ///   wrapping [`AuthError::ContextFailed`])
    /// - the sink fails
    pub fn write_to<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        let (Some(subject), Some(config)) = (&self.subject, &self.config) else {
            log::debug!("[krb5] Krb5Token not authenticated, writing no service ticket");
            return Ok(());
        };

        let service = config.service_principal_name();
        let ticket = match self.provider.generate_ticket(subject, service) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.service_ticket = None;
                self.events.record(&AuthEvent::TicketFailed {
                    service: service.to_string(),
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        self.events.record(&AuthEvent::TicketIssued {
            service: service.to_string(),
            len: ticket.len(),
        });

        let ticket = self.service_ticket.insert(ticket);
        codec::encode(ticket, out)
    }

    /// Decode a peer's service ticket into this (blank) token.
    ///
    /// Does not validate anything; an absent or zero-length ticket is stored
    /// as empty and rejected later by `authenticate`.
    pub fn read_from<R: Read + ?Sized>(&mut self, input: &mut R) -> io::Result<()> {
        let ticket = codec::decode_optional(input)?.unwrap_or_default();
        *self.remote_service_ticket.get_mut() = Some(ticket);
        Ok(())
    }

    /// Decide whether `peer` carries a valid ticket for the expected principal.
    pub fn authenticate(&self, peer: Option<&dyn AuthToken>, ctx: &AuthContext) -> bool {
        let (Some(subject), Some(config)) = (&self.subject, &self.config) else {
            log::error!("[krb5] Krb5Token failed to setup correctly - cannot authenticate any peers");
            self.reject(ctx, &AuthError::NotAuthenticated.to_string());
            return false;
        };

        let Some(remote) = peer.and_then(|p| p.as_any().downcast_ref::<Self>()) else {
            self.reject(ctx, "peer did not present a Krb5Token");
            return false;
        };

        match self.validate_remote_service_ticket(subject, config, remote) {
            Ok(principal) => {
                self.events.record(&AuthEvent::PeerAccepted {
                    peer: ctx.to_string(),
                    principal,
                });
                true
            }
            Err(e) => {
                self.reject(ctx, &e.to_string());
                false
            }
        }
    }

    fn validate_remote_service_ticket(
        &self,
        subject: &Subject,
        config: &Krb5Config,
        remote: &Self,
    ) -> Result<String, AuthError> {
        let ticket = remote
            .remote_service_ticket
            .lock()
            .take()
            .filter(|ticket| !ticket.is_empty())
            .ok_or_else(|| AuthError::ValidationFailed("no service ticket presented".to_string()))?;

        let asserted = self.provider.validate_ticket(subject, &ticket)?;

        let expected = config.expected_peer_principal();
        if asserted != expected {
            return Err(AuthError::PrincipalMismatch {
                expected: expected.to_string(),
                asserted,
            });
        }

        Ok(asserted)
    }

    fn reject(&self, ctx: &AuthContext, reason: &str) {
        self.events.record(&AuthEvent::PeerRejected {
            peer: ctx.to_string(),
            reason: reason.to_string(),
        });
    }
}

impl AuthToken for Krb5Token {
    fn scheme(&self) -> &'static str {
        KRB5_TOKEN_SCHEME
    }

    fn is_authenticated(&self) -> bool {
        Krb5Token::is_authenticated(self)
    }

    fn size(&self) -> usize {
        Krb5Token::size(self)
    }

    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<()> {
        Krb5Token::write_to(self, out)
    }

    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()> {
        Krb5Token::read_from(self, input)
    }

    fn authenticate(&self, peer: Option<&dyn AuthToken>, ctx: &AuthContext) -> bool {
        Krb5Token::authenticate(self, peer, ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Krb5Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Krb5Token")
            .field("provider", &self.provider)
            .field("config", &self.config)
            .field("subject", &self.subject)
            .field(
                "service_ticket",
                &self.service_ticket.as_ref().map(Vec::len),
            )
            .field(
                "remote_service_ticket",
                &self.remote_service_ticket.lock().as_ref().map(Vec::len),
            )
            .finish_non_exhaustive()
    }
}
