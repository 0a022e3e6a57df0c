// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Authentication event sink
//!
//! Every configuration outcome and trust decision is reported as an
//! [`AuthEvent`]. Failures that the token deliberately swallows (bad
//! credentials, rejected peers) stay visible to operators this way.

use std::fmt;

/// Authentication event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Subject established for the local principal
    SubjectEstablished { principal: String },

    /// Configuration or login failed; the token stays unauthenticated
    ConfigurationFailed {
        principal: Option<String>,
        reason: String,
    },

    /// Outbound ticket issued for the target service
    TicketIssued { service: String, len: usize },

    /// Outbound ticket could not be generated
    TicketFailed { service: String, reason: String },

    /// Peer ticket validated and principal matched
    PeerAccepted { peer: String, principal: String },

    /// Peer rejected
    PeerRejected { peer: String, reason: String },
}

/// Sink for authentication events (SPI)
pub trait AuthEventSink: Send + Sync {
    /// Record a single event
    fn record(&self, event: &AuthEvent);
}

/// Default sink forwarding events to the `log` facade.
///
/// Rejections are logged at `error`, configuration failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl AuthEventSink for LogEventSink {
    fn record(&self, event: &AuthEvent) {
        match event {
            AuthEvent::SubjectEstablished { .. } => log::info!("[krb5] {}", event),
            AuthEvent::ConfigurationFailed { .. } => log::warn!("[krb5] {}", event),
            AuthEvent::TicketIssued { .. } | AuthEvent::PeerAccepted { .. } => {
                log::debug!("[krb5] {}", event);
            }
            AuthEvent::TicketFailed { .. } | AuthEvent::PeerRejected { .. } => {
                log::error!("[krb5] {}", event);
            }
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubjectEstablished { principal } => {
                write!(f, "Subject established for {}", principal)
            }
            Self::ConfigurationFailed {
                principal: Some(principal),
                reason,
            } => write!(f, "Krb5Token failed to authenticate {}: {}", principal, reason),
            Self::ConfigurationFailed {
                principal: None,
                reason,
            } => write!(f, "Krb5Token failed to authenticate: {}", reason),
            Self::TicketIssued { service, len } => {
                write!(f, "Issued service ticket for {} ({} bytes)", service, len)
            }
            Self::TicketFailed { service, reason } => {
                write!(f, "Failed to generate service ticket for {}: {}", service, reason)
            }
            Self::PeerAccepted { peer, principal } => {
                write!(f, "Authenticated peer {} as {}", peer, principal)
            }
            Self::PeerRejected { peer, reason } => {
                write!(f, "Rejected peer {}: {}", peer, reason)
            }
        }
    }
}
