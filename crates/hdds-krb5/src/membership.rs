// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Membership-layer bridge
//!
//! The group membership layer decides *when* to authenticate and moves bytes;
//! it only sees [`PeerValidator`]. [`TokenValidatorAdapter`] implements it on
//! top of a local [`AuthToken`] and a [`TokenRegistry`]:
//!
//! ```text
//! join request (sender)                       join handling (receiver)
//!   outbound_payload()                          validate_peer(peer, payload)
//!     write_token(local)  ---- envelope ---->     read_token(registry) -> blank token
//!                                                 local.authenticate(blank)
//! ```

use std::io::{self, Cursor};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::authenticator::{read_token, write_token, AuthContext, AuthToken, TokenRegistry};

/// Peer admission hook consumed by the membership layer.
pub trait PeerValidator: Send + Sync {
    /// Validate the authentication payload a peer attached to its join message.
    ///
    /// # Returns
    /// - `Ok(())` if the peer is trusted
    /// - `Err(reason)` if the peer should be rejected
    fn validate_peer(&self, peer: &str, auth_payload: &[u8]) -> Result<(), String>;
}

/// Adapter that bridges an [`AuthToken`] to [`PeerValidator`].
///
/// The local token is shared by the send and receive paths behind a
/// read-write lock: peer validations only read it and run in parallel, while
/// issuing an outbound ticket takes it exclusively. Each inbound payload is
/// decoded into its own blank token.
#[derive(Debug)]
pub struct TokenValidatorAdapter {
    local: RwLock<Box<dyn AuthToken>>,
    registry: Arc<TokenRegistry>,
}

impl TokenValidatorAdapter {
    /// Create a new adapter around the configured `local` token.
    pub fn new(local: Box<dyn AuthToken>, registry: Arc<TokenRegistry>) -> Self {
        Self {
            local: RwLock::new(local),
            registry,
        }
    }

    /// Whether the local token holds an identity
    pub fn is_authenticated(&self) -> bool {
        self.local.read().is_authenticated()
    }

    /// Serialize the local credentials for an outbound join message.
    ///
    /// # Errors
    ///
    /// Propagates any failure to produce credentials; the caller should abort
    /// the join attempt.
    pub fn outbound_payload(&self) -> io::Result<Vec<u8>> {
        let mut local = self.local.write();
        let mut payload = Vec::with_capacity(local.size() + 64);
        write_token(&mut **local, &mut payload)?;
        Ok(payload)
    }
}

impl PeerValidator for TokenValidatorAdapter {
    fn validate_peer(&self, peer: &str, auth_payload: &[u8]) -> Result<(), String> {
        let remote = read_token(&self.registry, &mut Cursor::new(auth_payload))
            .map_err(|e| format!("Undecodable authentication payload: {}", e))?;

        let ctx = AuthContext::from_peer(peer);
        let trusted = self
            .local
            .read()
            .authenticate(remote.as_deref(), &ctx);

        if trusted {
            log::debug!("[krb5] Authenticated peer {}", peer);
            Ok(())
        } else {
            log::warn!("[krb5] Rejected peer {}", peer);
            Err(format!("Authentication of {} failed", peer))
        }
    }
}
