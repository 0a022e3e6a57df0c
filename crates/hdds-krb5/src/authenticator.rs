// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pluggable authentication tokens
//!
//! Every authentication scheme implements [`AuthToken`]. The membership layer
//! never names a concrete scheme: it asks a [`TokenRegistry`] for a blank
//! token matching the scheme tag found on the wire.
//!
//! # Envelope Format
//!
//! ```text
//! AuthEnvelope {
//!     i32 scheme_length;     // big-endian
//!     u8[] scheme;           // UTF-8 scheme identifier
//!     u8[] payload;          // scheme-specific (Krb5Token: one service ticket)
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Write};

use crate::codec;

/// Authentication token trait (SPI)
///
/// # Lifecycle
///
/// 1. Local token configured by its owner, then reused for every handshake
/// 2. `write_to()` -- Serialize credentials into an outbound join message
/// 3. `read_from()` -- Decode a peer's credentials into a blank, short-lived token
/// 4. `authenticate()` -- Local token judges the decoded peer token
pub trait AuthToken: fmt::Debug + Send + Sync {
    /// Stable scheme identifier carried on the wire
    fn scheme(&self) -> &'static str;

    /// Whether this token holds a usable local identity
    fn is_authenticated(&self) -> bool;

    /// Wire size of the currently held outbound credentials (0 if none)
    fn size(&self) -> usize;

    /// Serialize outbound credentials.
    ///
    /// # Errors
    ///
    /// Any I/O failure, including a failure to obtain fresh credentials.
    fn write_to(&mut self, out: &mut dyn Write) -> io::Result<()>;

    /// Decode inbound credentials into this token. Never validates.
    fn read_from(&mut self, input: &mut dyn Read) -> io::Result<()>;

    /// Decide whether `peer` is trusted.
    ///
    /// Trust failures are reported as `false`, never as errors.
    fn authenticate(&self, peer: Option<&dyn AuthToken>, ctx: &AuthContext) -> bool;

    /// Downcast support for same-scheme checks
    fn as_any(&self) -> &dyn Any;
}

/// Context of an authentication attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    peer: Option<String>,
}

impl AuthContext {
    /// Context for a join attempt from `peer` (address, member name...)
    pub fn from_peer<S: Into<String>>(peer: S) -> Self {
        Self {
            peer: Some(peer.into()),
        }
    }

    /// Peer description, if the membership layer supplied one
    pub fn peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }
}

impl fmt::Display for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.peer.as_deref().unwrap_or("<unknown>"))
    }
}

type TokenFactory = Box<dyn Fn() -> Box<dyn AuthToken> + Send + Sync>;

/// Scheme identifier -> blank token factory
#[derive(Default)]
pub struct TokenRegistry {
    factories: HashMap<&'static str, TokenFactory>,
}

impl TokenRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `scheme`, replacing any previous entry.
    pub fn register<F>(mut self, scheme: &'static str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn AuthToken> + Send + Sync + 'static,
    {
        self.factories.insert(scheme, Box::new(factory));
        self
    }

    /// Whether a factory exists for `scheme`
    pub fn contains(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }

    /// Blank token for `scheme`, `None` if the scheme is unknown
    pub fn create(&self, scheme: &str) -> Option<Box<dyn AuthToken>> {
        self.factories.get(scheme).map(|factory| factory())
    }
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<_> = self.factories.keys().collect();
        schemes.sort();
        f.debug_struct("TokenRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

/// Write `token` wrapped in a scheme-tagged envelope.
pub fn write_token(token: &mut dyn AuthToken, out: &mut dyn Write) -> io::Result<()> {
    codec::encode(token.scheme().as_bytes(), out)?;
    token.write_to(out)
}

/// Read a scheme-tagged envelope into a fresh token from `registry`.
///
/// # Returns
///
/// - `Ok(Some(token))` -- Scheme known, payload decoded
/// - `Ok(None)` -- Scheme unknown; the payload is left unread
///
/// # Errors
///
/// - `InvalidData` if the scheme tag is not UTF-8
/// - any decoding error from the token payload
pub fn read_token(
    registry: &TokenRegistry,
    input: &mut dyn Read,
) -> io::Result<Option<Box<dyn AuthToken>>> {
    let scheme = codec::decode(input)?;
    let scheme = String::from_utf8(scheme).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("scheme tag is not UTF-8: {}", e),
        )
    })?;

    let Some(mut token) = registry.create(&scheme) else {
        log::debug!("[krb5] No token registered for scheme '{}'", scheme);
        return Ok(None);
    };

    token.read_from(input)?;
    Ok(Some(token))
}
