// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Kerberos-style mutual authentication for HDDS group membership
//!
//! Nodes joining a group prove their identity with a time-bounded service
//! ticket obtained from a security context provider. The receiving member
//! validates the ticket against its own subject and checks that it asserts
//! the expected principal.
//!
//! # Architecture
//!
//! ```text
//! TokenValidatorAdapter      (PeerValidator for the membership layer)
//! +-- TokenRegistry          (scheme tag -> blank token)
//! +-- Krb5Token              (AuthToken: configure / write_to / read_from / authenticate)
//!     +-- codec              ([i32 len][ticket] wire format)
//!     +-- AuthEventSink      (structured events, `log` by default)
//!     +-- SecurityContextProvider
//!         +-- LocalRealm     (in-process realm, feature `realm`)
//! ```
//!
//! # Error Policy
//!
//! Anything that questions *trust* (bad ticket, wrong principal, local token
//! not authenticated) makes `authenticate` return `false`. Anything that
//! questions *mechanics* (I/O, failure to issue a ticket) is returned as an
//! `std::io::Error`. Configuration failures never reach the caller; the token
//! stays unauthenticated and an event is recorded.
//!
//! # Usage
//!
//! ```
//! # #[cfg(feature = "realm")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! use hdds_krb5::{AuthContext, Krb5Config, Krb5Token, LocalRealm};
//!
//! let realm = Arc::new(LocalRealm::builder("EXAMPLE.COM").pbkdf2_iterations(1_000).build()?);
//! realm.add_principal("hdds/node", "node-pw")?;
//! realm.add_principal("hdds/group", "group-pw")?;
//!
//! // Joining node: logs in as hdds/node, sends tickets to hdds/group
//! let mut joining = Krb5Token::new(realm.clone());
//! joining.configure(
//!     Krb5Config::builder()
//!         .client_principal_name("hdds/node")
//!         .client_password("node-pw")
//!         .service_principal_name("hdds/group")
//!         .build()?,
//! );
//!
//! // Member: accepts tickets addressed to hdds/group from hdds/node
//! let mut member = Krb5Token::new(realm.clone());
//! member.configure(
//!     Krb5Config::builder()
//!         .client_principal_name("hdds/group")
//!         .client_password("group-pw")
//!         .service_principal_name("hdds/group")
//!         .peer_principal_name("hdds/node")
//!         .build()?,
//! );
//!
//! let mut wire = Vec::new();
//! joining.write_to(&mut wire)?;
//!
//! let mut received = Krb5Token::new(realm.clone());
//! received.read_from(&mut Cursor::new(wire))?;
//!
//! assert!(member.authenticate(Some(&received), &AuthContext::from_peer("node-2")));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "realm"))]
//! # fn main() {}
//! ```

/// Pluggable token trait, scheme registry and wire envelope.
pub mod authenticator;
/// Length-prefixed service ticket codec.
pub mod codec;
/// Credentials and property parsing.
pub mod config;
/// Error types.
pub mod error;
/// Structured authentication events.
pub mod events;
/// Membership-layer admission hook.
pub mod membership;
/// Security context provider SPI.
pub mod provider;
/// In-process ticket realm.
#[cfg(feature = "realm")]
pub mod realm;
/// Kerberos authentication token.
pub mod token;

pub use authenticator::{read_token, write_token, AuthContext, AuthToken, TokenRegistry};
pub use config::{Krb5Config, Krb5ConfigBuilder};
pub use error::AuthError;
pub use events::{AuthEvent, AuthEventSink, LogEventSink};
pub use membership::{PeerValidator, TokenValidatorAdapter};
pub use provider::{SecurityContextProvider, Subject};
#[cfg(feature = "realm")]
pub use realm::{LocalRealm, LocalRealmBuilder};
pub use token::{Krb5Token, KRB5_TOKEN_SCHEME};
