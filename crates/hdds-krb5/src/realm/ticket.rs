// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Realm service ticket layout
//!
//! ```text
//! +--------------------+
//! | version (u8)       |  TICKET_VERSION
//! | client_len (u16)   |
//! | client (utf-8)     |  asserted client principal
//! | service_len (u16)  |
//! | service (utf-8)    |  target service principal
//! | issued_ms (u64)    |
//! | expires_ms (u64)   |
//! | nonce (16 bytes)   |  fresh per ticket
//! +--------------------+
//! | tag (32 bytes)     |  HMAC-SHA256 over the above, keyed by the service key
//! +--------------------+
//! ```
//!
//! All integers are big-endian.

use ring::hmac;

use crate::error::AuthError;

const TICKET_VERSION: u8 = 1;
pub(super) const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;

/// Decoded ticket contents (before MAC verification)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TicketBody {
    pub client: String,
    pub service: String,
    pub issued_ms: u64,
    pub expires_ms: u64,
    pub nonce: [u8; NONCE_LEN],
}

/// Ticket split into its body and authentication tag
pub(super) struct ParsedTicket<'a> {
    pub body: TicketBody,
    pub signed: &'a [u8],
    pub tag: &'a [u8],
}

impl TicketBody {
    /// Serialize and append the MAC computed with `key`.
    pub(super) fn seal(&self, key: &hmac::Key) -> Result<Vec<u8>, AuthError> {
        let client_len = principal_len(&self.client)?;
        let service_len = principal_len(&self.service)?;

        let mut ticket = Vec::with_capacity(
            1 + 2 + self.client.len() + 2 + self.service.len() + 8 + 8 + NONCE_LEN + TAG_LEN,
        );
        ticket.push(TICKET_VERSION);
        ticket.extend_from_slice(&client_len.to_be_bytes());
        ticket.extend_from_slice(self.client.as_bytes());
        ticket.extend_from_slice(&service_len.to_be_bytes());
        ticket.extend_from_slice(self.service.as_bytes());
        ticket.extend_from_slice(&self.issued_ms.to_be_bytes());
        ticket.extend_from_slice(&self.expires_ms.to_be_bytes());
        ticket.extend_from_slice(&self.nonce);

        let tag = hmac::sign(key, &ticket);
        ticket.extend_from_slice(tag.as_ref());
        Ok(ticket)
    }
}

impl<'a> ParsedTicket<'a> {
    /// Split `ticket` into body fields, signed region and tag.
    pub(super) fn parse(ticket: &'a [u8]) -> Result<Self, AuthError> {
        if ticket.len() < TAG_LEN {
            return Err(malformed("shorter than authentication tag"));
        }
        let (signed, tag) = ticket.split_at(ticket.len() - TAG_LEN);

        let mut reader = Reader { data: signed };

        let version = reader.u8()?;
        if version != TICKET_VERSION {
            return Err(AuthError::ValidationFailed(format!(
                "unsupported ticket version {}",
                version
            )));
        }

        let client = reader.principal()?;
        let service = reader.principal()?;
        let issued_ms = reader.u64()?;
        let expires_ms = reader.u64()?;
        let nonce: [u8; NONCE_LEN] = reader
            .take(NONCE_LEN)?
            .try_into()
            .map_err(|_| malformed("nonce"))?;

        if !reader.data.is_empty() {
            return Err(malformed("trailing bytes"));
        }

        Ok(Self {
            body: TicketBody {
                client,
                service,
                issued_ms,
                expires_ms,
                nonce,
            },
            signed,
            tag,
        })
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], AuthError> {
        if self.data.len() < n {
            return Err(malformed("truncated"));
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, AuthError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, AuthError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u64(&mut self) -> Result<u64, AuthError> {
        let bytes: [u8; 8] = self
            .take(8)?
            .try_into()
            .map_err(|_| malformed("timestamp"))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn principal(&mut self) -> Result<String, AuthError> {
        let len = usize::from(self.u16()?);
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| malformed("principal is not UTF-8"))
    }
}

fn principal_len(principal: &str) -> Result<u16, AuthError> {
    u16::try_from(principal.len())
        .map_err(|_| AuthError::ContextFailed(format!("principal too long ({} bytes)", principal.len())))
}

fn malformed(what: &str) -> AuthError {
    AuthError::ValidationFailed(format!("malformed ticket: {}", what))
}
