// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service Ticket Wire Format
//!
//! # Wire Format
//!
//! ```text
//! ServiceTicket {
//!     i32 ticket_length;     // big-endian (network order)
//!     u8[] ticket;           // opaque, provider-issued
//! }
//! ```
//!
//! A zero `ticket_length` is legal and means "no ticket available". The body
//! is read through `Read::take`, so a hostile length prefix cannot force a
//! large up-front allocation.

use std::io::{self, Read, Write};

/// Size of the length prefix preceding every ticket.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Number of bytes `encode` writes for `ticket`.
pub fn encoded_len(ticket: &[u8]) -> usize {
    LENGTH_PREFIX_LEN + ticket.len()
}

/// Write `ticket` as a length-prefixed blob.
///
/// # Errors
///
/// - `InvalidInput` if the ticket does not fit an `i32` length
/// - any error returned by `out`
pub fn encode<W: Write + ?Sized>(ticket: &[u8], out: &mut W) -> io::Result<()> {
    let len = i32::try_from(ticket.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("ticket too large for wire encoding ({} bytes)", ticket.len()),
        )
    })?;

    out.write_all(&len.to_be_bytes())?;
    out.write_all(ticket)
}

/// Read a length-prefixed blob written by [`encode`].
///
/// # Errors
///
/// - `UnexpectedEof` if the stream ends before the prefix or body is complete
/// - `InvalidData` if the length prefix is negative
pub fn decode<R: Read + ?Sized>(input: &mut R) -> io::Result<Vec<u8>> {
    decode_optional(input)?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "missing ticket length prefix",
        )
    })
}

/// Like [`decode`], but a stream that ends cleanly before the length prefix
/// yields `Ok(None)` instead of an error.
///
/// Used on the receive path, where a peer that is not authenticated writes no
/// ticket at all.
pub fn decode_optional<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let Some(prefix) = read_prefix(input)? else {
        return Ok(None);
    };

    let len = i32::from_be_bytes(prefix);
    let len = u64::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative ticket length: {}", len),
        )
    })?;

    let mut ticket = Vec::new();
    (&mut *input).take(len).read_to_end(&mut ticket)?;

    if ticket.len() as u64 != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "ticket truncated (expected {} bytes, got {})",
                len,
                ticket.len()
            ),
        ));
    }

    Ok(Some(ticket))
}

/// Fill the 4-byte prefix, distinguishing a clean end-of-stream (`None`)
/// from a prefix cut short.
fn read_prefix<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<[u8; LENGTH_PREFIX_LEN]>> {
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let mut filled = 0;

    while filled < LENGTH_PREFIX_LEN {
        match input.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("ticket length prefix truncated ({} of 4 bytes)", filled),
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(Some(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_layout_is_big_endian() {
        let mut buf = Vec::new();
        encode(&[0xAA, 0xBB, 0xCC], &mut buf).expect("encode");

        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x03, 0xAA, 0xBB, 0xCC]);
        assert_eq!(buf.len(), encoded_len(&[0xAA, 0xBB, 0xCC]));
    }

    #[test]
    fn test_empty_ticket_roundtrip() {
        let mut buf = Vec::new();
        encode(&[], &mut buf).expect("encode");
        assert_eq!(buf, vec![0x00; 4]);

        let decoded = decode(&mut Cursor::new(buf)).expect("decode");
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_random_roundtrip() {
        let mut rng = fastrand::Rng::with_seed(0x6b72_6235);

        for _ in 0..64 {
            let len = rng.usize(0..2048);
            let ticket: Vec<u8> = std::iter::repeat_with(|| rng.u8(..)).take(len).collect();

            let mut buf = Vec::new();
            encode(&ticket, &mut buf).expect("encode");
            assert_eq!(buf.len(), encoded_len(&ticket));

            let mut cursor = Cursor::new(buf);
            assert_eq!(decode(&mut cursor).expect("decode"), ticket);
            assert_eq!(cursor.position() as usize, encoded_len(&ticket));
        }
    }

    #[test]
    fn test_consecutive_tickets_share_a_stream() {
        let mut buf = Vec::new();
        encode(b"first", &mut buf).expect("encode");
        encode(b"", &mut buf).expect("encode");
        encode(b"third", &mut buf).expect("encode");

        let mut cursor = Cursor::new(buf);
        assert_eq!(decode(&mut cursor).expect("decode"), b"first");
        assert_eq!(decode(&mut cursor).expect("decode"), b"");
        assert_eq!(decode(&mut cursor).expect("decode"), b"third");
        assert!(decode_optional(&mut cursor).expect("clean eof").is_none());
    }

    #[test]
    fn test_decode_optional_on_empty_stream() {
        let result = decode_optional(&mut Cursor::new(Vec::<u8>::new())).expect("clean eof");
        assert!(result.is_none());

        let err = decode(&mut Cursor::new(Vec::<u8>::new())).expect_err("prefix required");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_truncated_prefix() {
        let err = decode_optional(&mut Cursor::new(vec![0x00, 0x00])).expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_truncated_body() {
        // Says length=16, but only 2 bytes follow
        let err = decode(&mut Cursor::new(vec![0x00, 0x00, 0x00, 0x10, 0x01, 0x02]))
            .expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_negative_length() {
        let err = decode(&mut Cursor::new(vec![0xFF, 0xFF, 0xFF, 0xFF])).expect_err("negative");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_huge_length_does_not_preallocate() {
        // i32::MAX length with a 3-byte body: must fail on EOF, not on allocation
        let err = decode(&mut Cursor::new(vec![0x7F, 0xFF, 0xFF, 0xFF, 0x01, 0x02, 0x03]))
            .expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_sink_errors_propagate() {
        struct BrokenPipe;

        impl Write for BrokenPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = encode(b"ticket", &mut BrokenPipe).expect_err("sink failure");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
