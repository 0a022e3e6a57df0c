// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::num::NonZeroU32;

use ring::hmac;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::error::AuthError;

const KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;

/// Password-derived long-term key of a principal (PBKDF2-HMAC-SHA256).
pub(super) struct LongTermKey {
    salt: [u8; SALT_LEN],
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl LongTermKey {
    /// Derive a key for `password` under a fresh random salt.
    pub(super) fn derive(
        rng: &SystemRandom,
        iterations: NonZeroU32,
        password: &str,
    ) -> Result<Self, AuthError> {
        let salt = random_bytes::<SALT_LEN>(rng)?;
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &mut *key,
        );
        Ok(Self { salt, key })
    }

    /// Constant-time check that `password` derives this key.
    pub(super) fn verify(&self, iterations: NonZeroU32, password: &str) -> bool {
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &self.salt,
            password.as_bytes(),
            &*self.key,
        )
        .is_ok()
    }

    /// MAC key for tickets addressed to this principal.
    pub(super) fn ticket_key(&self) -> hmac::Key {
        hmac::Key::new(hmac::HMAC_SHA256, &*self.key)
    }
}

/// Fill `N` bytes from the system CSPRNG.
///
/// # Errors
///
/// Returns error if the system CSPRNG fails. We refuse to fall back to
/// predictable salts, nonces or keys.
pub(super) fn random_bytes<const N: usize>(rng: &SystemRandom) -> Result<[u8; N], AuthError> {
    let mut bytes = [0u8; N];
    rng.fill(&mut bytes).map_err(|_| {
        AuthError::Config("SystemRandom failed - refusing to use predictable value".to_string())
    })?;
    Ok(bytes)
}
