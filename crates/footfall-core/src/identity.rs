//! Visitor identity tokens and their generation.
//!
//! An identity is an opaque string. It is either echoed back by the client
//! (cookie or `ETag`) or minted here from the thread-local CSPRNG. In tests a
//! fixed source is injected so responses are reproducible.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a freshly minted identity.
pub const IDENTITY_BYTES: usize = 20;

/// Length of a freshly minted identity once base64 encoded.
pub const IDENTITY_ENCODED_LEN: usize = IDENTITY_BYTES.div_ceil(3) * 4;

/// Stable pseudo-anonymous visitor token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps an existing token.
    ///
    /// Returns `None` unless the token is non-empty and made only of cookie
    /// value octets (visible ASCII except `"`, `,`, `;` and `\`), since the
    /// token is written verbatim into `Set-Cookie`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if !token.is_empty() && token.bytes().all(is_cookie_octet) {
            Some(Self(token))
        } else {
            None
        }
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_cookie_octet(b: u8) -> bool {
    b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\')
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints identities for visitors that present none.
pub trait IdentitySource: Send + Sync {
    /// Returns a new identity that no other visitor can predict.
    fn generate(&self) -> Identity;
}

/// Production source: 20 bytes from the OS-seeded thread RNG, base64 encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureIdentitySource;

impl IdentitySource for SecureIdentitySource {
    fn generate(&self) -> Identity {
        let mut bytes = [0_u8; IDENTITY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Identity(STANDARD.encode(bytes))
    }
}
