//! Test identity source — mints the same token every time.

use footfall_core::identity::{Identity, IdentitySource};

/// An identity source that always returns the configured token.
#[derive(Debug, Clone)]
pub struct FixedIdentitySource(pub Identity);

impl FixedIdentitySource {
    /// Create a source that returns `token`.
    ///
    /// # Panics
    ///
    /// Panics if `token` is empty.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self(Identity::new(token).expect("FixedIdentitySource needs a non-empty token"))
    }
}

impl IdentitySource for FixedIdentitySource {
    fn generate(&self) -> Identity {
        self.0.clone()
    }
}
