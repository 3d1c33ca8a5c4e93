use rand::RngCore;
use std::fmt;

/// Random bytes behind a generated signing secret.
pub const SECRET_BYTES: usize = 32;

const SECRET_PREFIX: &str = "whsec_";

/// Per-webhook HMAC key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Generate a fresh secret from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(format!("{SECRET_PREFIX}{}", hex::encode(bytes)))
    }

    /// Accept a caller-supplied secret. Blank input yields `None`.
    pub fn from_supplied(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Rehydrate a secret loaded from storage.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}
