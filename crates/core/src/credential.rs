//! Reversible obfuscation of carrier access codes for at-rest storage.
//!
//! This is NOT encryption. The codec XORs the secret against a configured
//! key and base64-encodes the result so that access codes do not sit in the
//! settings table as readable text. Anyone holding the key (or enough
//! ciphertexts) can recover the value; access control lives elsewhere.
//!
//! Stored tokens carry the [`TOKEN_PREFIX`] marker. Values without it are
//! treated as plaintext written before obfuscation was introduced and are
//! returned unchanged by [`CredentialCodec::reveal`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Marker identifying values produced by [`CredentialCodec::obfuscate`].
pub const TOKEN_PREFIX: &str = "xor1:";

/// XOR/base64 codec with an injected key.
#[derive(Clone)]
pub struct CredentialCodec {
    key: Vec<u8>,
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialCodec {
    /// Create a codec for the given key.
    #[must_use]
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    /// Obfuscate a secret into its storage form.
    #[must_use]
    pub fn obfuscate(&self, secret: &str) -> String {
        let mixed = self.xor(secret.as_bytes());
        format!("{TOKEN_PREFIX}{}", STANDARD.encode(mixed))
    }

    /// Recover a secret from its storage form.
    ///
    /// Never fails: plaintext values, malformed base64 and payloads that do
    /// not decode to UTF-8 are all returned unchanged.
    #[must_use]
    pub fn reveal(&self, token: &str) -> String {
        let Some(encoded) = token.strip_prefix(TOKEN_PREFIX) else {
            return token.to_string();
        };

        let Ok(bytes) = STANDARD.decode(encoded) else {
            return token.to_string();
        };

        String::from_utf8(self.xor(&bytes)).unwrap_or_else(|_| token.to_string())
    }

    /// Whether a stored value is already in obfuscated form.
    #[must_use]
    pub fn is_obfuscated(token: &str) -> bool {
        token.starts_with(TOKEN_PREFIX)
    }

    fn xor(&self, input: &[u8]) -> Vec<u8> {
        if self.key.is_empty() {
            return input.to_vec();
        }

        input
            .iter()
            .zip(self.key.iter().cycle())
            .map(|(byte, key)| byte ^ key)
            .collect()
    }
}
