//! Access code obfuscation for operators.
//!
//! Uses the same `CARRIER_CREDENTIAL_KEY` as the admin service, so values
//! produced here can be written straight into `carrier_configs`.

use correio_labels_core::credential::CredentialCodec;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Value is not in obfuscated form")]
    NotObfuscated,
}

fn codec() -> Result<CredentialCodec, CredentialError> {
    let _ = dotenvy::dotenv();

    let key = std::env::var("CARRIER_CREDENTIAL_KEY")
        .map(SecretString::from)
        .map_err(|_| CredentialError::MissingEnvVar("CARRIER_CREDENTIAL_KEY"))?;

    Ok(CredentialCodec::new(key.expose_secret()))
}

/// Print the storage form of `value`.
///
/// # Errors
///
/// Returns `CredentialError::MissingEnvVar` if the key is not set.
pub fn obfuscate(value: &str) -> Result<(), CredentialError> {
    let token = codec()?.obfuscate(value.trim());

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}

/// Print the plaintext behind a stored value.
///
/// # Errors
///
/// Returns `CredentialError` if the key is not set or the value was never
/// obfuscated.
pub fn reveal(value: &str) -> Result<(), CredentialError> {
    if !CredentialCodec::is_obfuscated(value) {
        return Err(CredentialError::NotObfuscated);
    }
    let plain = codec()?.reveal(value);

    #[allow(clippy::print_stdout)]
    {
        println!("{plain}");
    }
    Ok(())
}
