//! Validation of the staged encryption key.

use crate::FERNET_KEY_NAME;
use crate::error::PostInstallError;
use crate::postinstall::InstallValues;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;

/// Decoded length of a Fernet key.
const FERNET_KEY_BYTES: usize = 32;

/// Extract and check the encryption key.
///
/// The key must be present and non-empty, without whitespace or control
/// characters. `strict` also requires URL-safe base64 of 32 bytes.
pub fn validate_secret(values: &InstallValues, strict: bool) -> Result<String, PostInstallError> {
    let value = values
        .get(FERNET_KEY_NAME)
        .ok_or_else(|| PostInstallError::MissingKey {
            key: FERNET_KEY_NAME.to_string(),
        })?;

    let malformed = |reason: &str| PostInstallError::MalformedValue {
        key: FERNET_KEY_NAME.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(malformed("value is empty"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed("value contains whitespace or control characters"));
    }
    if strict && !is_fernet_key(value) {
        return Err(malformed("value is not a URL-safe base64 key of 32 bytes"));
    }

    Ok(value.to_string())
}

/// Fresh random key: 32 bytes from the OS, URL-safe base64.
pub fn generate_fernet_key() -> Result<String, PostInstallError> {
    let mut bytes = [0u8; FERNET_KEY_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| PostInstallError::KeyGeneration {
        reason: e.to_string(),
    })?;
    Ok(URL_SAFE.encode(bytes))
}

/// True when `value` decodes as URL-safe base64 to exactly 32 bytes.
pub fn is_fernet_key(value: &str) -> bool {
    URL_SAFE
        .decode(value)
        .map(|bytes| bytes.len() == FERNET_KEY_BYTES)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "ZmVybmV0LWtleS1mb3ItdGVzdGluZy0zMi1ieXRlcyE=";

    fn values(line: &str) -> InstallValues {
        InstallValues::parse(line)
    }

    #[test]
    fn test_plain_key_accepted_by_default() {
        let key = validate_secret(&values("FACTURATION_OBR_FERNET_KEY=abc123"), false).unwrap();
        assert_eq!(key, "abc123");
    }

    #[test]
    fn test_missing_and_empty() {
        let err = validate_secret(&values("OTHER=1"), false).unwrap_err();
        assert!(matches!(err, PostInstallError::MissingKey { .. }));
        let err = validate_secret(&values("FACTURATION_OBR_FERNET_KEY="), false).unwrap_err();
        assert!(matches!(err, PostInstallError::MalformedValue { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_inner_whitespace_rejected() {
        let err = validate_secret(&values("FACTURATION_OBR_FERNET_KEY=ab c"), false).unwrap_err();
        assert!(matches!(err, PostInstallError::MalformedValue { .. }));
    }

    #[test]
    fn test_strict_mode() {
        assert!(is_fernet_key(VALID));
        assert!(validate_secret(&values("FACTURATION_OBR_FERNET_KEY=abc123"), true).is_err());
        let line = format!("FACTURATION_OBR_FERNET_KEY={VALID}");
        assert_eq!(validate_secret(&values(&line), true).unwrap(), VALID);
    }

    #[test]
    fn test_generated_key_is_strict() {
        let first = generate_fernet_key().unwrap();
        let second = generate_fernet_key().unwrap();
        assert!(is_fernet_key(&first));
        assert_ne!(first, second);
    }
}
