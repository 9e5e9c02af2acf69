//! Secret memos: a non-reversible fingerprint of a sensitive attribute, kept in
//! state under `<attribute>_hash` so a changed secret can be detected without the
//! API ever echoing the secret back.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::ProviderError;

/// Suffix of the computed attribute that holds a secret's memo.
pub const MEMO_SUFFIX: &str = "_hash";

pub fn memo_key(secret_key: &str) -> String {
    format!("{secret_key}{MEMO_SUFFIX}")
}

/// Hash a secret using Argon2id (19MB memory, 2 iterations, parallelism 1).
pub fn hash(secret: &str) -> Result<String, ProviderError> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| ProviderError::Validation(format!("invalid memo params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ProviderError::Validation(format!("hashing secret failed: {e}")))
}

/// Verify a secret against a memo.
pub fn verify(secret: &str, memo: &str) -> Result<bool, ProviderError> {
    let parsed = PasswordHash::new(memo)
        .map_err(|e| ProviderError::Validation(format!("invalid secret memo: {e}")))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// True when `new_secret` is the secret `memo` was taken from. An empty secret
/// matches only an empty memo.
fn unchanged(new_secret: &str, memo: &str) -> Result<bool, ProviderError> {
    match (new_secret.is_empty(), memo.is_empty()) {
        (true, empty_memo) => Ok(empty_memo),
        (false, true) => Ok(false),
        (false, false) => verify(new_secret, memo),
    }
}

/// Decide whether `new_secret` differs from the secret `memo` was taken from.
///
/// Returns the memo to store next: the old one when nothing changed, a fresh
/// hash otherwise. An empty secret always maps to an empty memo.
pub fn is_updating(new_secret: &str, memo: &str) -> Result<(bool, String), ProviderError> {
    if unchanged(new_secret, memo).unwrap_or(false) {
        return Ok((false, memo.to_string()));
    }
    if new_secret.is_empty() {
        return Ok((true, String::new()));
    }
    Ok((true, hash(new_secret)?))
}

/// True when a planned secret value matches the memo already in state, so the
/// apparent change is only the API blanking the value out.
pub fn suppress_diff(new_secret: &str, memo: &str) -> bool {
    unchanged(new_secret, memo).unwrap_or_else(|e| {
        tracing::warn!("Change forced, secret memo could not be checked: {e}");
        false
    })
}

/// Refresh `memo` in place for the secret currently configured.
pub fn refresh(secret: &str, memo: &mut String) -> Result<(), ProviderError> {
    let (changed, next) = is_updating(secret, memo)?;
    if changed {
        tracing::debug!("Secret changed, memo refreshed");
    }
    *memo = next;
    Ok(())
}
