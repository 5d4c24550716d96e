//! Credential generation and password hashing.

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lazy_static::lazy_static;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use super::types::AuthError;

/// Length of generated client identifiers.
pub const CLIENT_ID_LEN: usize = 40;
/// Length of generated client secrets.
pub const CLIENT_SECRET_LEN: usize = 50;
/// Length of generated authorization codes.
pub const AUTH_CODE_LEN: usize = 40;
/// Length of generated access and refresh tokens.
pub const TOKEN_LEN: usize = 40;

const PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const PBKDF2_ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

lazy_static! {
    static ref RNG: SystemRandom = SystemRandom::new();
}

/// Produces a cryptographically unpredictable printable string of exactly
/// `length` characters, suitable as a client id, client secret,
/// authorization code or bearer token.
///
/// The codec does no uniqueness checking; collisions surface as store-level
/// conflicts and are retried by the caller.
pub fn generate(length: usize) -> Result<String, AuthError> {
    // base64url yields 4 chars per 3 bytes; over-provision and truncate.
    let mut buf = vec![0u8; length * 3 / 4 + 3];
    RNG.fill(&mut buf)
        .map_err(|_| AuthError::Internal("system randomness unavailable".into()))?;
    let mut encoded = URL_SAFE_NO_PAD.encode(&buf);
    encoded.truncate(length);
    Ok(encoded)
}

/// Hashes a clear-text password for storage as `salt$hash`, both parts
/// base64url-encoded.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; SALT_LEN];
    RNG.fill(&mut salt)
        .map_err(|_| AuthError::Internal("system randomness unavailable".into()))?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut hash,
    );
    Ok(format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    ))
}

/// Verifies a clear-text password against a stored `salt$hash` value.
/// A malformed stored value verifies as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_part, hash_part)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (
        URL_SAFE_NO_PAD.decode(salt_part),
        URL_SAFE_NO_PAD.decode(hash_part),
    ) else {
        return false;
    };
    pbkdf2::verify(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}
