//! Signed-link token codec.
//!
//! A token is `HMAC-SHA256(secret, message)` rendered as lowercase hex. It
//! is the capability carried in confirmation and unsubscribe links: no
//! server-side session state, no nonce, no expiry. A token stays valid for
//! a given (secret, message) pair until the secret is rotated.
//!
//! Callers must pass an already-normalized message. The service signs over
//! [`dish_digest_core::Email`] values, which normalize at construction, so
//! subscribe-time and confirm-time inputs always agree.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the signed token for `message`.
///
/// Deterministic: identical inputs always yield the identical 64-character
/// lowercase hex token.
#[must_use]
pub fn sign(secret: &SecretString, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify `candidate` against the token for `message`.
///
/// Mismatched lengths return false immediately - leaking the expected
/// length is accepted, it is a public constant of the scheme. Equal-length
/// candidates are compared without short-circuiting so comparison progress
/// cannot be observed through timing.
#[must_use]
pub fn verify(secret: &SecretString, message: &str, candidate: &str) -> bool {
    let expected = sign(secret, message);
    if expected.len() != candidate.len() {
        return false;
    }

    expected
        .bytes()
        .zip(candidate.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
