//! # Credentials
//!
//! Salted password hashing, verification and the account rules that do not
//! need I/O. The breached-password check is asynchronous and lives in the
//! store crate; it runs between [`check_registration`] and [`create_account`].
//!
//! ## Registration Order
//! ```text
//! check_registration ── duplicate username? ── DuplicateUser
//!        │             └ weak password?     ── WeakPassword(all rules)
//!        ▼
//! breach check (store crate)               ── CompromisedPassword
//!        │                                    unreachable → proceed
//!        ▼
//! create_account ── fresh salt, hash, next id
//! ```
//!
//! ## Hash Format
//! `hex(SHA-256(password ‖ salt))`, lowercase. The salt is the hex text of 16
//! random bytes and is appended as text, not as raw bytes.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::catalog::next_id;
use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User};
use crate::validation::{password_violations, validate_username};

const SALT_BYTES: usize = 16;

/// Hashes `password ‖ salt` with SHA-256 and returns lowercase hex.
///
/// ## Example
/// ```rust
/// use stockroom_core::credentials::hash_password;
///
/// let hash = hash_password("Secret123", "00ff");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_password("Secret123", "00ff"));
/// assert_ne!(hash, hash_password("Secret123", "00fe"));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns 16 bytes from the OS random source, hex-encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0_u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares two byte strings without an early exit on the first mismatch.
///
/// Lengths are compared up front; hex digests of one algorithm always have
/// the same length, so that branch leaks nothing useful.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Recomputes the hash with the user's stored salt and compares.
pub fn verify_password(user: &User, password: &str) -> bool {
    let candidate = hash_password(password, &user.salt);
    constant_time_eq(candidate.as_bytes(), user.password_hash.as_bytes())
}

/// Synchronous registration checks, in order: username shape, uniqueness,
/// password strength.
pub fn check_registration(users: &[User], username: &str, password: &str) -> CoreResult<()> {
    validate_username(username)?;

    if users.iter().any(|u| u.username == username) {
        return Err(CoreError::DuplicateUser(username.to_string()));
    }

    let violations = password_violations(password);
    if !violations.is_empty() {
        return Err(CoreError::WeakPassword(violations));
    }

    Ok(())
}

/// Salts, hashes and appends a new account.
///
/// Callers run [`check_registration`] first; the uniqueness check is
/// repeated here because the breach check runs between the two.
pub fn create_account(
    users: &mut Vec<User>,
    username: &str,
    password: &str,
    role: Role,
    created_at: DateTime<Utc>,
) -> CoreResult<User> {
    if users.iter().any(|u| u.username == username) {
        return Err(CoreError::DuplicateUser(username.to_string()));
    }

    let salt = generate_salt();
    let user = User {
        id: next_id(users.iter().map(|u| u.id)),
        username: username.to_string(),
        password_hash: hash_password(password, &salt),
        salt,
        created_at,
        role,
    };
    users.push(user.clone());
    Ok(user)
}

/// Finds `username` and verifies `password` against it.
pub fn authenticate<'a>(users: &'a [User], username: &str, password: &str) -> CoreResult<&'a User> {
    let user = users
        .iter()
        .find(|u| u.username == username)
        .ok_or_else(|| CoreError::UnknownUser(username.to_string()))?;

    if verify_password(user, password) {
        Ok(user)
    } else {
        Err(CoreError::BadPassword)
    }
}
