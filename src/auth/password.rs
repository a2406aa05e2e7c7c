use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use super::AuthError;

/// Argon2id hasher keyed with the application secret as pepper.
fn hasher(pepper: &[u8]) -> Result<Argon2<'_>, AuthError> {
    Argon2::new_with_secret(pepper, Algorithm::Argon2id, Version::V0x13, Params::default())
        .map_err(|e| AuthError::InternalError(format!("argon2 setup failed: {}", e)))
}

/// PHC string for `password`.
pub fn hash_password(password: &str, pepper: &[u8]) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(pepper)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::InternalError(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// False for a wrong password as well as for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str, pepper: &[u8]) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    let Ok(argon) = hasher(pepper) else {
        return false;
    };
    argon.verify_password(password.as_bytes(), &parsed).is_ok()
}
