use axum::http::{header, HeaderMap};
use rand::{Rng, RngCore};

/// Bytes of entropy per token; the hex form is 40 characters.
pub const TOKEN_BYTES: usize = 20;

const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Characters drawn for generated secret keys
pub const SECRET_KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*(-_=+)";
pub const SECRET_KEY_LENGTH: usize = 50;

/// Fresh random token key, lowercase hex.
pub fn generate_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Random value for `APP__SECRET_KEY`.
pub fn generate_secret_key() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_KEY_LENGTH)
        .map(|_| SECRET_KEY_CHARS[rng.gen_range(0..SECRET_KEY_CHARS.len())] as char)
        .collect()
}

/// Token from `Authorization: Token <key>` or `Authorization: Bearer <key>`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return None;
    }
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}
