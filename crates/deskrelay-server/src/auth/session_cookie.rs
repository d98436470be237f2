// Session cookie helpers
// Decision: The cookie carries only the opaque session id, signed with a key derived from SESSION_SECRET
// Decision: HttpOnly + SameSite=Lax; Secure is opt-in so plain-HTTP dev setups keep working

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};

use crate::config::CookieConfig;

/// Stretch an arbitrary-length secret into a 64-byte signing key
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Session id from a verified cookie. Tampered or missing cookies read as `None`.
pub fn session_id(jar: &SignedCookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value().to_string())
}

pub fn session_cookie(
    config: &CookieConfig,
    session_id: String,
    max_age: chrono::Duration,
) -> Cookie<'static> {
    Cookie::build((config.name.clone(), session_id))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::milliseconds(max_age.num_milliseconds()))
        .build()
}

pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), String::new()))
        .path("/")
        .build()
}
