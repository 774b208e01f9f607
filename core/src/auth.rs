//! The two authentication headers the service understands.
//!
//! Every request may identify the developer with
//! `X-NAAMA-CLIENT-AUTHENTICATION`. Requests acting on a user account add
//! `X-NAAMA-AUTHENTICATION`, whose `response` is the hex SHA-256 of
//! `password ‖ email ‖ path`, where `path` is the percent-encoded request
//! path without the base URL. The concatenation order is fixed by the
//! service and must not change.

use sha2::{Digest, Sha256};

use crate::config::Credentials;

pub const CLIENT_AUTH_HEADER: &str = "X-NAAMA-CLIENT-AUTHENTICATION";
pub const USER_AUTH_HEADER: &str = "X-NAAMA-AUTHENTICATION";

pub fn client_auth_value(api_key: &str) -> String {
    format!("id=\"{api_key}\", version=\"1\"")
}

/// Hex SHA-256 over `password`, then `email`, then `path`.
pub fn user_auth_hash(password: &str, email: &str, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(email.as_bytes());
    hasher.update(path.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn user_auth_value(credentials: &Credentials, path: &str) -> String {
    let email = credentials.email();
    let response = user_auth_hash(credentials.password(), email, path);
    format!("username=\"{email}\", response=\"{response}\", version=\"1\"")
}
