//! The legacy Adobe "San Jose" authentication scheme (`authmod=adobe`).
//!
//! When a server requires authentication it rejects the first connect attempt with a
//! status description carrying `reason=needauth` plus `user`, `salt`, and optionally
//! `opaque` or `challenge` query parameters.  The client is expected to reconnect with
//! a url that carries a salted MD5 challenge-response computed from those parameters
//! and the password.
//!
//! The url computation is a pure function of its inputs, with the client challenge
//! passed in explicitly, so the scheme can be tested deterministically.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use md5::{Digest, Md5};
use rand::Rng;

use uri::parse_query_pairs;

/// Generates a fresh 8 hex digit client challenge
pub fn generate_client_challenge() -> String {
    let value = rand::thread_rng().gen::<u32>();
    format!("{:08x}", value)
}

/// Computes the connect url for an authenticated retry.
///
/// The rejection description's query parameters supply the server's `salt`, `opaque`,
/// and `challenge` values.  If the description carries no query there is nothing to
/// respond to, and the url is returned unchanged.
pub fn make_auth_url(
    url: &str,
    user: &str,
    password: &str,
    description: &str,
    client_challenge: &str,
) -> String {
    let query = match description.find('?') {
        Some(index) => &description[index + 1..],
        None => return url.to_string(),
    };

    let mut salt = String::new();
    let mut opaque = None;
    let mut server_challenge = None;
    for (key, value) in parse_query_pairs(query) {
        match key.as_str() {
            "salt" => salt = value,
            "opaque" => opaque = Some(value),
            "challenge" => server_challenge = Some(value),
            _ => (),
        }
    }

    let mut url = url.to_string();
    let mut response = md5_base64(&format!("{}{}{}", user, salt, password));
    if let Some(opaque) = opaque {
        url.push_str("&opaque=");
        url.push_str(&opaque);
        response.push_str(&opaque);
    } else if let Some(server_challenge) = server_challenge {
        response.push_str(&server_challenge);
    }

    let response = md5_base64(&format!("{}{}", response, client_challenge));
    format!(
        "{}&challenge={}&response={}",
        url, client_challenge, response
    )
}

fn md5_base64(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    BASE64_STANDARD.encode(&digest)
}
