//! Generated identifiers: record ids, registration ids, session tokens and usernames.

use chrono::DateTime;
use chrono_tz::Tz;
use rand::{rngs::OsRng, Rng, RngCore};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SESSION_TOKEN_BYTES: usize = 32;

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// `PREFIX_YYYYMMDDHHMMSSXXX`
pub fn generate_id(prefix: &str, now: &DateTime<Tz>) -> String {
    format!(
        "{}_{}{}",
        prefix,
        now.format("%Y%m%d%H%M%S"),
        random_suffix(3)
    )
}

/// `REG-YYYYMMDDHHMMSS-XXXX`
pub fn generate_registration_id(now: &DateTime<Tz>) -> String {
    format!("REG-{}-{}", now.format("%Y%m%d%H%M%S"), random_suffix(4))
}

/// 256 bits from the OS RNG, hex encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lowercased alphanumerics of `name` with spaces turned into dots, suffixed with a counter
/// until `is_taken` reports the candidate free.
pub fn generate_username(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut base: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .flat_map(char::to_lowercase)
        .map(|c| if c == ' ' { '.' } else { c })
        .collect();
    if base.is_empty() {
        base = "user".to_string();
    }

    let mut candidate = base.clone();
    let mut counter = 1;
    while is_taken(&candidate) {
        candidate = format!("{}{}", base, counter);
        counter += 1;
    }
    candidate
}
