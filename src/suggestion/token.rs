use rand::Rng;

use crate::database::Database;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const TOKEN_LENGTH: usize = 8;
const MAX_ATTEMPTS: usize = 5;

pub fn generate_suggestion_id() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_suggestion_id(candidate: &str) -> bool {
    candidate.len() == TOKEN_LENGTH
        && candidate
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Draws tokens until one is not yet in the store.
pub fn unused_suggestion_id(db: &Database) -> Result<String, anyhow::Error> {
    for _ in 0..MAX_ATTEMPTS {
        let id = generate_suggestion_id();
        if !db.suggestion_id_exists(&id)? {
            return Ok(id);
        }
        warn!("Suggestion id {} collided, drawing another", id);
    }
    anyhow::bail!("no free suggestion id after {} attempts", MAX_ATTEMPTS)
}
