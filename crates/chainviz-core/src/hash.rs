use sha2::{Digest, Sha256};

/// Digest of a block's five hashed fields.
///
/// The preimage is the fields concatenated in the order
/// `index, previous_hash, timestamp, data, nonce`, integers rendered as
/// base-10 text with no separators. Blocks link to each other through this
/// digest, so the layout must never change.
pub fn digest(index: u64, previous_hash: &str, timestamp: u64, data: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 of arbitrary text.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Number of leading `'0'` characters in a hex digest.
pub fn leading_zero_chars(hash: &str) -> u32 {
    hash.chars().take_while(|c| *c == '0').count() as u32
}

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
