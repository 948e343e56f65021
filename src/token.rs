//! Token issuer (§4.H).
//!
//! Two independent 64-bit Mersenne-Twister streams, seeded once from a
//! non-deterministic source. A token is the concatenation of each stream's
//! next output rendered as 16 lowercase hex chars (leading zeros preserved),
//! for 32 characters total. Shares no state with the spawn-position PRNGs
//! owned by each `Map`.

use rand::RngCore;
use rand_mt::Mt19937GenRand64;

pub struct TokenIssuer {
    stream_a: Mt19937GenRand64,
    stream_b: Mt19937GenRand64,
}

impl TokenIssuer {
    pub fn new() -> Self {
        let seed_a = rand::random::<u64>();
        let seed_b = rand::random::<u64>();
        Self {
            stream_a: Mt19937GenRand64::new(seed_a),
            stream_b: Mt19937GenRand64::new(seed_b),
        }
    }

    /// Draws the next token. Collisions are treated as astronomically
    /// improbable; no dedup check is performed here (§4.H).
    pub fn issue(&mut self) -> String {
        format!("{:016x}{:016x}", self.stream_a.next_u64(), self.stream_b.next_u64())
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates the shape clients must present in the `Authorization` header:
/// exactly 32 lowercase hex characters.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == 32 && token.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
