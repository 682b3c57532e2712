//! Deterministic FNV-1a hashing for address derivation and state digests.

use puzzlepool_felt::Felt;

/// A simple deterministic hash. Not cryptographic.
///
/// Used to derive contract addresses from the deploy nonce and to digest
/// contract storage so two runs can be compared cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed a u64 into the hash.
    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Feed a string, length-prefixed so adjacent strings cannot alias.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write(s.as_bytes());
    }

    /// Feed a field element.
    pub fn write_felt(&mut self, v: Felt) {
        self.write(&v.value().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_hash_deterministic() {
        let mut h1 = StateHash::new();
        h1.write_u64(42);
        h1.write_str("chef");

        let mut h2 = StateHash::new();
        h2.write_u64(42);
        h2.write_str("chef");

        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn state_hash_order_matters() {
        let mut h1 = StateHash::new();
        h1.write_felt(Felt::from_u64(1));
        h1.write_felt(Felt::from_u64(2));

        let mut h2 = StateHash::new();
        h2.write_felt(Felt::from_u64(2));
        h2.write_felt(Felt::from_u64(1));

        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn length_prefix_separates_strings() {
        let mut h1 = StateHash::new();
        h1.write_str("ab");
        h1.write_str("c");

        let mut h2 = StateHash::new();
        h2.write_str("a");
        h2.write_str("bc");

        assert_ne!(h1.finish(), h2.finish());
    }
}
