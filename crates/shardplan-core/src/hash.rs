//! Stable content hashes for plans, URIs and request objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// 32-byte BLAKE3 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }

    /// First eight bytes as an integer, for modulo bucketing.
    pub fn prefix_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(buf)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    Hash256(*blake3::hash(bytes).as_bytes())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash the JSON encoding of `v`. Field order follows the type definition,
/// so equal values hash equal across processes.
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256> {
    let bytes = serde_json::to_vec(v).map_err(|e| Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucketing_prefix_is_stable() {
        let a = hash_str("file:///data/part-0.json");
        assert_eq!(a, hash_str("file:///data/part-0.json"));
        assert_eq!(a.prefix_u64(), hash_str("file:///data/part-0.json").prefix_u64());
        assert_eq!(a.to_hex().len(), 64);
        assert_ne!(a, hash_str("file:///data/part-1.json"));
    }

    #[test]
    fn hex_matches_blake3_digest() {
        assert_eq!(
            hash_bytes(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
        assert_eq!(hash_str("plan").to_string(), blake3::hash(b"plan").to_hex().as_str());
    }
}
