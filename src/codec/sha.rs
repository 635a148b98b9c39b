use sha1::{Digest, Sha1};

/// Lowercase 40-character hex SHA-1 digest of `bytes`.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(sha1_raw(bytes))
}

/// Raw 20-byte SHA-1 digest of `bytes`.
pub fn sha1_raw(bytes: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_empty_blob_envelope() {
        let envelope = b"blob 0\0";
        assert_eq!(sha1_hex(envelope), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn hashes_hello_blob_envelope() {
        let mut envelope = b"blob 5\0".to_vec();
        envelope.extend_from_slice(b"hello");
        assert_eq!(sha1_hex(&envelope), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }

    #[test]
    fn raw_and_hex_agree() {
        let raw = sha1_raw(b"some bytes");
        assert_eq!(hex::encode(raw), sha1_hex(b"some bytes"));
    }
}
