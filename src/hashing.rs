//! Content hashing for cache-busting filenames.
//!
//! Hashes cover the final encoded bytes and nothing else (no mtimes, no
//! paths), so identical inputs always produce identical filenames.

use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_LEN: usize = 10;

/// Truncated SHA-256 of `bytes`, lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    digest[..HASH_LEN].to_string()
}

/// Truncated SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(content_hash(&bytes))
}

/// Build `<stem>.<size_tag>.<hash>.<ext>`, or `<stem>.<hash>.<ext>` without a size tag.
pub fn hashed_filename(stem: &str, size_tag: Option<&str>, hash: &str, ext: &str) -> String {
    match size_tag {
        Some(tag) => format!("{stem}.{tag}.{hash}.{ext}"),
        None => format!("{stem}.{hash}.{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_truncated_lowercase_hex() {
        let hash = content_hash(b"hello");
        // sha256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e...
        assert_eq!(hash, "2cf24dba5f");
        assert_eq!(hash.len(), HASH_LEN);
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"same bytes"), content_hash(b"same bytes"));
        assert_ne!(content_hash(b"same bytes"), content_hash(b"other bytes"));
    }

    #[test]
    fn hash_file_ignores_file_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("a.svg");
        let b = tmp.path().join("nested-b.svg");
        std::fs::write(&a, "<svg/>").unwrap();
        std::fs::write(&b, "<svg/>").unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn hashed_filename_with_size_tag() {
        assert_eq!(
            hashed_filename("column_1", Some("400x300"), "abcdef0123", "webp"),
            "column_1.400x300.abcdef0123.webp"
        );
    }

    #[test]
    fn hashed_filename_without_size_tag() {
        assert_eq!(
            hashed_filename("logo", None, "abcdef0123", "svg"),
            "logo.abcdef0123.svg"
        );
    }
}
