use sha2::{Digest, Sha256};

/// Derives the archive identifier of a page from its URL
///
/// The id is the hex-encoded SHA-256 digest of the URL string, so harvesting
/// the same URL twice always produces the same entry name.
pub fn page_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_is_deterministic() {
        let a = page_id("https://example.com/page");
        let b = page_id("https://example.com/page");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_page_id_differs_per_url() {
        assert_ne!(
            page_id("https://example.com/page"),
            page_id("https://example.com/page/")
        );
    }

    #[test]
    fn test_page_id_is_path_safe() {
        let id = page_id("https://example.com/a b/../c?d=e#f");
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
