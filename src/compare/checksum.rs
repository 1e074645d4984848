//! Checksum calculation for object definitions

use md5::{Digest, Md5};

/// Number of trailing hex digits kept from the MD5 digest
pub const CHECKSUM_LEN: usize = 10;

/// Collapse every run of whitespace to one space and trim both ends
pub fn collapse_whitespace(definition: &str) -> String {
    definition.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Checksum of a definition
///
/// The definition is whitespace-collapsed first, so formatting-only edits do
/// not change the result. A `NULL` definition hashes like the empty string;
/// it is still a real checksum, not an absence marker.
///
/// Returns the last [`CHECKSUM_LEN`] lowercase hex digits of the MD5 digest.
pub fn definition_checksum(definition: Option<&str>) -> String {
    let collapsed = collapse_whitespace(definition.unwrap_or_default());
    let digest = Md5::digest(collapsed.as_bytes());
    let hex = format!("{:x}", digest);
    hex[hex.len() - CHECKSUM_LEN..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_digest_suffix() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(definition_checksum(Some("")), "98ecf8427e");
        assert_eq!(definition_checksum(None), definition_checksum(Some("")));
        assert_eq!(definition_checksum(None).len(), CHECKSUM_LEN);
    }

    #[test]
    fn test_whitespace_only_edits_match() {
        let a = definition_checksum(Some("SELECT  1"));
        let b = definition_checksum(Some("SELECT\n1"));
        let c = definition_checksum(Some("\t SELECT 1 \r\n"));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(collapse_whitespace("SELECT\n\n   1"), "SELECT 1");
    }

    #[test]
    fn test_text_changes_differ() {
        assert_ne!(
            definition_checksum(Some("SELECT 1")),
            definition_checksum(Some("SELECT 2"))
        );
        assert_ne!(definition_checksum(Some("SELECT 1")), definition_checksum(None));
    }

    proptest! {
        #[test]
        fn prop_reformatting_keeps_checksum(
            words in prop::collection::vec("[A-Za-z0-9_();=*,.]{1,12}", 1..20),
            seps in prop::collection::vec("[ \t\r\n]{1,4}", 20),
        ) {
            let plain = words.join(" ");
            let mut spaced = String::from("  ");
            for (i, w) in words.iter().enumerate() {
                spaced.push_str(w);
                spaced.push_str(&seps[i]);
            }
            prop_assert_eq!(
                definition_checksum(Some(plain.as_str())),
                definition_checksum(Some(spaced.as_str()))
            );
        }

        #[test]
        fn prop_distinct_text_distinct_checksum(
            a in "[A-Za-z0-9_ ]{0,64}",
            b in "[A-Za-z0-9_ ]{0,64}",
        ) {
            prop_assume!(collapse_whitespace(&a) != collapse_whitespace(&b));
            prop_assert_ne!(
                definition_checksum(Some(a.as_str())),
                definition_checksum(Some(b.as_str()))
            );
        }
    }
}
