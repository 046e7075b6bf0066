//! Mining Pool Matching
//!
//! Attributes a decoded coinbase script to a mining pool by scanning it for
//! known tags. Tags are tried in dictionary order and the first one found as a
//! case-sensitive substring wins.

use tracing::debug;

use crate::record::TransactionRecord;
use crate::tags::{TagDictionary, TagEntry};

/// Find the first dictionary entry whose tag occurs in `text`
///
/// # Arguments
/// * `text` - Decoded coinbase script
/// * `dictionary` - Tags in match order
///
/// # Returns
/// `Some(&TagEntry)` for the first matching tag, `None` otherwise
pub fn match_pool<'a>(text: &str, dictionary: &'a TagDictionary) -> Option<&'a TagEntry> {
    if text.is_empty() {
        return None;
    }
    dictionary.iter().find(|entry| text.contains(entry.tag.as_str()))
}

/// Match a decoded record and attach the pool name and link.
///
/// Scans `decoded_utf8`, or `decoded_ascii` when the UTF-8 view is empty.
/// Records that already carry a pool are left alone.
pub fn match_record<'a>(
    record: &mut TransactionRecord,
    dictionary: &'a TagDictionary,
) -> Option<&'a TagEntry> {
    if record.is_matched() {
        return None;
    }

    let entry = match_pool(record.match_text(), dictionary)?;
    debug!(tx_hash = %record.tx_hash, tag = %entry.tag, pool = %entry.name, "Matched pool");
    record.apply_pool(entry);
    Some(entry)
}

/// Per-pool match counts in dictionary order, pools with no matches omitted
pub fn pool_counts(records: &[TransactionRecord], dictionary: &TagDictionary) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for entry in dictionary.iter() {
        if counts.iter().any(|(name, _)| name == &entry.name) {
            continue;
        }
        let count = records
            .iter()
            .filter(|r| r.pool_name.as_deref() == Some(entry.name.as_str()))
            .count();
        if count > 0 {
            counts.push((entry.name.clone(), count));
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &str, name: &str, link: &str) -> TagEntry {
        TagEntry {
            tag: tag.to_string(),
            name: name.to_string(),
            link: link.to_string(),
        }
    }

    fn dictionary() -> TagDictionary {
        TagDictionary::from_entries(vec![
            entry("Pool Tag", "Tagged Pool", "https://tagged.example"),
            entry("/slush/", "SlushPool", "https://slushpool.com"),
            entry("/F2Pool/", "F2Pool", "https://www.f2pool.com"),
            entry("F2Pool", "F2Pool Legacy", "https://legacy.f2pool.com"),
        ])
    }

    fn decoded(utf8: &str, ascii: &str) -> TransactionRecord {
        let mut record = TransactionRecord::new("", "abc123", "2023-10-01", "2023-10-01");
        record.decoded_utf8 = utf8.to_string();
        record.decoded_ascii = ascii.to_string();
        record
    }

    // ==================== match_pool tests ====================

    #[test]
    fn test_match_pool_substring() {
        let dict = dictionary();
        let found = match_pool("...xx Pool Tag yy", &dict).unwrap();
        assert_eq!(found.name, "Tagged Pool");
        assert_eq!(found.link, "https://tagged.example");
    }

    #[test]
    fn test_match_pool_no_match() {
        assert!(match_pool("hello", &dictionary()).is_none());
    }

    #[test]
    fn test_match_pool_is_case_sensitive() {
        assert!(match_pool("pool tag", &dictionary()).is_none());
        assert!(match_pool("/SLUSH/", &dictionary()).is_none());
    }

    #[test]
    fn test_match_pool_first_in_dictionary_order_wins() {
        // Both "/F2Pool/" and "F2Pool" occur; "/F2Pool/" comes first
        let dict = dictionary();
        let found = match_pool("Mined by /F2Pool/", &dict).unwrap();
        assert_eq!(found.name, "F2Pool");

        let reversed = TagDictionary::from_entries(vec![
            entry("F2Pool", "F2Pool Legacy", "https://legacy.f2pool.com"),
            entry("/F2Pool/", "F2Pool", "https://www.f2pool.com"),
        ]);
        let found = match_pool("Mined by /F2Pool/", &reversed).unwrap();
        assert_eq!(found.name, "F2Pool Legacy");
    }

    #[test]
    fn test_match_pool_empty_text() {
        assert!(match_pool("", &dictionary()).is_none());
    }

    #[test]
    fn test_match_pool_empty_dictionary() {
        assert!(match_pool("Pool Tag", &TagDictionary::default()).is_none());
    }

    // ==================== match_record tests ====================

    #[test]
    fn test_match_record_sets_pool_fields() {
        let dict = dictionary();
        let mut record = decoded("abc Pool Tag", "abc Pool Tag");

        let found = match_record(&mut record, &dict);

        assert_eq!(found.map(|e| e.tag.as_str()), Some("Pool Tag"));
        assert_eq!(record.pool_name.as_deref(), Some("Tagged Pool"));
        assert_eq!(record.pool_link.as_deref(), Some("https://tagged.example"));
    }

    #[test]
    fn test_match_record_no_match_leaves_fields_empty() {
        let mut record = decoded("hello", "hello");
        assert!(match_record(&mut record, &dictionary()).is_none());
        assert!(record.pool_name.is_none());
        assert!(record.pool_link.is_none());
    }

    #[test]
    fn test_match_record_uses_ascii_when_utf8_empty() {
        let mut record = decoded("", "..../slush/");
        match_record(&mut record, &dictionary());
        assert_eq!(record.pool_name.as_deref(), Some("SlushPool"));
    }

    #[test]
    fn test_match_record_ignores_ascii_when_utf8_present() {
        let mut record = decoded("no tag here", "/slush/");
        assert!(match_record(&mut record, &dictionary()).is_none());
    }

    #[test]
    fn test_match_record_does_not_rematch() {
        let dict = dictionary();
        let mut record = decoded("/slush/", "/slush/");
        record.pool_name = Some("Existing".to_string());
        record.pool_link = Some("https://existing.example".to_string());

        assert!(match_record(&mut record, &dict).is_none());
        assert_eq!(record.pool_name.as_deref(), Some("Existing"));
    }

    // ==================== pool_counts tests ====================

    #[test]
    fn test_pool_counts_in_dictionary_order() {
        let dict = dictionary();
        let mut records = vec![
            decoded("/F2Pool/", ""),
            decoded("/slush/", ""),
            decoded("/F2Pool/ again", ""),
            decoded("nothing", ""),
        ];
        for record in records.iter_mut() {
            match_record(record, &dict);
        }

        let counts = pool_counts(&records, &dict);
        assert_eq!(
            counts,
            vec![("SlushPool".to_string(), 1), ("F2Pool".to_string(), 2)]
        );
    }
}
