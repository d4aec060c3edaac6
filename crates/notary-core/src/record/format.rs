//! Display helpers for hashes and ledger timestamps

use chrono::DateTime;

/// Shorten a hash for display: `chars` leading characters, an ellipsis,
/// and the last six characters. Hashes of at most `2 * chars` characters
/// are returned unchanged.
pub fn short_hash(hash: &str, chars: usize) -> String {
    let count = hash.chars().count();
    if count <= chars * 2 {
        return hash.to_string();
    }
    let head: String = hash.chars().take(chars).collect();
    let tail: String = hash.chars().skip(count.saturating_sub(6)).collect();
    format!("{head}…{tail}")
}

/// Render a ledger timestamp (seconds since epoch) in UTC,
/// e.g. `Jan 1, 2024, 00:00`.
pub fn format_timestamp(secs: u64) -> String {
    match i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
    {
        Some(dt) => dt.format("%b %-d, %Y, %H:%M").to_string(),
        None => format!("{secs}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_long_values() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(short_hash(&hash, 10), "0xabababab…ababab");
    }

    #[test]
    fn short_hash_keeps_short_values() {
        assert_eq!(short_hash("0x1234", 10), "0x1234");
        assert_eq!(short_hash("01234567890123456789", 10), "01234567890123456789");
    }

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0), "Jan 1, 1970, 00:00");
        assert_eq!(format_timestamp(1_704_067_200), "Jan 1, 2024, 00:00");
        assert_eq!(format_timestamp(1_718_452_800), "Jun 15, 2024, 12:00");
    }
}
