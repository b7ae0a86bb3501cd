//! Common utilities and helper functions

use std::time::Duration;

use rand::Rng;

/// Jittered politeness delay: `base + rand([0, base/2])`
///
/// Applied between listing pages, around detail fetches, and between comment
/// pages, with a mode-specific base.
pub fn politeness_delay(base_ms: u64) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
    Duration::from_millis(base_ms + jitter)
}

/// Sleep for a jittered politeness interval
pub async fn polite_sleep(base_ms: u64) {
    tokio::time::sleep(politeness_delay(base_ms)).await;
}

/// Parse the trailing integer of a label such as `댓글 1,234`
///
/// Commas are stripped; returns `None` when no digits are present.
pub fn trailing_int(text: &str) -> Option<i64> {
    let cleaned = text.replace(',', "");
    let digits: String = cleaned
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_politeness_delay_bounds() {
        for _ in 0..100 {
            let delay = politeness_delay(1000);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_trailing_int() {
        assert_eq!(trailing_int("댓글 42"), Some(42));
        assert_eq!(trailing_int("1,234"), Some(1234));
        assert_eq!(trailing_int("[2,345]"), None); // bracket ends the run
        assert_eq!(trailing_int("없음"), None);
    }
}
