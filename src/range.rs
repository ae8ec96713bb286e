use chrono::{Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;

/// Fallback reporting window (Q2 2025) used whenever the range token is
/// missing or unrecognized. Unknown tokens are never an error.
pub static DEFAULT_WINDOW: Lazy<(NaiveDate, NaiveDate)> = Lazy::new(|| {
    (
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
    )
});

/// Maps a symbolic range token to a half-open `[start, end)` date window
/// anchored at today.
pub fn resolve(token: &str) -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    match token {
        "7d" => (today - Duration::days(7), today),
        "30d" => (today - Duration::days(30), today),
        "6mo" => (today - Duration::days(182), today),
        "1yr" => (today - Duration::days(365), today),
        _ => *DEFAULT_WINDOW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_span_the_fixed_day_counts() {
        for (token, days) in [("7d", 7), ("30d", 30), ("6mo", 182), ("1yr", 365)] {
            let (start, end) = resolve(token);
            assert!(start < end, "{token}");
            assert_eq!((end - start).num_days(), days, "{token}");
        }
    }

    #[test]
    fn unknown_tokens_fall_back_to_the_fixed_window() {
        for token in ["", "90d", "all", "7D", "six-months"] {
            let (start, end) = resolve(token);
            assert_eq!(start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
            assert_eq!(end, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        }
    }
}
