use chrono::{Days, NaiveDate, Utc};

use crate::error::DigestError;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str) -> Result<NaiveDate, DigestError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DigestError::MalformedDate {
        value: value.to_string(),
    })
}

/// Resolve the target date for a run.
///
/// Precedence: CLI positional > `--date` flag > `DATE` environment variable >
/// yesterday (UTC). Any malformed value is reported with the offending string
/// rather than silently falling through to the next source.
pub fn resolve_target_date(
    positional: Option<&str>,
    flag: Option<&str>,
    env_var: Option<&str>,
) -> Result<NaiveDate, DigestError> {
    if let Some(value) = positional {
        return parse_date(value);
    }
    if let Some(value) = flag {
        return parse_date(value);
    }
    if let Some(value) = env_var {
        return parse_date(value);
    }
    Ok(yesterday_utc())
}

fn yesterday_utc() -> NaiveDate {
    let today = Utc::now().date_naive();
    // Subtracting one day from any representable date cannot fail
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_wins_over_flag_and_env() {
        let date = resolve_target_date(
            Some("2025-05-20"),
            Some("2025-05-21"),
            Some("2025-05-22"),
        )
        .unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
    }

    #[test]
    fn test_flag_wins_over_env() {
        let date = resolve_target_date(None, Some("2025-05-21"), Some("2025-05-22")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 5, 21).unwrap());
    }

    #[test]
    fn test_env_used_when_nothing_else_given() {
        let date = resolve_target_date(None, None, Some("2025-05-22")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 5, 22).unwrap());
    }

    #[test]
    fn test_defaults_to_yesterday_utc() {
        let date = resolve_target_date(None, None, None).unwrap();
        let expected = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap();
        assert_eq!(date, expected);
    }

    #[test]
    fn test_malformed_env_reports_value() {
        let err = resolve_target_date(None, None, Some("22-05-2025")).unwrap_err();
        match err {
            DigestError::MalformedDate { value } => assert_eq!(value, "22-05-2025"),
            other => panic!("expected MalformedDate, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_positional_is_fatal_not_fallthrough() {
        // A bad positional must not fall through to the valid flag
        let err = resolve_target_date(Some("not-a-date"), Some("2025-05-21"), None).unwrap_err();
        assert!(matches!(err, DigestError::MalformedDate { .. }));
    }
}
