// src/validation.rs

//! Trigger parameter validation.
//!
//! Checks run in a fixed order (`date_from`, `search_term`, `stream_id`) and
//! stop at the first failure.

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{PipelineRequest, TriggerEvent};

/// Validate a full trigger event against today's UTC date.
pub fn validate_event(event: &TriggerEvent) -> Result<PipelineRequest> {
    validate_event_at(event, Utc::now().date_naive())
}

/// Validate a full trigger event against a given `today`.
pub fn validate_event_at(event: &TriggerEvent, today: NaiveDate) -> Result<PipelineRequest> {
    let date_from = validate_date_at(event.date_from.as_ref(), today)?;
    let search_term = validate_id(event.search_term.as_ref(), "search_term")?;
    let stream_id = validate_id(event.stream_id.as_ref(), "stream_id")?;

    Ok(PipelineRequest {
        date_from,
        search_term,
        stream_id,
    })
}

/// Validate `date_from`: a `YYYY-MM-DD` string strictly before today (UTC).
pub fn validate_date(value: Option<&Value>) -> Result<NaiveDate> {
    validate_date_at(value, Utc::now().date_naive())
}

/// Validate `date_from` against a given `today`.
pub fn validate_date_at(value: Option<&Value>, today: NaiveDate) -> Result<NaiveDate> {
    let raw = match value {
        Some(Value::String(s)) => s,
        _ => return Err(AppError::InputType { field: "date_from" }),
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AppError::DateFormat {
        value: raw.clone(),
    })?;

    if date >= today {
        return Err(AppError::DateNotPast { value: raw.clone() });
    }
    Ok(date)
}

/// Validate an identifier-like string parameter.
pub fn validate_id(value: Option<&Value>, field: &'static str) -> Result<String> {
    let raw = match value {
        Some(Value::String(s)) => s,
        _ => return Err(AppError::InputType { field }),
    };

    if raw.is_empty() {
        return Err(AppError::InputEmpty { field });
    }
    if raw.trim().is_empty() {
        return Err(AppError::InputWhitespace { field });
    }
    Ok(raw.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_valid_dates() {
        for date in ["2024-01-01", "1992-05-05", "0001-01-01", "2024-05-31"] {
            let value = json!(date);
            assert!(validate_date_at(Some(&value), today()).is_ok(), "{date}");
        }
    }

    #[test]
    fn test_non_string_date() {
        for value in [json!(14), json!([]), json!(null)] {
            assert!(matches!(
                validate_date_at(Some(&value), today()),
                Err(AppError::InputType { field: "date_from" })
            ));
        }
        assert!(matches!(
            validate_date_at(None, today()),
            Err(AppError::InputType { field: "date_from" })
        ));
    }

    #[test]
    fn test_bad_date_format() {
        for date in ["Hello World", "0000-00-00", "", "2022-DD01-01", "2024/01/01"] {
            let value = json!(date);
            assert!(
                matches!(
                    validate_date_at(Some(&value), today()),
                    Err(AppError::DateFormat { .. })
                ),
                "{date}"
            );
        }
    }

    #[test]
    fn test_date_not_in_past() {
        for date in ["3020-01-01", "2024-06-01"] {
            let value = json!(date);
            assert!(matches!(
                validate_date_at(Some(&value), today()),
                Err(AppError::DateNotPast { .. })
            ));
        }
    }

    #[test]
    fn test_validate_id() {
        let ok = json!("test_stream");
        assert_eq!(validate_id(Some(&ok), "stream_id").unwrap(), "test_stream");

        let empty = json!("");
        assert!(matches!(
            validate_id(Some(&empty), "stream_id"),
            Err(AppError::InputEmpty { field: "stream_id" })
        ));

        let blank = json!("   ");
        assert!(matches!(
            validate_id(Some(&blank), "search_term"),
            Err(AppError::InputWhitespace {
                field: "search_term"
            })
        ));

        let number = json!(123);
        assert!(matches!(
            validate_id(Some(&number), "search_term"),
            Err(AppError::InputType {
                field: "search_term"
            })
        ));
    }

    #[test]
    fn test_event_short_circuits_on_date() {
        let event = TriggerEvent {
            date_from: Some(json!("2022-DD01-01")),
            search_term: Some(json!(123)),
            stream_id: Some(json!("")),
        };
        assert!(matches!(
            validate_event_at(&event, today()),
            Err(AppError::DateFormat { .. })
        ));
    }

    #[test]
    fn test_event_checks_search_term_before_stream_id() {
        let event = TriggerEvent {
            date_from: Some(json!("2022-01-01")),
            search_term: Some(json!("  ")),
            stream_id: Some(json!(42)),
        };
        assert!(matches!(
            validate_event_at(&event, today()),
            Err(AppError::InputWhitespace {
                field: "search_term"
            })
        ));
    }

    #[test]
    fn test_valid_event() {
        let event = TriggerEvent::new("2022-01-01", "football", "news");
        let request = validate_event_at(&event, today()).unwrap();
        assert_eq!(request.search_term, "football");
        assert_eq!(request.stream_id, "news");
        assert_eq!(request.date_from_param(), "2022-01-01");
    }
}
