//! Interpreting responses: failure classification and mapping `data` onto typed results.

use super::error::{FirecrawlError, Result};
use super::http::ApiResponse;
use crate::model::ScrapeResult;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

const CREDIT_MARKERS: [&str; 4] = [
    "insufficient credits",
    "credits exceeded",
    "credit limit",
    "max credits",
];

/// Prefix for a status code, e.g. "Rate Limit Exceeded".
fn status_label(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Bad Request"),
        401 => Some("Unauthorized"),
        403 => Some("Website Not Supported"),
        404 => Some("Not Found"),
        408 => Some("Request Timeout"),
        409 => Some("Conflict"),
        429 => Some("Rate Limit Exceeded"),
        500 => Some("Internal Server Error"),
        _ => None,
    }
}

fn is_credit_exhaustion(status: u16, error: &str) -> bool {
    if status == 402 {
        return true;
    }
    let lower = error.to_lowercase();
    CREDIT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Classify a failed response (non-2xx, or 2xx with `success: false`). `action` reads like "scrape URL".
pub fn handle_response_error(response: &ApiResponse, action: &str) -> FirecrawlError {
    let status = response.status;
    let (error, details) = match response.json() {
        Some(body) => {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("No error message provided.")
                .to_string();
            let details = match body.get("details") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            (error, details)
        }
        None => (
            format!("Failed to parse response as JSON. Status: {}", status),
            None,
        ),
    };
    let detail_suffix = details.map(|d| format!(" - {}", d)).unwrap_or_default();

    if is_credit_exhaustion(status, &error) {
        let message = format!(
            "Max credits exceeded: Failed to {}. {}{}",
            action, error, detail_suffix
        );
        warn!("{}", message);
        return FirecrawlError::MaxCreditsExceeded {
            status: Some(status),
            message,
        };
    }

    let message = match status_label(status) {
        Some(label) => format!("{}: Failed to {}. {}{}", label, action, error, detail_suffix),
        None => format!(
            "Unexpected error during {}: Status code {}. {}{}",
            action, status, error, detail_suffix
        ),
    };
    warn!("{}", message);
    FirecrawlError::Api {
        status: Some(status),
        message,
    }
}

/// Unwrap a `{"success": true, "data": ...}` envelope into `T`.
pub fn map_data<T: DeserializeOwned>(response: &ApiResponse, action: &str) -> Result<T> {
    if !response.is_success() {
        return Err(handle_response_error(response, action));
    }
    let body = response.json().ok_or_else(|| FirecrawlError::Decode {
        action: action.to_string(),
        reason: "body is not valid JSON".to_string(),
    })?;
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(handle_response_error(response, action));
    }
    let data = match body.get("data") {
        Some(d @ Value::Object(_)) => d.clone(),
        Some(other) => {
            return Err(FirecrawlError::Decode {
                action: action.to_string(),
                reason: format!("'data' must be an object, got {}", other),
            })
        }
        None => {
            return Err(FirecrawlError::Decode {
                action: action.to_string(),
                reason: "response has no 'data'".to_string(),
            })
        }
    };
    serde_json::from_value(data).map_err(|e| FirecrawlError::Decode {
        action: action.to_string(),
        reason: e.to_string(),
    })
}

/// Map a scrape response onto [`ScrapeResult`].
pub fn map_scrape_response(response: &ApiResponse) -> Result<ScrapeResult> {
    map_data(response, "scrape URL")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ErrorKind;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn credit_exhaustion_by_message_is_max_credits() {
        let err = handle_response_error(
            &response(
                429,
                json!({"success": false, "error": "Insufficient credits to perform this request."}),
            ),
            "scrape URL",
        );
        assert_eq!(err.kind(), ErrorKind::MaxCreditsExceeded);
        assert_eq!(err.status_code(), Some(429));
        assert!(err.message().contains("Insufficient credits"));
    }

    #[test]
    fn credit_marker_wins_over_any_status() {
        for status in [400, 403, 500] {
            let err = handle_response_error(
                &response(
                    status,
                    json!({"success": false, "error": "Credit limit reached for this team"}),
                ),
                "scrape URL",
            );
            assert_eq!(err.kind(), ErrorKind::MaxCreditsExceeded, "status {}", status);
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn payment_required_is_max_credits() {
        let err = handle_response_error(
            &response(402, json!({"success": false, "error": "Payment required"})),
            "scrape URL",
        );
        assert!(matches!(err, FirecrawlError::MaxCreditsExceeded { .. }));
    }

    #[test]
    fn rate_limit_without_credit_marker_is_generic() {
        let err = handle_response_error(
            &response(
                429,
                json!({"success": false, "error": "Too many requests", "details": "retry in 10s"}),
            ),
            "scrape URL",
        );
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(
            err.message(),
            "Rate Limit Exceeded: Failed to scrape URL. Too many requests - retry in 10s"
        );
    }

    #[test]
    fn unknown_status_uses_unexpected_prefix() {
        let err = handle_response_error(
            &response(418, json!({"success": false})),
            "scrape URL",
        );
        assert_eq!(
            err.message(),
            "Unexpected error during scrape URL: Status code 418. No error message provided."
        );
    }

    #[test]
    fn non_json_error_body() {
        let err = handle_response_error(
            &ApiResponse {
                status: 502,
                body: "<html>Bad Gateway</html>".into(),
            },
            "scrape URL",
        );
        assert_eq!(err.status_code(), Some(502));
        assert!(err.message().contains("Failed to parse response as JSON. Status: 502"));
    }

    #[test]
    fn success_false_on_200_is_an_error() {
        let err = map_scrape_response(&response(
            200,
            json!({"success": false, "error": "All scraping engines failed"}),
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(200));
    }

    #[test]
    fn maps_markdown_and_change_tracking() -> Result<()> {
        let result = map_scrape_response(&response(
            200,
            json!({
                "success": true,
                "data": {
                    "markdown": "Test markdown content",
                    "changeTracking": {
                        "previousScrapeAt": "2023-01-01T00:00:00Z",
                        "changeStatus": "changed",
                        "visibility": "visible",
                        "json": {"title": {"previous": "Old Title", "current": "New Title"}},
                    },
                },
            }),
        ))?;
        assert_eq!(result.markdown.as_deref(), Some("Test markdown content"));
        let ct = result.change_tracking.ok_or_else(|| FirecrawlError::Decode {
            action: "test".into(),
            reason: "missing changeTracking".into(),
        })?;
        assert_eq!(ct["changeStatus"], "changed");
        assert_eq!(ct["json"]["title"]["previous"], "Old Title");
        assert_eq!(ct["json"]["title"]["current"], "New Title");
        Ok(())
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let err = map_scrape_response(&response(200, json!({"success": true}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn non_object_data_is_a_decode_error() {
        let err = map_scrape_response(&response(200, json!({"success": true, "data": []})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
