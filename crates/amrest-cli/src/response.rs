//! Normalization of response bodies into the JSON value that gets printed.

use serde_json::Value;
use tracing::warn;

use crate::client::{CliError, CliResult, RawResponse, is_client_error};
use crate::request::Envelope;
use crate::tree::{FilterPath, METADATA_ATTRIBUTES, strip_keys};

const NO_CONTENT: u16 = 204;

/// Output shaping selected on the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutputOptions {
    pub(crate) include_meta: bool,
    pub(crate) filter: FilterPath,
}

/// Result of one invocation: the status it ended with and, when there is
/// something to print, the value to print.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedResult {
    pub(crate) status: u16,
    pub(crate) value: Option<Value>,
}

/// Decode, unwrap, strip, and filter a response below 500.
///
/// Success bodies must be JSON. Error bodies (4xx) are shown as the server sent
/// them minus metadata; the path filter targets the success shape and is not
/// applied to them. An error body that is not JSON is logged and yields no
/// value.
pub(crate) fn normalize(
    response: &RawResponse,
    envelope: Envelope,
    options: &OutputOptions,
) -> CliResult<NormalizedResult> {
    let status = response.status;
    if status >= 500 {
        return Err(CliError::Server {
            status,
            body: String::from_utf8_lossy(&response.body).trim().to_string(),
        });
    }

    if is_client_error(status) {
        let value = match serde_json::from_slice::<Value>(&response.body) {
            Ok(mut value) => {
                strip_metadata(&mut value, options);
                Some(value)
            }
            Err(err) => {
                warn!(
                    status,
                    error = %err,
                    body = %String::from_utf8_lossy(&response.body).trim(),
                    "error response is not JSON"
                );
                None
            }
        };
        return Ok(NormalizedResult { status, value });
    }

    let mut value = if status == NO_CONTENT && response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body)
            .map_err(|err| CliError::decode("response body", err))?
    };

    if envelope == Envelope::Paged {
        value = unwrap_envelope(value)?;
    }
    strip_metadata(&mut value, options);
    if !options.filter.is_empty() {
        value = options.filter.apply(value)?;
    }

    Ok(NormalizedResult {
        status,
        value: Some(value),
    })
}

fn unwrap_envelope(value: Value) -> CliResult<Value> {
    match value {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| CliError::decode("query response", "missing 'result' field")),
        other => Err(CliError::decode(
            "query response",
            format!("expected an object, found {other}"),
        )),
    }
}

fn strip_metadata(value: &mut Value, options: &OutputOptions) {
    if !options.include_meta {
        strip_keys(value, &METADATA_ATTRIBUTES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    fn options(filter: &str) -> OutputOptions {
        OutputOptions {
            filter: filter.parse().unwrap_or_default(),
            ..OutputOptions::default()
        }
    }

    fn normalized(
        response: &RawResponse,
        envelope: Envelope,
        options: &OutputOptions,
    ) -> Option<Value> {
        normalize(response, envelope, options)
            .ok()
            .and_then(|result| result.value)
    }

    #[test]
    fn paged_responses_unwrap_result() {
        let body = r#"{"result": [{"name": "a", "creationDate": "x"}], "resultCount": 1,
            "pagedResultsCookie": null, "remainingPagedResults": -1}"#;
        assert_eq!(
            normalized(&raw(200, body), Envelope::Paged, &options("")),
            Some(json!([{"name": "a"}]))
        );
    }

    #[test]
    fn single_responses_pass_through() {
        let body = r#"{"name": "p1", "createdBy": "x", "result": "kept"}"#;
        assert_eq!(
            normalized(&raw(201, body), Envelope::Single, &options("")),
            Some(json!({"name": "p1", "result": "kept"}))
        );
    }

    #[test]
    fn metadata_is_kept_when_requested() {
        let body = r#"{"name": "p1", "createdBy": "x"}"#;
        let keep = OutputOptions {
            include_meta: true,
            ..OutputOptions::default()
        };
        assert_eq!(
            normalized(&raw(200, body), Envelope::Single, &keep),
            Some(json!({"name": "p1", "createdBy": "x"}))
        );
    }

    #[test]
    fn filter_applies_after_unwrapping() {
        let body = r#"{"result": [{"name": "a"}, {"name": "b"}]}"#;
        assert_eq!(
            normalized(&raw(200, body), Envelope::Paged, &options(".1.name")),
            Some(json!("b"))
        );
    }

    #[test]
    fn filter_misses_are_errors() {
        let body = r#"{"result": []}"#;
        assert!(matches!(
            normalize(&raw(200, body), Envelope::Paged, &options("0")),
            Err(CliError::FilterPath(_))
        ));
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        for envelope in [Envelope::Paged, Envelope::Single] {
            let err = normalize(&raw(200, "<html>oops</html>"), envelope, &options("")).err();
            assert!(matches!(err, Some(CliError::Decode { .. })));
        }
    }

    #[test]
    fn paged_body_without_result_is_a_decode_error() {
        assert!(matches!(
            normalize(&raw(200, r#"{"items": []}"#), Envelope::Paged, &options("")),
            Err(CliError::Decode { .. })
        ));
        assert!(matches!(
            normalize(&raw(200, "[]"), Envelope::Paged, &options("")),
            Err(CliError::Decode { .. })
        ));
    }

    #[test]
    fn client_error_bodies_are_kept_unfiltered() -> Result<(), CliError> {
        let body = r#"{"code": 404, "reason": "Not Found", "message": "Resource 'x' not found"}"#;
        let result = normalize(&raw(404, body), Envelope::Paged, &options("result.0"))?;
        assert_eq!(result.status, 404);
        assert_eq!(
            result.value,
            Some(json!({"code": 404, "reason": "Not Found", "message": "Resource 'x' not found"}))
        );
        Ok(())
    }

    #[test]
    fn non_json_client_error_yields_no_value() -> Result<(), CliError> {
        let result = normalize(&raw(403, "Forbidden"), Envelope::Single, &options(""))?;
        assert_eq!(
            result,
            NormalizedResult {
                status: 403,
                value: None
            }
        );
        Ok(())
    }

    #[test]
    fn no_content_is_null() -> Result<(), CliError> {
        let result = normalize(&raw(204, ""), Envelope::Single, &options(""))?;
        assert_eq!(result.value, Some(Value::Null));
        Ok(())
    }

    #[test]
    fn server_errors_are_never_parsed() {
        assert!(matches!(
            normalize(&raw(500, "{\"result\": []}"), Envelope::Paged, &options("")),
            Err(CliError::Server { status: 500, .. })
        ));
    }
}
