use crate::call::Call;
use crate::error::{CallFailure, TransportError};
use crate::response::{CallResult, ResponseFormat};
use crate::transport::TransportOutcome;

/// Longest body prefix kept in an unacceptable-status message.
const STATUS_MESSAGE_LIMIT: usize = 512;

/// Turns a raw transport outcome into the call's result envelope.
///
/// A transport error wins over any body. A status outside the call's
/// acceptable range is an error even if the body would parse.
pub(crate) fn transform<F: ResponseFormat>(
    call: &Call<F>,
    outcome: TransportOutcome,
) -> CallResult<F::Output> {
    let TransportOutcome {
        response,
        body,
        error,
    } = outcome;

    if let Some(error) = error {
        return CallResult::failure(error, response);
    }

    let Some(response) = response else {
        return CallResult::failure(TransportError::BadServerResponse, None);
    };

    let encoding = response.text_encoding();
    if !call.accepts(response.status()) {
        let message = body
            .as_ref()
            .and_then(|b| encoding.decode(b).ok())
            .map(|text| text.chars().take(STATUS_MESSAGE_LIMIT).collect())
            .unwrap_or_default();
        return CallResult::failure(
            CallFailure::UnacceptableStatus {
                status: response.status(),
                message,
            },
            Some(response),
        );
    }

    match F::parse(body.as_ref(), encoding) {
        Ok(value) => CallResult::success(value, Some(response)),
        Err(e) => CallResult::failure(e, Some(response)),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::error::ParseError;
    use crate::response::{JsonArray, JsonObject, ResponseMetadata, TextFormat};

    fn object_call() -> Call<JsonObject> {
        Call::get("get").build()
    }

    #[test]
    fn parsed_body_is_success() {
        let outcome = TransportOutcome::received(ResponseMetadata::new(200), r#"{"args":{}}"#);
        let result = transform(&object_call(), outcome);
        assert!(result.is_success());
        assert!(result.value().unwrap().contains_key("args"));
        assert_eq!(result.status_code(), Some(200));
    }

    #[test]
    fn error_wins_over_body() {
        let outcome = TransportOutcome::received(ResponseMetadata::new(200), r#"{"a":1}"#)
            .with_error(TransportError::Other("reset".into()));
        let result = transform(&object_call(), outcome);
        assert!(result.is_error());
        assert!(result.value().is_none());
        assert_eq!(result.status_code(), Some(200));
    }

    #[test]
    fn status_outside_range_is_unacceptable_even_if_parseable() {
        let outcome = TransportOutcome::received(ResponseMetadata::new(400), r#"{"a":1}"#);
        let result = transform(&object_call(), outcome);
        assert_eq!(result.status_code(), Some(400));
        assert!(matches!(
            result.error(),
            Some(CallFailure::UnacceptableStatus { status: 400, message }) if message == r#"{"a":1}"#
        ));
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let call: Call<JsonArray> = Call::get("get").build();
        let outcome = TransportOutcome::received(ResponseMetadata::new(200), r#"{"args":{}}"#);
        let result = transform(&call, outcome);
        assert!(matches!(
            result.error(),
            Some(CallFailure::Parse(ParseError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn neither_response_nor_error_is_bad_server_response() {
        let result = transform(&object_call(), TransportOutcome::default());
        assert!(matches!(
            result.error(),
            Some(CallFailure::Transport(TransportError::BadServerResponse))
        ));
        assert!(result.response().is_none());
    }

    #[test]
    fn empty_success_body_for_text() {
        let call: Call<TextFormat> = Call::get("status/204").build();
        let outcome = TransportOutcome {
            response: Some(ResponseMetadata::new(204)),
            body: None,
            error: None,
        };
        let result = transform(&call, outcome);
        assert_eq!(result.value().map(String::as_str), Some(""));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = Bytes::from("x".repeat(2000));
        let outcome = TransportOutcome::received(ResponseMetadata::new(500), body);
        let result = transform(&object_call(), outcome);
        match result.error() {
            Some(CallFailure::UnacceptableStatus { message, .. }) => {
                assert_eq!(message.len(), STATUS_MESSAGE_LIMIT)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
