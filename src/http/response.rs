//! Writing outcomes and failures back on the wire.
//!
//! # Responsibilities
//! - Serialize a router outcome: status, content type, body
//! - Translate a [`PipelineError`] into a client-safe status and message
//! - Log the full failure (cause and stack) before it is reduced
//!
//! # Design Decisions
//! - Error responses carry no content type, only status and message
//! - Missing status or message fall back to 500 / "Unhandled Server Error"
//! - Neither writer can fail; socket errors belong to the transport

use axum::http::StatusCode;

use crate::http::dispatch::RouterOutcome;
use crate::http::error::PipelineError;
use crate::net::transport::TransportResponse;
use crate::observability::logging::Logger;

/// Write a successful outcome. Returns the status written.
pub fn write_outcome<Res>(response: &mut Res, outcome: RouterOutcome) -> StatusCode
where
    Res: TransportResponse + ?Sized,
{
    response.write_status(outcome.status);
    response.write_header("Content-Type", outcome.response_type.content_type());
    response.end(outcome.message.unwrap_or_default());
    outcome.status
}

/// Log a failure, then write its status and message. Returns the status written.
pub fn write_error<Res>(response: &mut Res, logger: &dyn Logger, err: PipelineError) -> StatusCode
where
    Res: TransportResponse + ?Sized,
{
    let status = err.resolved_status();
    let message = err.resolved_message().to_string();

    logger.error(&format!(
        "Error encountered while processing request. Status: {}. Message: {}. Stack: {}",
        status.as_u16(),
        message,
        err.stack()
    ));

    response.write_status(status);
    response.end(message);
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::dispatch::ResponseType;
    use crate::http::error::{make_error, PipelineError};
    use crate::net::testing::{Level, RecordingLogger, RecordingResponse, Write};

    #[test]
    fn outcome_gets_content_type_and_body() {
        let mut res = RecordingResponse::new();
        let status = write_outcome(
            &mut res,
            RouterOutcome::new(StatusCode::CREATED)
                .with_message("created")
                .with_response_type(ResponseType::Text),
        );

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            res.writes,
            vec![
                Write::Status(StatusCode::CREATED),
                Write::Header("Content-Type".into(), "text/plain; charset=utf-8".into()),
                Write::End("created".into()),
            ]
        );
    }

    #[test]
    fn outcome_without_message_ends_empty() {
        let mut res = RecordingResponse::new();
        write_outcome(&mut res, RouterOutcome::new(StatusCode::ACCEPTED));
        assert_eq!(res.writes.last(), Some(&Write::End(String::new())));
    }

    #[test]
    fn error_writes_status_and_message_only() {
        let logger = RecordingLogger::default();
        let mut res = RecordingResponse::new();
        let status = write_error(
            &mut res,
            &logger,
            make_error(StatusCode::FORBIDDEN, "nope", None),
        );

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            res.writes,
            vec![Write::Status(StatusCode::FORBIDDEN), Write::End("nope".into())]
        );
        let errors = logger.lines(Level::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Status: 403. Message: nope. Stack: nope"));
    }

    #[test]
    fn bare_cause_falls_back_to_server_error() {
        let logger = RecordingLogger::default();
        let mut res = RecordingResponse::new();
        write_error(&mut res, &logger, PipelineError::from_cause("disk on fire"));

        assert_eq!(
            res.writes,
            vec![
                Write::Status(StatusCode::INTERNAL_SERVER_ERROR),
                Write::End("Unhandled Server Error".into()),
            ]
        );
        assert!(logger.lines(Level::Error)[0].contains("disk on fire"));
    }
}
