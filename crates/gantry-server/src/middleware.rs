//! Built-in middleware.
//!
//! Both are wrap-style: they call [`Context::advance`] themselves and do
//! their work after the rest of the chain returns.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use gantry_core::{handler, Context, Handler};
use http::StatusCode;

use crate::app::ClientAddr;

/// Logs one line per request through `tracing`.
///
/// Fields: method, path, status, latency, client address and the number of
/// errors recorded on the context. Requests that recorded errors or ended
/// with a 5xx status are logged at `WARN`.
#[must_use]
pub fn logger() -> Handler {
    handler(|c: &mut Context| {
        let start = Instant::now();
        c.advance();
        let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let status = c.writer().status();
        let client = c.extension::<ClientAddr>().map(|addr| addr.0.to_string());
        let errors = c.errors().len();

        if errors > 0 || status >= 500 {
            let messages: Vec<&str> = c.errors().iter().map(|e| e.msg.as_str()).collect();
            tracing::warn!(
                method = %c.method(),
                path = c.path(),
                status,
                latency_us,
                client = client.as_deref().unwrap_or("-"),
                errors,
                error_messages = ?messages,
                "request completed with errors"
            );
        } else {
            tracing::info!(
                method = %c.method(),
                path = c.path(),
                status,
                latency_us,
                client = client.as_deref().unwrap_or("-"),
                "request completed"
            );
        }
    })
}

/// Turns a panic in any later handler into a `500 Internal Server Error`.
///
/// The panic message is logged and recorded on the context with metadata
/// `"panic"`. Handlers after the panicking one do not run.
#[must_use]
pub fn recovery() -> Handler {
    handler(|c: &mut Context| {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| c.advance()));
        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                method = %c.method(),
                path = c.path(),
                panic = %message,
                "handler panicked"
            );
            c.record_error(&message, serde_json::Value::from("panic"));
            c.abort(StatusCode::INTERNAL_SERVER_ERROR);
        }
    })
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
