//! Response writers used by the scripted server.
//!
//! The handler writes the status and body through [`ResponseWriter`] and
//! records what the write reported, so tests can see failures such as a body
//! on a 204 response instead of having them swallowed by the HTTP stack.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure reported by [`ResponseWriter::write`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The response status does not permit a body
    #[error("response status {0} does not allow body")]
    BodyNotAllowed(StatusCode),
}

/// Sink for one HTTP response
pub trait ResponseWriter {
    /// Sets the response status. Only the first final (non-1xx) status takes effect.
    fn write_header(&mut self, status: StatusCode);

    /// Final status of the response, 200 if none was written
    fn status(&self) -> StatusCode;

    /// Appends body bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError>;

    /// Flushing capability, if the writer has one
    fn as_flusher(&mut self) -> Option<&mut dyn Flusher> {
        None
    }
}

/// Pushes buffered response bytes out immediately
pub trait Flusher {
    /// Flushes buffered body bytes
    fn flush(&mut self);
}

/// Whether a response with `status` may carry a body
pub fn body_allowed_for_status(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Writer that buffers body bytes and emits each flush as a separate body frame
#[derive(Debug, Default)]
pub struct BufferedWriter {
    status: Option<StatusCode>,
    informational: Vec<StatusCode>,
    buffer: BytesMut,
    frames: Vec<Bytes>,
}

impl BufferedWriter {
    /// Creates a writer with no status and an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// 1xx statuses written before the final one
    pub fn informational(&self) -> &[StatusCode] {
        &self.informational
    }

    /// Frames flushed so far
    pub fn frames(&self) -> &[Bytes] {
        &self.frames
    }

    /// Finishes the response, flushing anything still buffered
    pub fn into_response(mut self) -> Response {
        self.flush();
        let status = self.status();
        let frames = self.frames.into_iter().map(Ok::<_, Infallible>);

        let mut response = Response::new(Body::from_stream(futures::stream::iter(frames)));
        *response.status_mut() = status;
        response
    }
}

impl ResponseWriter for BufferedWriter {
    fn write_header(&mut self, status: StatusCode) {
        if status.is_informational() {
            debug!("informational status {} written before the final one", status);
            self.informational.push(status);
            return;
        }
        match self.status {
            Some(current) => warn!(
                "superfluous write_header({}), status already {}",
                status, current
            ),
            None => self.status = Some(status),
        }
    }

    fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        let status = self.status();
        if !body_allowed_for_status(status) {
            return Err(WriteError::BodyNotAllowed(status));
        }
        self.buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn as_flusher(&mut self) -> Option<&mut dyn Flusher> {
        Some(self)
    }
}

impl Flusher for BufferedWriter {
    fn flush(&mut self) {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        if !self.buffer.is_empty() {
            self.frames.push(self.buffer.split().freeze());
        }
    }
}
