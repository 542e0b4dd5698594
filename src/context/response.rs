//! Buffered response writer owned by a context.
//!
//! # Design Decisions
//! - Nothing reaches the transport until the chain has terminated
//! - A finished writer refuses further mutation
//! - Error responses replace any buffered body, so partial output is never sent

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};

use crate::error::ContextError;

pub(crate) const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    finished: bool,
    /// Survives `fail`; set while binding a request.
    pinned: Option<(HeaderName, HeaderValue)>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            finished: false,
            pinned: None,
        }
    }
}

impl ResponseWriter {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ensure_open(&self) -> Result<(), ContextError> {
        if self.finished {
            Err(ContextError::ResponseFinished)
        } else {
            Ok(())
        }
    }

    pub(crate) fn set_status(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.ensure_open()?;
        self.status = status;
        Ok(())
    }

    pub(crate) fn set_header(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        self.ensure_open()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub(crate) fn add_header(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        self.ensure_open()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Header writes that bypass the finished check.
    pub(crate) fn insert_raw(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Insert a header that error responses keep, such as the request ID.
    pub(crate) fn pin_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name.clone(), value.clone());
        self.pinned = Some((name, value));
    }

    /// Flush status and headers only.
    pub(crate) fn finish(&mut self) -> Result<(), ContextError> {
        self.ensure_open()?;
        self.finished = true;
        Ok(())
    }

    /// Write a complete body and finish.
    pub(crate) fn write(&mut self, content_type: &str, body: &[u8]) -> Result<(), ContextError> {
        self.ensure_open()?;
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            let value = HeaderValue::from_str(content_type)
                .map_err(|_| ContextError::InvalidHeader(content_type.to_string()))?;
            self.headers.insert(header::CONTENT_TYPE, value);
        }
        self.body.clear();
        self.body.extend_from_slice(body);
        self.finished = true;
        Ok(())
    }

    /// Replace whatever was buffered with a plain-text error and finish.
    ///
    /// Only the pinned header survives. Works on finished writers too: the
    /// transport has not seen anything yet.
    pub(crate) fn fail(&mut self, status: StatusCode, message: &str) {
        self.status = status;
        self.headers.clear();
        if let Some((name, value)) = &self.pinned {
            self.headers.insert(name.clone(), value.clone());
        }
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        self.body.clear();
        self.body.extend_from_slice(message.as_bytes());
        self.finished = true;
    }

    pub(crate) fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        self.finished = false;
        self.pinned = None;
    }

    /// Move the buffered response out, leaving the writer empty.
    pub(crate) fn take(&mut self) -> Response {
        let body: Bytes = self.body.split().freeze();
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        self.status = StatusCode::OK;
        self.finished = true;
        response
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ContextError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ContextError::InvalidHeader(name.to_string()))?;
    let value =
        HeaderValue::from_str(value).map_err(|_| ContextError::InvalidHeader(name.to_string()))?;
    Ok((name, value))
}
