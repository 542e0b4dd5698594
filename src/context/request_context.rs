//! The per-request context.

use std::any::Any;
use std::fmt::Debug;

use axum::http::{header, HeaderName, HeaderValue, Method, Request, StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::chain::Handler;
use crate::context::cursor::Cursor;
use crate::context::params::Params;
use crate::context::response::{ResponseWriter, TEXT_PLAIN};
use crate::context::settings::Settings;
use crate::error::{ContextError, Error, Result};
use crate::render;

pub(crate) const INTERNAL_ERROR: &str = "Internal Server Error";

/// Mutable state of one in-flight request.
///
/// A context is bound to exactly one request at a time. It is normally
/// obtained from a [`ContextPool`](crate::context::ContextPool) and reset
/// before it is handed to the next request.
pub struct Context {
    request: Request<Bytes>,
    response: ResponseWriter,
    params: Params,
    pub(crate) middlewares: Vec<Handler>,
    pub(crate) cursor: Cursor,
    settings: Option<Settings>,
    frozen_settings: Option<Settings>,
    request_id: String,
}

impl Context {
    pub(crate) fn new() -> Self {
        Self {
            request: Request::default(),
            response: ResponseWriter::default(),
            params: Params::default(),
            middlewares: Vec::new(),
            cursor: Cursor::NotStarted,
            settings: None,
            frozen_settings: None,
            request_id: String::new(),
        }
    }

    /// Attach a request, mirroring its ID header into the response.
    ///
    /// A missing or unreadable ID is replaced by a fresh UUID.
    pub(crate) fn bind(&mut self, request: Request<Bytes>, params: Params, id_header: &HeaderName) {
        let request_id = request
            .headers()
            .get(id_header)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            self.response.pin_header(id_header.clone(), value);
        }

        self.request = request;
        self.params = params;
        self.request_id = request_id;
    }

    /// Drop every trace of the previous request.
    pub(crate) fn reset(&mut self) {
        self.request = Request::default();
        self.response.reset();
        self.params.clear();
        self.middlewares.clear();
        self.cursor = Cursor::NotStarted;
        self.settings = None;
        self.frozen_settings = None;
        self.request_id.clear();
    }

    // --- Request side ---

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Request header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn middlewares(&self) -> &[Handler] {
        &self.middlewares
    }

    // --- Settings ---

    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.settings
            .get_or_insert_with(Settings::new)
            .insert(key, value);
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.settings.as_ref().and_then(|settings| settings.get(key))
    }

    /// A string setting, stored either as `String` or `&'static str`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get::<String>(key)
            .map(String::as_str)
            .or_else(|| self.get::<&'static str>(key).copied())
    }

    pub fn has(&self, key: &str) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|settings| settings.contains(key))
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.settings
            .as_mut()
            .is_some_and(|settings| settings.remove(key))
    }

    /// Store a write-once value.
    pub fn set_final<T: Any + Send + Sync>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<(), ContextError> {
        let key = key.into();
        let frozen = self.frozen_settings.get_or_insert_with(Settings::new);
        if frozen.contains(&key) {
            return Err(ContextError::FrozenKey(key));
        }
        frozen.insert(key, value);
        Ok(())
    }

    pub fn get_final<T: Any>(&self, key: &str) -> Option<&T> {
        self.frozen_settings
            .as_ref()
            .and_then(|settings| settings.get(key))
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn frozen_settings(&self) -> Option<&Settings> {
        self.frozen_settings.as_ref()
    }

    // --- Response side ---

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub(crate) fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    pub fn is_finished(&self) -> bool {
        self.response.is_finished()
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.response.set_status(status)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        self.response.set_header(name, value)
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        self.response.add_header(name, value)
    }

    /// Flush status and headers without a body.
    pub fn finish(&mut self) -> Result<(), ContextError> {
        self.response.finish()
    }

    /// Write raw bytes as the body; plain text unless a content type was set.
    pub fn send(&mut self, body: impl AsRef<[u8]>) -> Result<(), ContextError> {
        self.response.write(TEXT_PLAIN, body.as_ref())
    }

    /// Redirect with `302 Found`.
    pub fn redirect(&mut self, location: &str) -> Result<(), ContextError> {
        self.response.set_status(StatusCode::FOUND)?;
        self.response.set_header(header::LOCATION.as_str(), location)?;
        self.response.finish()
    }

    /// Serialize `payload` in the negotiated representation and finish.
    ///
    /// On a serialization failure the response becomes a 500 and the error
    /// is returned; nothing of the failed encoding is written.
    pub fn render<T>(&mut self, payload: &T) -> Result<()>
    where
        T: Serialize + Debug + ?Sized,
    {
        if self.response.is_finished() {
            return Err(ContextError::ResponseFinished.into());
        }

        let rendered = render::render(
            self.request.headers(),
            &self.params,
            self.response.headers(),
            payload,
        );

        match rendered {
            Ok(rendered) => {
                self.response.set_header(
                    header::CONTENT_TYPE.as_str(),
                    rendered.format.content_type(),
                )?;
                self.response
                    .write(rendered.format.content_type(), &rendered.body)?;
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    request_id = %self.request_id,
                    error = %err,
                    "Failed to render response"
                );
                self.response
                    .fail(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
                Err(Error::Render(err))
            }
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("middlewares", &self.middlewares.len())
            .field("cursor", &self.cursor)
            .field("settings", &self.settings)
            .field("frozen_settings", &self.frozen_settings)
            .field("request_id", &self.request_id)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_context(uri: &str, headers: &[(&str, &str)]) -> Context {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Bytes::new()).unwrap();
    let params = Params::from_parts(Vec::new(), request.uri().query());

    let mut ctx = Context::new();
    ctx.bind(request, params, &HeaderName::from_static("x-request-id"));
    ctx
}
