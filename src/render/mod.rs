//! Content negotiation and rendering.
//!
//! # Data Flow
//! ```text
//! payload + request (query, Accept) + response (preset Content-Type)
//!     → negotiate.rs (choose Format)
//!     → encode.rs (serialize fully into a buffer)
//!     → Rendered { format, body } written by the context
//! ```
//!
//! # Design Decisions
//! - Encoding finishes before any byte is written, so failures never leave partial output
//! - Unrecognized media types fall through to the next rule instead of failing

pub mod encode;
pub mod negotiate;

use std::fmt::Debug;

use axum::http::{header, HeaderMap};
use bytes::Bytes;
use serde::Serialize;

use crate::context::Params;
use crate::error::RenderError;

pub use encode::DEFAULT_XML_ROOT;
pub use negotiate::{negotiate, Format, CONTENT_TYPE_PARAM};

/// An encoded body and the representation it was encoded in.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub format: Format,
    pub body: Bytes,
}

/// Negotiate a representation for `payload` and encode it.
pub fn render<T>(
    request_headers: &HeaderMap,
    params: &Params,
    response_headers: &HeaderMap,
    payload: &T,
) -> Result<Rendered, RenderError>
where
    T: Serialize + Debug + ?Sized,
{
    let format = negotiate(
        params.get(CONTENT_TYPE_PARAM),
        header_str(response_headers, header::CONTENT_TYPE),
        header_str(request_headers, header::ACCEPT),
    );
    let body = encode::encode(format, payload)?;

    Ok(Rendered { format, body })
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_render_reads_every_signal() {
        let mut request_headers = HeaderMap::new();
        request_headers.insert(header::ACCEPT, HeaderValue::from_static("text/xml"));
        let response_headers = HeaderMap::new();

        let rendered = render(&request_headers, &Params::new(), &response_headers, &5).unwrap();
        assert_eq!(rendered.format, Format::Xml);
        assert_eq!(rendered.body, "<Result>5</Result>");

        let params = Params::from_parts(Vec::new(), Some("content-type=application/json"));
        let rendered = render(&request_headers, &params, &response_headers, &5).unwrap();
        assert_eq!(rendered.format, Format::Json);
        assert_eq!(rendered.body, "5");
    }
}
