//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns (`/users/{id}`, `/static/{*path}`)
//! - Match request paths and extract parameters
//!
//! # Design Decisions
//! - Matching is segment-wise and case-sensitive
//! - Empty segments are ignored, so `/a/` and `/a` are the same path
//! - Request segments are percent-decoded before comparison and extraction
//! - No regex to guarantee O(n) matching

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let mut segments = Vec::new();

        for part in pattern.split('/').filter(|part| !part.is_empty()) {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => match name.strip_prefix('*') {
                    Some(rest) => Segment::CatchAll(rest.to_string()),
                    None => Segment::Param(name.to_string()),
                },
                None => Segment::Literal(part.to_string()),
            };

            let is_catch_all = matches!(segment, Segment::CatchAll(_));
            segments.push(segment);
            // a catch-all swallows the rest of the path
            if is_catch_all {
                break;
            }
        }

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Parameters extracted from `path`, or `None` if it does not match.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let mut parts = path
            .split('/')
            .filter(|part| !part.is_empty())
            .map(decode_segment);
        let mut params = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(expected) => {
                    if parts.next()? != expected.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.push((name.clone(), parts.next()?.into_owned()));
                }
                Segment::CatchAll(name) => {
                    let rest: Vec<Cow<'_, str>> = parts.by_ref().collect();
                    params.push((name.clone(), rest.join("/")));
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Invalid UTF-8 after decoding is replaced rather than rejected.
fn decode_segment(part: &str) -> Cow<'_, str> {
    percent_decode_str(part).decode_utf8_lossy()
}

/// Decoded form of a request path, as shown in logs and miss responses.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    decode_segment(path)
}

/// Join a group prefix and a route path with exactly one slash between them.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}
