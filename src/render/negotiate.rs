//! Output format selection.

/// Query parameter that forces a representation.
pub const CONTENT_TYPE_PARAM: &str = "content-type";

/// A supported response representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Plain,
}

impl Format {
    /// The exact `Content-Type` written for this representation.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "text/xml",
            Format::Plain => "text/plain; charset=utf-8",
        }
    }

    /// Recognize a media type, ignoring parameters and case.
    ///
    /// Wildcards are not a choice and yield `None`.
    pub fn from_media_type(media_type: &str) -> Option<Format> {
        let essence = media_type.split(';').next().unwrap_or_default().trim();

        if essence.eq_ignore_ascii_case("application/json") {
            Some(Format::Json)
        } else if essence.eq_ignore_ascii_case("text/xml")
            || essence.eq_ignore_ascii_case("application/xml")
        {
            Some(Format::Xml)
        } else if essence.eq_ignore_ascii_case("text/plain") {
            Some(Format::Plain)
        } else {
            None
        }
    }
}

/// Pick the representation for a response.
///
/// Precedence: `query` (the `content-type` parameter), then a content type
/// already set on the response, then the first recognized `Accept` entry in
/// header order, then plain text. Unrecognized values fall through.
pub fn negotiate(query: Option<&str>, preset: Option<&str>, accept: Option<&str>) -> Format {
    if let Some(format) = query.and_then(Format::from_media_type) {
        return format;
    }

    if let Some(format) = preset.and_then(Format::from_media_type) {
        return format;
    }

    accept
        .into_iter()
        .flat_map(|accept| accept.split(','))
        .find_map(Format::from_media_type)
        .unwrap_or(Format::Plain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain() {
        assert_eq!(negotiate(None, None, None), Format::Plain);
        assert_eq!(negotiate(None, None, Some("*/*")), Format::Plain);
    }

    #[test]
    fn test_first_accept_entry_wins() {
        assert_eq!(
            negotiate(None, None, Some("application/json, text/xml, */*; q=0.01")),
            Format::Json
        );
        assert_eq!(
            negotiate(None, None, Some("text/xml;q=0.1, application/json")),
            Format::Xml
        );
    }

    #[test]
    fn test_misspelled_entries_are_skipped() {
        assert_eq!(
            negotiate(None, None, Some("appication/json, text/xml, */*; q=0.01")),
            Format::Xml
        );
    }

    #[test]
    fn test_query_overrides_header() {
        assert_eq!(
            negotiate(Some("application/json"), None, Some("text/xml")),
            Format::Json
        );
        assert_eq!(
            negotiate(Some("text/xml"), Some("application/json"), None),
            Format::Xml
        );
    }

    #[test]
    fn test_preset_content_type_beats_accept() {
        assert_eq!(
            negotiate(None, Some("application/json; charset=utf-8"), Some("text/xml")),
            Format::Json
        );
    }

    #[test]
    fn test_unknown_query_falls_through() {
        assert_eq!(
            negotiate(Some("image/png"), None, Some("application/xml")),
            Format::Xml
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(Format::Json.content_type(), "application/json");
        assert_eq!(Format::Xml.content_type(), "text/xml");
        assert_eq!(Format::Plain.content_type(), "text/plain; charset=utf-8");
    }
}
