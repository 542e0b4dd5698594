//! Payload encoders.

use std::fmt::Debug;

use bytes::Bytes;
use serde::Serialize;

use crate::error::RenderError;
use crate::render::negotiate::Format;

/// XML root element used when the payload does not name one.
pub const DEFAULT_XML_ROOT: &str = "Result";

/// Encode `payload` completely before anything is written.
pub fn encode<T>(format: Format, payload: &T) -> Result<Bytes, RenderError>
where
    T: Serialize + Debug + ?Sized,
{
    match format {
        Format::Json => Ok(Bytes::from(serde_json::to_vec(payload)?)),
        Format::Xml => to_xml(payload).map(Bytes::from),
        Format::Plain => Ok(Bytes::from(format!("{payload:?}"))),
    }
}

/// Serialize as XML; structs use their serde name as the root element.
fn to_xml<T>(payload: &T) -> Result<String, RenderError>
where
    T: Serialize + ?Sized,
{
    quick_xml::se::to_string(payload)
        .or_else(|_| quick_xml::se::to_string_with_root(DEFAULT_XML_ROOT, payload))
        .map_err(|err| RenderError::Xml(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::ser::{Error as _, Serializer};

    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename = "Result")]
    struct Project {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Age")]
        age: u32,
    }

    fn project() -> Project {
        Project {
            name: "gogo".into(),
            age: 5,
        }
    }

    #[derive(Debug)]
    struct Unsupported;

    impl Serialize for Unsupported {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("unsupported field type"))
        }
    }

    #[test]
    fn test_json() {
        let body = encode(Format::Json, &project()).unwrap();
        assert_eq!(body, r#"{"Name":"gogo","Age":5}"#);
    }

    #[test]
    fn test_xml_uses_declared_root() {
        let body = encode(Format::Xml, &project()).unwrap();
        assert_eq!(body, "<Result><Name>gogo</Name><Age>5</Age></Result>");
    }

    #[test]
    fn test_xml_falls_back_to_default_root() {
        let mut map = BTreeMap::new();
        map.insert("Name", "gogo");

        let body = encode(Format::Xml, &map).unwrap();
        assert_eq!(body, "<Result><Name>gogo</Name></Result>");
    }

    #[test]
    fn test_plain_is_a_structural_dump() {
        let body = encode(Format::Plain, &project()).unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("gogo"));
        assert!(text.contains('5'));
    }

    #[test]
    fn test_plain_is_not_escaped() {
        let body = encode(Format::Plain, "<b>&</b>").unwrap();
        assert_eq!(body, r#""<b>&</b>""#);
    }

    #[test]
    fn test_failures_are_reported() {
        assert!(matches!(
            encode(Format::Json, &Unsupported),
            Err(RenderError::Json(_))
        ));
        assert!(matches!(
            encode(Format::Xml, &Unsupported),
            Err(RenderError::Xml(_))
        ));
    }
}
