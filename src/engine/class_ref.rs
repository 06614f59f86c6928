//! Normalizes heterogeneous class references (bare identifiers or several
//! catalog URL shapes) into a canonical class identifier, and builds the
//! canonical catalog URL back from an identifier.

use thiserror::Error;
use url::Url;

/// Canonical catalog page; the class identifier rides in the `classId`
/// query parameter.
const CATALOG_BASE_URL: &str = "https://members.classcatalog.example/classes/all";

const CLASS_ID_PARAM: &str = "classId";

/// Path segments that may sit between `/classes/` and the identifier.
const DISCIPLINE_SEGMENTS: &[&str] = &["all", "cycling", "running", "yoga", "strength"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid class reference: {0}")]
pub struct InvalidReference(pub String);

fn is_valid_identifier(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extracts the canonical class identifier from `input`.
///
/// Accepts either a bare identifier (`[A-Za-z0-9_-]+`) or an http(s) URL.
/// For URLs the `classId` query parameter wins; otherwise the path segment
/// following `/classes/` is used, skipping a discipline segment such as
/// `cycling` or the literal `all`.
pub fn extract_identifier(input: &str) -> Result<String, InvalidReference> {
    let input = input.trim();
    if input.is_empty() {
        return Err(InvalidReference("empty reference".to_string()));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let parsed = Url::parse(input)
            .map_err(|_| InvalidReference(format!("unparseable URL: {input}")))?;

        if let Some((_, value)) = parsed
            .query_pairs()
            .find(|(key, _)| key == CLASS_ID_PARAM)
        {
            if is_valid_identifier(&value) {
                return Ok(value.into_owned());
            }
            return Err(InvalidReference(format!(
                "malformed {CLASS_ID_PARAM} parameter in URL: {input}"
            )));
        }

        if let Some(segments) = parsed.path_segments() {
            let mut segments = segments.peekable();
            while let Some(segment) = segments.next() {
                if segment != "classes" {
                    continue;
                }
                let mut candidate = segments.next();
                if let Some(c) = candidate {
                    if DISCIPLINE_SEGMENTS.contains(&c) {
                        candidate = segments.next();
                    }
                }
                return match candidate {
                    Some(id) if is_valid_identifier(id) => Ok(id.to_string()),
                    _ => Err(InvalidReference(format!(
                        "no class identifier found in URL: {input}"
                    ))),
                };
            }
        }

        return Err(InvalidReference(format!(
            "no class identifier found in URL: {input}"
        )));
    }

    if is_valid_identifier(input) {
        Ok(input.to_string())
    } else {
        Err(InvalidReference(format!(
            "identifier contains invalid characters: {input}"
        )))
    }
}

/// Renders the canonical catalog URL for a class identifier.
pub fn build_url(id: &str) -> Result<String, InvalidReference> {
    if !is_valid_identifier(id) {
        return Err(InvalidReference(format!("invalid identifier: {id}")));
    }
    Ok(format!("{CATALOG_BASE_URL}?{CLASS_ID_PARAM}={id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_identifier_passes_through() {
        assert_eq!(
            extract_identifier("abc123_XY-z").unwrap(),
            "abc123_XY-z".to_string()
        );
    }

    #[test]
    fn bare_identifier_rejects_bad_charset() {
        assert!(extract_identifier("abc 123").is_err());
        assert!(extract_identifier("abc/123").is_err());
        assert!(extract_identifier("").is_err());
        assert!(extract_identifier("   ").is_err());
    }

    #[test]
    fn url_with_class_id_param() {
        let id = extract_identifier(
            "https://members.classcatalog.example/classes/cycling?modal=details&classId=deadbeef01",
        )
        .unwrap();
        assert_eq!(id, "deadbeef01");
    }

    #[test]
    fn url_with_path_identifier_after_discipline() {
        let id =
            extract_identifier("https://members.classcatalog.example/classes/cycling/deadbeef01")
                .unwrap();
        assert_eq!(id, "deadbeef01");

        let id = extract_identifier("https://members.classcatalog.example/classes/all/feedface02")
            .unwrap();
        assert_eq!(id, "feedface02");
    }

    #[test]
    fn url_with_identifier_directly_after_classes() {
        let id = extract_identifier("https://members.classcatalog.example/classes/deadbeef01")
            .unwrap();
        assert_eq!(id, "deadbeef01");
    }

    #[test]
    fn url_without_identifier_fails() {
        assert!(extract_identifier("https://members.classcatalog.example/schedule").is_err());
        assert!(extract_identifier("https://members.classcatalog.example/classes/cycling").is_err());
    }

    #[test]
    fn build_url_rejects_invalid() {
        assert!(build_url("").is_err());
        assert!(build_url("has space").is_err());
    }

    #[test]
    fn round_trip() {
        for id in ["a", "deadbeef01", "A-b_C9"] {
            let url = build_url(id).unwrap();
            assert_eq!(extract_identifier(&url).unwrap(), id);
        }
    }
}
