//! Parsing helpers for user-supplied option strings

use std::collections::BTreeMap;

use crate::error::{ModelError, Result};

/// Parse a two-level delimited string such as `"a=1, b=2"` into a map.
///
/// Returns `Ok(None)` for absent or empty input. Every segment must split
/// into exactly one key and one value; surrounding whitespace is trimmed.
pub fn parse_key_value_pairs(
    input: Option<&str>,
    pair_delimiter: &str,
    kv_delimiter: &str,
) -> Result<Option<BTreeMap<String, String>>> {
    let input = match input {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };

    let mut parsed = BTreeMap::new();
    for segment in input.split(pair_delimiter) {
        let parts: Vec<&str> = segment.split(kv_delimiter).collect();
        match parts.as_slice() {
            [key, value] => {
                parsed.insert(key.trim().to_owned(), value.trim().to_owned());
            }
            _ => return Err(ModelError::InvalidKeyValue(segment.to_owned())),
        }
    }
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let parsed = parse_key_value_pairs(Some("tomodo-type=sharded, tomodo-group = rs0"), ",", "=")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["tomodo-type"], "sharded");
        assert_eq!(parsed["tomodo-group"], "rs0");
    }

    #[test]
    fn test_empty_input_is_none() {
        assert_eq!(parse_key_value_pairs(None, ",", "=").unwrap(), None);
        assert_eq!(parse_key_value_pairs(Some(""), ",", "=").unwrap(), None);
    }

    #[test]
    fn test_malformed_segment_is_an_error() {
        assert_eq!(
            parse_key_value_pairs(Some("a=1,b"), ",", "="),
            Err(ModelError::InvalidKeyValue("b".to_string()))
        );
        assert!(parse_key_value_pairs(Some("a=1=2"), ",", "=").is_err());
    }
}
