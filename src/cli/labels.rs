//! `--label key=value` parsing.

use crate::{Error, Result};

/// Parses a `key=value` label argument.
///
/// The value may be empty and may itself contain `=`; the key may not be
/// empty.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if there is no `=` or the key is empty.
pub fn parse_label_arg(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::InvalidInput(format!("label '{raw}' must be KEY=VALUE")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidInput(format!("label '{raw}' has an empty key")));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("team=ml", "team", "ml"; "simple")]
    #[test_case(" env = prod ", "env", "prod"; "trimmed")]
    #[test_case("note=a=b", "note", "a=b"; "value with equals")]
    #[test_case("empty=", "empty", ""; "empty value")]
    fn test_parse_label_arg(raw: &str, key: &str, value: &str) {
        assert_eq!(
            parse_label_arg(raw).expect("valid"),
            (key.to_string(), value.to_string())
        );
    }

    #[test_case("team"; "no separator")]
    #[test_case("=ml"; "empty key")]
    fn test_parse_label_arg_rejects(raw: &str) {
        assert!(matches!(parse_label_arg(raw), Err(Error::InvalidInput(_))));
    }
}
