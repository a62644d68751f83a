//! Handshake query-string parsing.

use percent_encoding::percent_decode_str;

use crate::errors::Rejected;

/// Name of the query parameter carrying the bearer credential.
pub const TOKEN_PARAM: &str = "token";

/// Extract the `token` credential from a raw query string.
///
/// The first `&`-separated pair whose key is exactly `token` wins; its value
/// runs to the next `&` and is percent-decoded. A missing query, a missing
/// pair, or an empty value are all [`Rejected::MissingToken`].
pub fn extract_token(query: Option<&str>) -> Result<String, Rejected> {
    let raw = query
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == TOKEN_PARAM).then_some(value)
        })
        .ok_or(Rejected::MissingToken)?;

    let token = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| Rejected::MalformedToken)?;
    if token.is_empty() {
        return Err(Rejected::MissingToken);
    }
    Ok(token.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn token_only() {
        assert_eq!(extract_token(Some("token=abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn token_among_other_params() {
        let token = extract_token(Some("trainingId=42&token=abc&lang=en")).unwrap();
        assert_eq!(token, "abc");
    }

    #[test]
    fn first_token_wins() {
        assert_eq!(extract_token(Some("token=first&token=second")).unwrap(), "first");
    }

    #[test]
    fn similar_key_is_not_token() {
        assert_matches!(
            extract_token(Some("csrftoken=abc")),
            Err(Rejected::MissingToken)
        );
    }

    #[test]
    fn percent_encoded_value_is_decoded() {
        assert_eq!(extract_token(Some("token=a%2Bb%3D")).unwrap(), "a+b=");
    }

    #[test]
    fn value_may_contain_equals() {
        assert_eq!(extract_token(Some("token=abc==")).unwrap(), "abc==");
    }

    #[test]
    fn missing_query() {
        assert_matches!(extract_token(None), Err(Rejected::MissingToken));
        assert_matches!(extract_token(Some("")), Err(Rejected::MissingToken));
    }

    #[test]
    fn missing_token_param() {
        assert_matches!(extract_token(Some("foo=bar")), Err(Rejected::MissingToken));
    }

    #[test]
    fn empty_token_value() {
        assert_matches!(extract_token(Some("token=")), Err(Rejected::MissingToken));
        assert_matches!(extract_token(Some("token=&x=1")), Err(Rejected::MissingToken));
    }

    #[test]
    fn bare_key_without_equals() {
        assert_matches!(extract_token(Some("token")), Err(Rejected::MissingToken));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert_matches!(extract_token(Some("token=%FF%FE")), Err(Rejected::MalformedToken));
    }
}
