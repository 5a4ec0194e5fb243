//! Query string lookups used by the entry guards.

use url::form_urlencoded;

/// Value of the first non-empty `name` parameter in `query`, percent-decoded.
///
/// An empty value (`?ticket=`) counts as absent.
pub fn param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_ticket() {
        assert_eq!(param(Some("a=1&ticket=abc"), "ticket").as_deref(), Some("abc"));
    }

    #[test]
    fn decodes_value() {
        assert_eq!(param(Some("ticket=a%2Bb"), "ticket").as_deref(), Some("a+b"));
    }

    #[test]
    fn empty_or_missing_is_none() {
        assert_eq!(param(None, "ticket"), None);
        assert_eq!(param(Some(""), "ticket"), None);
        assert_eq!(param(Some("ticket="), "ticket"), None);
        assert_eq!(param(Some("tickets=x"), "ticket"), None);
    }
}
