// Query parameter binding module
// Explicit parameter parsing with documented defaults; parse failures are
// surfaced as messages the router turns into HTTP 400.

use std::borrow::Cow;

/// Parsed query parameters. First occurrence of a key wins.
#[derive(Debug, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// `+` is treated as a space and values are percent-decoded. Undecodable
    /// escapes produce an error message for the 400 branch.
    pub fn parse(query: Option<&str>) -> Result<Self, String> {
        let mut params = Self::default();

        let Some(query) = query else {
            return Ok(params);
        };

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }

            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();

            let key = decode_component(key)
                .ok_or_else(|| format!("Invalid encoding in query parameter '{pair}'"))?;
            let value = decode_component(value)
                .ok_or_else(|| format!("Invalid encoding in query parameter '{pair}'"))?;

            params.pairs.push((key, value));
        }

        Ok(params)
    }

    /// First value for a key, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// String parameter with a default for the missing case
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Integer parameter with a default for the missing case.
    /// A present but non-integer value is a binding error.
    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, String> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("Invalid value for parameter '{key}': expected an integer")),
        }
    }
}

/// Percent-decode one query component, with `+` as space
fn decode_component(raw: &str) -> Option<String> {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };

    urlencoding::decode(&spaced).map(Cow::into_owned).ok()
}
