use std::collections::BTreeMap;

use url::Url;

use crate::error::Result;

/// Decoded query parameters: key -> values in the order they appeared
pub type QueryValues = BTreeMap<String, Vec<String>>;

/// Decodes a raw `application/x-www-form-urlencoded` query string
pub fn parse_query(raw: Option<&str>) -> QueryValues {
    let mut values = QueryValues::new();
    if let Some(raw) = raw {
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    values
}

/// Replaces the query of `base` with `query`, keys in sorted order
pub fn url_with_query(base: &str, query: &QueryValues) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.set_query(None);
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, values) in query {
            for value in values {
                pairs.append_pair(key, value);
            }
        }
    }
    Ok(url.to_string())
}
