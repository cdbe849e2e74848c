//! Document list queries, sent as `queries[]` parameters.
//!
//! Each query is a JSON object such as
//! `{"method":"equal","attribute":"accountId","values":["abc"]}`.

use serde::Serialize;
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    values: Vec<Value>,
}

impl Query {
    /// Attribute equals any of `values`.
    pub fn equal<V: Into<Value>>(attribute: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            method: "equal",
            attribute: Some(attribute.to_owned()),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Full-text search on an indexed attribute.
    pub fn search(attribute: &str, text: &str) -> Self {
        Self {
            method: "search",
            attribute: Some(attribute.to_owned()),
            values: vec![Value::from(text)],
        }
    }

    pub fn limit(limit: u32) -> Self {
        Self {
            method: "limit",
            attribute: None,
            values: vec![Value::from(limit)],
        }
    }

    /// Encode as a query parameter value.
    pub fn to_param(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Append each query to `url` as a `queries[]` parameter.
pub fn append_to(url: &mut Url, queries: &[Query]) -> Result<(), serde_json::Error> {
    if queries.is_empty() {
        return Ok(());
    }
    let params = queries
        .iter()
        .map(Query::to_param)
        .collect::<Result<Vec<_>, _>>()?;
    let mut pairs = url.query_pairs_mut();
    for param in &params {
        pairs.append_pair("queries[]", param);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_encoding() {
        let query = Query::equal("accountId", ["abc"]);
        assert_eq!(
            query.to_param().unwrap(),
            r#"{"method":"equal","attribute":"accountId","values":["abc"]}"#
        );
    }

    #[test]
    fn test_equal_many_values() {
        let query = Query::equal("$id", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            query.to_param().unwrap(),
            r#"{"method":"equal","attribute":"$id","values":["a","b"]}"#
        );
    }

    #[test]
    fn test_search_and_limit_encoding() {
        assert_eq!(
            Query::search("name", "burger").to_param().unwrap(),
            r#"{"method":"search","attribute":"name","values":["burger"]}"#
        );
        assert_eq!(
            Query::limit(10).to_param().unwrap(),
            r#"{"method":"limit","values":[10]}"#
        );
    }

    #[test]
    fn test_append_to_url() {
        let mut url = Url::parse("https://cloud.appwrite.io/v1/documents").unwrap();
        append_to(&mut url, &[Query::limit(5), Query::search("name", "fries")]).unwrap();

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            [
                ("queries[]".to_string(), r#"{"method":"limit","values":[5]}"#.to_string()),
                (
                    "queries[]".to_string(),
                    r#"{"method":"search","attribute":"name","values":["fries"]}"#.to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_append_nothing_leaves_url_alone() {
        let mut url = Url::parse("https://cloud.appwrite.io/v1/documents").unwrap();
        append_to(&mut url, &[]).unwrap();
        assert_eq!(url.as_str(), "https://cloud.appwrite.io/v1/documents");
    }
}
