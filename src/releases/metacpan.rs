use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Release, ReleaseSource};

/// Fields requested for every release.
const RELEASE_FIELDS: &[&str] = &["date", "version", "status", "main_module"];

/// Queries the MetaCPAN release search endpoint.
pub struct MetaCpanClient {
    client: reqwest::Client,
    search_url: String,
    page_size: usize,
}

impl MetaCpanClient {
    pub fn new(client: reqwest::Client, search_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            page_size,
        }
    }

    fn request<'a>(&self, distribution: &'a str) -> SearchRequest<'a> {
        SearchRequest {
            query: SearchQuery {
                term: DistributionTerm { distribution },
            },
            size: self.page_size,
            source: RELEASE_FIELDS,
            sort: [SortByDate { date: "asc" }],
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: SearchQuery<'a>,
    size: usize,
    #[serde(rename = "_source")]
    source: &'static [&'static str],
    sort: [SortByDate; 1],
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    term: DistributionTerm<'a>,
}

#[derive(Serialize)]
struct DistributionTerm<'a> {
    distribution: &'a str,
}

#[derive(Serialize)]
struct SortByDate {
    date: &'static str,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Release,
}

fn parse_response(body: &str) -> Result<Vec<Release>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.hits.hits.into_iter().map(|hit| hit.source).collect())
}

#[async_trait]
impl ReleaseSource for MetaCpanClient {
    fn name(&self) -> &'static str {
        "MetaCPAN"
    }

    async fn releases(&self, distribution: &str) -> Result<Vec<Release>> {
        let body = self
            .client
            .post(&self.search_url)
            .json(&self.request(distribution))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MetaCpanClient {
        MetaCpanClient::new(
            reqwest::Client::new(),
            "https://fastapi.metacpan.org/v1/release/_search",
            5000,
        )
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(client().request("Foo-Bar")).unwrap();
        assert_eq!(
            body,
            json!({
                "query": { "term": { "distribution": "Foo-Bar" } },
                "size": 5000,
                "_source": ["date", "version", "status", "main_module"],
                "sort": [{ "date": "asc" }]
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": 2,
                "hits": [
                    { "_id": "a", "_source": { "date": "2019-01-01T00:00:00", "version": "1.0", "status": "backpan", "main_module": "Foo::Bar" } },
                    { "_id": "b", "_source": { "date": "2020-01-01T00:00:00", "version": 1.1, "status": "latest", "main_module": "Foo::Bar" } }
                ]
            }
        }"#;

        let releases = parse_response(body).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].version.as_deref(), Some("1.0"));
        assert_eq!(releases[1].version.as_deref(), Some("1.1"));
        assert_eq!(releases[1].status.as_deref(), Some("latest"));
    }

    #[test]
    fn test_parse_empty_response() {
        let releases = parse_response(r#"{ "hits": { "total": 0, "hits": [] } }"#).unwrap();
        assert!(releases.is_empty());
    }

    #[test]
    fn test_parse_malformed_response() {
        assert!(parse_response(r#"{ "error": "index unavailable" }"#).is_err());
    }
}
