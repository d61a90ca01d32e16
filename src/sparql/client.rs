use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{OntologyBackend, SparqlResults, VariableMatch};
use crate::templates::TemplateManager;

const RESULTS_ACCEPT: &str = "application/sparql-results+json, application/json;q=0.9";

/// Client for a SPARQL 1.1 protocol endpoint, queried over HTTP GET.
pub struct SparqlClient {
    client: reqwest::Client,
    endpoint: url::Url,
    svu_namespace: String,
    templates: TemplateManager,
}

impl SparqlClient {
    pub fn new(endpoint: &str, svu_namespace: &str, timeout: u64) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .with_context(|| format!("Invalid SPARQL endpoint URL: {}", endpoint))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(RESULTS_ACCEPT),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            svu_namespace: svu_namespace.to_string(),
            templates: TemplateManager::new()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Run a query and decode the JSON results document.
    pub async fn select(&self, query: &str) -> Result<SparqlResults> {
        let start_time = Instant::now();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", query)])
            .send()
            .await
            .with_context(|| format!("Failed to reach SPARQL endpoint {}", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("SPARQL endpoint error {}: {}", status, error_text);
        }

        let results: SparqlResults = response
            .json()
            .await
            .context("Failed to parse SPARQL results")?;

        debug!(
            "SPARQL query returned {} bindings in {:?}",
            results.bindings().len(),
            start_time.elapsed()
        );

        Ok(results)
    }

    /// Whether the endpoint answers a trivial `ASK {}`.
    pub async fn check_health(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", "ASK {}")])
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let results: SparqlResults = match resp.json().await {
                    Ok(results) => results,
                    Err(_) => return Ok(false),
                };
                Ok(results.boolean.is_some())
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl OntologyBackend for SparqlClient {
    async fn classes_for_label(&self, term: &str) -> Result<Vec<String>> {
        let query = self.templates.class_query(term)?;
        let results = self
            .select(&query)
            .await
            .with_context(|| format!("Class lookup failed for '{}'", term))?;
        Ok(results.classes())
    }

    async fn variables_for_sublabel(&self, term: &str) -> Result<Vec<VariableMatch>> {
        let query = self.templates.variable_query(term, &self.svu_namespace)?;
        let results = self
            .select(&query)
            .await
            .with_context(|| format!("Variable lookup failed for '{}'", term))?;
        Ok(results.variables())
    }

    fn describe(&self) -> String {
        format!("sparql endpoint {}", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::DEFAULT_SVU_NAMESPACE;
    use mockito::Matcher;

    const CLASS_BODY: &str = r#"{"head": {"vars": ["entity", "class"]}, "results": {"bindings": [
        {"entity": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svl/phenomenon#river"},
         "class": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svu#Phenomenon"}},
        {"entity": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svl/body#river"},
         "class": {"type": "uri", "value": "http://www.geoscienceontology.org/svo/svu#Body"}}
    ]}}"#;

    #[tokio::test]
    async fn test_classes_for_label() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sparql")
            .match_query(Matcher::UrlEncoded(
                "query".into(),
                TemplateManager::new().unwrap().class_query("river").unwrap(),
            ))
            .with_status(200)
            .with_header("content-type", "application/sparql-results+json")
            .with_body(CLASS_BODY)
            .create_async()
            .await;

        let client = SparqlClient::new(&format!("{}/sparql", server.url()), DEFAULT_SVU_NAMESPACE, 5).unwrap();
        let classes = client.classes_for_label("river").await.unwrap();

        mock.assert_async().await;
        assert_eq!(classes, vec!["Phenomenon", "Body"]);
    }

    #[tokio::test]
    async fn test_variables_for_sublabel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sparql")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"head": {"vars": ["variable", "label", "varlabel"]}, "results": {"bindings": [
                    {"variable": {"type": "uri", "value": "http://x/variable#river__discharge"},
                     "label": {"type": "literal", "value": "discharge"},
                     "varlabel": {"type": "literal", "value": "river discharge"}}
                ]}}"#,
            )
            .create_async()
            .await;

        let client = SparqlClient::new(&format!("{}/sparql", server.url()), DEFAULT_SVU_NAMESPACE, 5).unwrap();
        let variables = client.variables_for_sublabel("discharge").await.unwrap();

        assert_eq!(variables, vec![VariableMatch::new("river__discharge", "river discharge")]);
    }

    #[tokio::test]
    async fn test_endpoint_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sparql")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = SparqlClient::new(&format!("{}/sparql", server.url()), DEFAULT_SVU_NAMESPACE, 5).unwrap();
        let err = client.classes_for_label("river").await.unwrap_err();

        assert!(format!("{:#}", err).contains("503"));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(SparqlClient::new("not a url", DEFAULT_SVU_NAMESPACE, 5).is_err());
    }

    #[tokio::test]
    async fn test_check_health() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sparql")
            .match_query(Matcher::UrlEncoded("query".into(), "ASK {}".into()))
            .with_status(200)
            .with_body(r#"{"head": {}, "boolean": true}"#)
            .create_async()
            .await;

        let client = SparqlClient::new(&format!("{}/sparql", server.url()), DEFAULT_SVU_NAMESPACE, 5).unwrap();
        assert!(client.check_health().await.unwrap());

        let unreachable = SparqlClient::new("http://127.0.0.1:9/sparql", DEFAULT_SVU_NAMESPACE, 1).unwrap();
        assert!(!unreachable.check_health().await.unwrap());
    }
}
