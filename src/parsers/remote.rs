use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;

use crate::config::ParserConfig;
use crate::error::ParserError;
use crate::parsers::{IngredientParser, ParsedIngredient};

const DEFAULT_ENDPOINT: &str = "/parse";

/// Client for an HTTP ingredient parsing service.
///
/// Sends `{"sentence": "..."}` and expects a [`ParsedIngredient`] JSON body.
pub struct RemoteParser {
    client: Client,
    base_url: String,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteParser {
    /// Create a new remote parser from configuration
    pub fn new(config: &ParserConfig) -> Result<Self, ParserError> {
        let base_url = config
            .base_url
            .clone()
            .or_else(|| std::env::var("INGREDIENT_PARSER_URL").ok())
            .ok_or_else(|| {
                ParserError::InvalidConfig(
                    "base_url not found in config or INGREDIENT_PARSER_URL".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(RemoteParser {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: config.api_key.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        RemoteParser {
            client: Client::new(),
            base_url: base_url.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

#[async_trait]
impl IngredientParser for RemoteParser {
    fn parser_name(&self) -> &str {
        "remote"
    }

    async fn parse(&self, text: &str) -> Result<ParsedIngredient, ParserError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, self.endpoint))
            .json(&json!({ "sentence": text }));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ParserError::StatusError(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("Remote parser response for '{}': {}", text, body);

        serde_json::from_str(&body).map_err(|e| ParserError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_parse() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .match_body(Matcher::Json(json!({"sentence": "2 cups flour"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "name": [{"text": "flour", "confidence": 0.99}],
                    "amount": [{"quantity": "2", "unit": "cup"}]
                }"#,
            )
            .create();

        let parser = RemoteParser::with_base_url(server.url());
        let parsed = parser.parse("2 cups flour").await.unwrap();

        assert_eq!(parsed.primary_name().unwrap().text, "flour");
        assert_eq!(parsed.primary_amount().unwrap().unit.as_deref(), Some("cup"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_parse_status_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .with_status(500)
            .with_body("boom")
            .create();

        let parser = RemoteParser::with_base_url(server.url());
        let result = parser.parse("2 cups flour").await;

        assert!(matches!(result, Err(ParserError::StatusError(500))));
        mock.assert();
    }

    #[tokio::test]
    async fn test_parse_malformed_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/parse")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "not a list"}"#)
            .create();

        let parser = RemoteParser::with_base_url(server.url());
        let result = parser.parse("1 egg").await;

        assert!(matches!(result, Err(ParserError::MalformedResponse(_))));
        mock.assert();
    }

    #[tokio::test]
    async fn test_api_key_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/ingredients")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"name": [{"text": "salt"}]}"#)
            .create();

        let config = ParserConfig {
            kind: "remote".to_string(),
            base_url: Some(format!("{}/", server.url())),
            endpoint: Some("/v2/ingredients".to_string()),
            api_key: Some("secret".to_string()),
            request_timeout_ms: 1000,
        };
        let parser = RemoteParser::new(&config).unwrap();
        let parsed = parser.parse("salt").await.unwrap();

        assert_eq!(parsed.primary_name().unwrap().text, "salt");
        mock.assert();
    }

    #[test]
    fn test_provider_name() {
        let parser = RemoteParser::with_base_url("http://localhost:1");
        assert_eq!(parser.parser_name(), "remote");
    }
}
