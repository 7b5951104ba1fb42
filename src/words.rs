/*!
 * Copyright (c) 2026 Ming Lyu, aka mingcheng
 *
 * This source code is licensed under the MIT License,
 * which is located in the LICENSE file in the source tree's root directory.
 *
 * File: words.rs
 * Author: mingcheng <mingcheng@apache.org>
 * File Created: 2026-03-02 10:12:05
 *
 * Modified By: mingcheng <mingcheng@apache.org>
 * Last Modified: 2026-03-02 11:40:17
 */

use crate::config::WordsConfig;
use crate::errors::ClientError;
use anyhow::Context;
use log::{debug, error};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

/// A random word together with its first definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub word: String,
    pub definition: String,
}

#[derive(Debug, Deserialize)]
struct RandomWordResponse {
    word: String,
    results: Option<Vec<WordResult>>,
}

#[derive(Debug, Deserialize)]
struct WordResult {
    definition: String,
}

impl From<RandomWordResponse> for WordRecord {
    fn from(response: RandomWordResponse) -> Self {
        let definition = response
            .results
            .and_then(|results| results.into_iter().next())
            .map(|result| result.definition)
            .unwrap_or_default();

        Self {
            word: response.word,
            definition,
        }
    }
}

/// Client for the RapidAPI Words endpoint.
pub struct WordsClient {
    client: Client,
    api_url: String,
    api_key: String,
    api_host: String,
}

impl WordsClient {
    pub fn new(config: &WordsConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
        })
    }

    pub async fn get_random_word(&self) -> anyhow::Result<WordRecord> {
        let url = Url::parse_with_params(&self.api_url, &[("random", "true")])
            .with_context(|| format!("Invalid Words API url: {}", self.api_url))?;

        debug!("Requesting random word from {}", url);

        let response = self
            .client
            .get(url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
            .context("Words API request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Words API response")?;

        if !status.is_success() {
            error!("Words API error: {} - {}", status, body);
            return Err(ClientError::UpstreamStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: RandomWordResponse =
            serde_json::from_str(&body).context("Malformed Words API response")?;

        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn test_client(server_url: &str) -> WordsClient {
        let config = WordsConfig {
            api_key: "TEST_KEY".to_string(),
            api_url: format!("{}/words/", server_url),
            api_host: "wordsapiv1.p.rapidapi.com".to_string(),
        };
        WordsClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_random_word_with_definition() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::UrlEncoded("random".into(), "true".into()))
            .match_header("X-RapidAPI-Key", "TEST_KEY")
            .match_header("X-RapidAPI-Host", "wordsapiv1.p.rapidapi.com")
            .with_status(200)
            .with_body(r#"{"word": "lucid", "results": [{"definition": "easily understood"}, {"definition": "having a clear mind"}]}"#)
            .create_async()
            .await;

        let record = test_client(&server.url()).get_random_word().await.unwrap();

        assert_eq!(
            record,
            WordRecord {
                word: "lucid".to_string(),
                definition: "easily understood".to_string(),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_random_word_without_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"word": "zymurgy", "frequency": 1.2}"#)
            .create_async()
            .await;

        let record = test_client(&server.url()).get_random_word().await.unwrap();

        assert_eq!(record.word, "zymurgy");
        assert_eq!(record.definition, "");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_random_word_with_empty_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"word": "quire", "results": []}"#)
            .create_async()
            .await;

        let record = test_client(&server.url()).get_random_word().await.unwrap();
        assert_eq!(record.definition, "");
    }

    #[tokio::test]
    async fn test_rejected_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message":"Invalid API key."}"#)
            .create_async()
            .await;

        let err = test_client(&server.url())
            .get_random_word()
            .await
            .unwrap_err();

        match err.downcast_ref::<ClientError>() {
            Some(ClientError::UpstreamStatus { status, body }) => {
                assert_eq!(*status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results": [{"definition": "no word here"}]}"#)
            .create_async()
            .await;

        let result = test_client(&server.url()).get_random_word().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_result_without_definition_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/words/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"word": "x", "results": [{"partOfSpeech": "noun"}]}"#)
            .create_async()
            .await;

        let err = test_client(&server.url())
            .get_random_word()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Malformed Words API response");
        mock.assert_async().await;
    }

    #[test]
    fn test_record_takes_first_definition() {
        let response: RandomWordResponse = serde_json::from_value(serde_json::json!({
            "word": "lucid",
            "results": [{"definition": "easily understood"}]
        }))
        .unwrap();

        let record = WordRecord::from(response);
        assert_eq!(record.definition, "easily understood");
    }
}
