use crate::config::ScraperConfig;
use crate::core::extractor::{completion_content, CompletionRequest};
use crate::domain::ports::{CompletionBackend, FetchOutcome, PageFetcher};
use crate::utils::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 以 GET 抓取個人頁面
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(config.fetch_timeout(), config.user_agent())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        tracing::debug!("Fetching profile page: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Profile page response status: {}", status);

        if !status.is_success() {
            return Ok(FetchOutcome::Unavailable {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            Ok(FetchOutcome::Empty)
        } else {
            Ok(FetchOutcome::Page(body))
        }
    }
}

/// OpenAI 相容的 chat completions 端點
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(api_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(
            &config.completion.api_url,
            &config.completion.api_key,
            &config.completion.model,
            config.completion_timeout(),
        )
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest::single_turn(&self.model, prompt);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(200).collect();
            return Err(ScraperError::TransportMessage {
                message: format!("completion endpoint returned HTTP {}: {}", status, excerpt),
            });
        }

        completion_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FailureKind;
    use httpmock::prelude::*;

    fn fetcher() -> HttpPageFetcher {
        HttpPageFetcher::new(Duration::from_secs(5), "profile-scraper-test").unwrap()
    }

    fn completion_client(server: &MockServer) -> OpenAiCompletionClient {
        OpenAiCompletionClient::new(
            &server.url("/v1/chat/completions"),
            "sk-test",
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_page_body() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/people/jane")
                .header("user-agent", "profile-scraper-test");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html><body><main>Jane Doe</main></body></html>");
        });

        let outcome = fetcher().fetch(&server.url("/people/jane")).await.unwrap();

        page_mock.assert();
        assert_eq!(
            outcome,
            FetchOutcome::Page("<html><body><main>Jane Doe</main></body></html>".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/people/gone");
            then.status(404);
        });

        let outcome = fetcher().fetch(&server.url("/people/gone")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Unavailable { status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_blank_body_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/people/blank");
            then.status(200).body("  \n");
        });

        let outcome = fetcher().fetch(&server.url("/people/blank")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_transport_error() {
        let err = fetcher().fetch("http://127.0.0.1:1/people").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_completion_sends_bearer_auth_and_single_user_message() {
        let server = MockServer::start();
        let completion_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(serde_json::json!({
                    "model": "gpt-4o-mini",
                    "messages": [{"role": "user", "content": "Extract: Jane Doe"}],
                    "temperature": 0.0
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "[Jane Doe, jane@x.edu, Ethics]"}}
                    ]
                }));
        });

        let content = completion_client(&server)
            .complete("Extract: Jane Doe")
            .await
            .unwrap();

        completion_mock.assert();
        assert_eq!(content, "[Jane Doe, jane@x.edu, Ethics]");
    }

    #[tokio::test]
    async fn test_completion_server_error_is_retryable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503).body("overloaded");
        });

        let err = completion_client(&server).complete("prompt").await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_completion_without_choices_is_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"choices": []}));
        });

        let err = completion_client(&server).complete("prompt").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }
}
