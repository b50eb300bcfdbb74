use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{API_KEY_VAR, AppConfig};
use crate::domain::diff::PreparedDiff;
use crate::domain::prompt::{SYSTEM_PROMPT, user_prompt};
use crate::error::{AppError, AppResult, UpstreamError};
use crate::infra::retry::retry_rate_limited;
use crate::services::LanguageModelService;

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            max_tokens: config.max_tokens,
            timeout: config.request_timeout,
        })
    }

    fn completions_endpoint(api_base: &str) -> String {
        format!("{}/chat/completions", api_base.trim_end_matches('/'))
    }

    async fn send_once(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<String, UpstreamError> {
        let response = self
            .http
            .post(Self::completions_endpoint(&self.api_base))
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    UpstreamError::Timeout(self.timeout.as_secs())
                } else {
                    UpstreamError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited { retry_after, body },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Unauthorized {
                    status: status.as_u16(),
                    body,
                },
                _ => UpstreamError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| UpstreamError::InvalidResponse(err.to_string()))?;

        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl LanguageModelService for OpenAiClient {
    async fn summarize_diff(&self, diff: &PreparedDiff) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::CredentialMissing { var: API_KEY_VAR })?;

        let prompt = user_prompt(diff);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        info!(
            model = %self.model,
            chars = diff.text.chars().count(),
            "requesting commit message"
        );
        let content = retry_rate_limited(|| self.send_once(api_key, &request)).await?;

        let summary = content.trim();
        if summary.is_empty() {
            return Err(AppError::EmptyResponse);
        }
        debug!(chars = summary.chars().count(), "received commit message");
        Ok(summary.to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::diff::OversizedDiffPolicy;

    fn config(server: &MockServer, api_key: Option<&str>) -> AppConfig {
        AppConfig {
            api_key: api_key.map(str::to_string),
            model: "test-model".to_string(),
            api_base: format!("{}/", server.uri()),
            max_tokens: 256,
            request_timeout: Duration::from_secs(5),
            max_diff_chars: 1_000,
            oversized_diff: OversizedDiffPolicy::Truncate,
            excluded_paths: Vec::new(),
            workspace_root: PathBuf::from("."),
        }
    }

    fn diff() -> PreparedDiff {
        PreparedDiff {
            text: "+ added line to file.txt".to_string(),
            original_chars: 24,
            truncated: false,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn returns_trimmed_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 256
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion("  add a line to file.txt\n")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        let summary = client.summarize_diff(&diff()).await.unwrap();
        assert_eq!(summary, "add a line to file.txt");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], SYSTEM_PROMPT);
        assert_eq!(messages[1]["role"], "user");
        assert!(
            messages[1]["content"]
                .as_str()
                .unwrap()
                .contains("+ added line to file.txt")
        );
    }

    #[tokio::test]
    async fn missing_credential_issues_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, None)).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::CredentialMissing {
                var: "OPENAI_API_KEY"
            }
        ));
    }

    #[tokio::test]
    async fn unauthorized_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-bad"))).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        match err {
            AppError::Upstream(UpstreamError::Unauthorized { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn retries_after_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("second try")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        assert_eq!(client.summarize_diff(&diff()).await.unwrap(), "second try");
    }

    #[tokio::test]
    async fn persistent_rate_limit_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(UpstreamError::RetriesExhausted(_))
        ));
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn blank_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyResponse));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::from_config(&config(&server, Some("sk-test"))).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(UpstreamError::Status { status: 500, .. })
        ));
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("too late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config(&server, Some("sk-test"));
        config.request_timeout = Duration::from_secs(1);
        let client = OpenAiClient::from_config(&config).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(UpstreamError::Timeout(1))));
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let server = MockServer::start().await;
        let mut config = config(&server, Some("sk-test"));
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        config.api_base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OpenAiClient::from_config(&config).unwrap();
        let err = client.summarize_diff(&diff()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Upstream(UpstreamError::Transport(_))
        ));
        assert_eq!(err.exit_code(), 7);
    }
}
