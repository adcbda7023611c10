use crate::config::Config;
use crate::error::{Endpoint, Error, Result};
use crate::message::{sanitize_history, Message};
use crate::metrics::{parse_metrics, Metric};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /rag_chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub history: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth_source: Option<&'a str>,
}

/// Raw `POST /rag_chat` response. History and metrics stay untyped until
/// they have been filtered.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    answer: String,
    history: Vec<Value>,
    #[serde(default)]
    metrics: Option<Vec<Value>>,
}

/// Body of `POST /evaluate`
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRequest<'a> {
    pub question: &'a str,
    pub answer: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvaluateResponse {
    evaluation: String,
}

/// A chat reply after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    /// Server history with invalid entries removed
    pub history: Vec<Message>,
    pub metrics: Option<Vec<Metric>>,
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        Self {
            answer: response.answer,
            history: sanitize_history(response.history),
            metrics: response.metrics.map(parse_metrics),
        }
    }
}

/// HTTP client for the RAG backend
#[derive(Clone)]
pub struct RagClient {
    client: reqwest::Client,
    chat_url: String,
    evaluate_url: String,
}

impl RagClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            chat_url: config.endpoint_url(Endpoint::Chat.path()),
            evaluate_url: config.endpoint_url(Endpoint::Evaluate.path()),
        })
    }

    /// Send one chat turn
    pub async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        tracing::debug!(
            url = %self.chat_url,
            history_len = request.history.len(),
            "sending chat request"
        );
        let response: ChatResponse = self.post(Endpoint::Chat, &self.chat_url, request).await?;
        Ok(response.into())
    }

    /// Ask the backend to grade an answer
    pub async fn evaluate(&self, request: &EvaluateRequest<'_>) -> Result<String> {
        tracing::debug!(url = %self.evaluate_url, "sending evaluation request");
        let response: EvaluateResponse = self
            .post(Endpoint::Evaluate, &self.evaluate_url, request)
            .await?;
        Ok(response.evaluation)
    }

    async fn post<B, T>(&self, endpoint: Endpoint, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| Error::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { endpoint, status });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| Error::Transport { endpoint, source })?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode { endpoint, source })
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> RagClient {
        let mut config = Config::default();
        config.base_url = server.url();
        config.request_timeout_secs = 5;
        RagClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_chat_sends_message_and_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rag_chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "message": "hello",
                "history": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "answer": "hi there",
                    "history": [
                        {"role": "user", "content": "hello"},
                        {"role": "assistant", "content": "hi there"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let history = vec![Message::user("hello")];
        let request = ChatRequest { message: "hello", history: &history, ground_truth_source: None };
        let actual = client_for(&server).chat(&request).await.unwrap();

        let expected = ChatReply {
            answer: "hi there".to_string(),
            history: vec![Message::user("hello"), Message::assistant("hi there")],
            metrics: None,
        };
        assert_eq!(actual, expected);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_includes_ground_truth_source_when_set() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rag_chat")
            .match_body(Matcher::PartialJson(json!({"ground_truth_source": "all"})))
            .with_status(200)
            .with_body(json!({"answer": "ok", "history": []}).to_string())
            .create_async()
            .await;

        let request = ChatRequest { message: "q", history: &[], ground_truth_source: Some("all") };
        client_for(&server).chat(&request).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_parses_metrics() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rag_chat")
            .with_status(200)
            .with_body(
                json!({
                    "answer": "a",
                    "history": [],
                    "metrics": [{"dataset": "A", "bleu": 0.5, "rouge": {"1": 0.3}}, {"bleu": 1}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = ChatRequest { message: "q", history: &[], ground_truth_source: None };
        let actual = client_for(&server).chat(&request).await.unwrap();

        let metrics = actual.metrics.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].summary(), "A  BLEU 0.5000  ROUGE 1:0.3000");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/rag_chat").with_status(503).create_async().await;

        let request = ChatRequest { message: "q", history: &[], ground_truth_source: None };
        let actual = client_for(&server).chat(&request).await.unwrap_err();

        assert!(matches!(actual, Error::Status { endpoint: Endpoint::Chat, .. }));
        assert_eq!(actual.user_message(), "Error: Could not connect to the chat service.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/evaluate")
            .with_status(200)
            .with_body("{\"verdict\": 1}")
            .create_async()
            .await;

        let request = EvaluateRequest { question: "q", answer: "a" };
        let actual = client_for(&server).evaluate(&request).await.unwrap_err();

        assert!(matches!(actual, Error::Decode { endpoint: Endpoint::Evaluate, .. }));
    }

    #[tokio::test]
    async fn test_evaluate_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/evaluate")
            .match_body(Matcher::Json(json!({"question": "q", "answer": "a"})))
            .with_status(200)
            .with_body(json!({"evaluation": "Faithful and complete."}).to_string())
            .create_async()
            .await;

        let request = EvaluateRequest { question: "q", answer: "a" };
        let actual = client_for(&server).evaluate(&request).await.unwrap();

        assert_eq!(actual, "Faithful and complete.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        let mut config = Config::default();
        config.base_url = "http://127.0.0.1:1".to_string();
        let client = RagClient::new(&config).unwrap();

        let request = ChatRequest { message: "q", history: &[], ground_truth_source: None };
        let actual = client.chat(&request).await.unwrap_err();

        assert!(matches!(actual, Error::Transport { endpoint: Endpoint::Chat, .. }));
    }
}
