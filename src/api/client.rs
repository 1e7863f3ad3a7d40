use super::types::{ErrorBody, ErrorField};
use crate::models::normalize_base_url;
use crate::{Error, Result};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

/// Thin REST client for the discharge backend. Every endpoint path is
/// resolved against one base URL.
///
/// No request timeout is set: a pending call resolves only when the
/// transport does.
#[derive(Clone)]
pub struct BackendHttpClient {
    client: Client,
    base_url: String,
}

impl BackendHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
        error_fields: &[ErrorField],
    ) -> Result<Resp> {
        let builder = self.client.post(self.url(path)).json(request);
        self.execute(path, builder, error_fields).await
    }

    pub async fn post_multipart<Resp: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        error_fields: &[ErrorField],
    ) -> Result<Resp> {
        let builder = self.client.post(self.url(path)).multipart(form);
        self.execute(path, builder, error_fields).await
    }

    async fn execute<Resp: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
        error_fields: &[ErrorField],
    ) -> Result<Resp> {
        tracing::debug!("POST {}{}", self.base_url, path);

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to {}: {}", path, e);
            e
        })?;

        if !response.status().is_success() {
            return Err(Self::backend_error(path, response, error_fields).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}\nBody: {}", path, e, body);
            Error::MalformedResponse(format!("unreadable body ({})", e))
        })
    }

    async fn backend_error(path: &str, response: Response, error_fields: &[ErrorField]) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Backend error on {} (status {}): {}", path, status, body);

        Error::Backend {
            status: status.as_u16(),
            message: classify_error(&body, status.canonical_reason(), error_fields),
        }
    }
}

/// Pick the text shown for a failed request: the first populated JSON field
/// in precedence order, then the transport status text, then a generic
/// fallback.
pub fn classify_error(body: &str, status_text: Option<&str>, error_fields: &[ErrorField]) -> String {
    ErrorBody::parse(body)
        .and_then(|parsed| parsed.describe(error_fields))
        .or_else(|| {
            status_text
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{CHAT_ERROR_FIELDS, QUERY_ERROR_FIELDS};
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    #[test]
    fn test_classify_prefers_details() {
        let body = r#"{"details":"Gemini quota","error":"Failed","fullError":"trace"}"#;
        assert_eq!(
            classify_error(body, Some("Internal Server Error"), QUERY_ERROR_FIELDS),
            "Gemini quota"
        );
    }

    #[test]
    fn test_classify_ignores_non_string_sibling() {
        let body = r#"{"details":"All models exhausted","fullError":{"status":429}}"#;
        assert_eq!(
            classify_error(body, Some("Internal Server Error"), QUERY_ERROR_FIELDS),
            "All models exhausted"
        );
    }

    #[test]
    fn test_classify_falls_back_to_status_text() {
        assert_eq!(
            classify_error("<html>oops</html>", Some("Bad Gateway"), QUERY_ERROR_FIELDS),
            "Bad Gateway"
        );
        assert_eq!(
            classify_error(r#"{"details":"ignored"}"#, Some("Bad Gateway"), CHAT_ERROR_FIELDS),
            "Bad Gateway"
        );
    }

    #[test]
    fn test_classify_falls_back_to_unknown() {
        assert_eq!(classify_error("", None, QUERY_ERROR_FIELDS), UNKNOWN_SERVER_ERROR);
        assert_eq!(classify_error("{}", Some(""), CHAT_ERROR_FIELDS), UNKNOWN_SERVER_ERROR);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = BackendHttpClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/api/chat"), "http://localhost:5000/api/chat");
    }

    #[tokio::test]
    async fn test_post_json_parses_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = BackendHttpClient::new(&server.uri());
        let pong: Pong = client
            .post_json("/api/ping", &serde_json::json!({}), CHAT_ERROR_FIELDS)
            .await
            .unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn test_non_json_success_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = BackendHttpClient::new(&server.uri());
        let err = client
            .post_json::<_, Pong>("/api/ping", &serde_json::json!({}), CHAT_ERROR_FIELDS)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/ping"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(serde_json::json!({"error": "busy"})),
            )
            .mount(&server)
            .await;

        let client = BackendHttpClient::new(&server.uri());
        let err = client
            .post_json::<_, Pong>("/api/ping", &serde_json::json!({}), CHAT_ERROR_FIELDS)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "busy");
    }
}
