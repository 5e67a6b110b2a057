//! Production transport backed by `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use signet_core::{ClientConfiguration, RequestContext};

use crate::request::ApiRequest;
use crate::transport::{ApiResponse, AuthTransport, TransportError};

/// Header carrying the correlation id so server logs line up with ours.
const CLIENT_REQUEST_ID_HEADER: &str = "client-request-id";

/// `reqwest`-backed [`AuthTransport`].
///
/// Posts form-encoded requests against the configured authority. Protocol
/// errors (4xx/5xx) are returned as [`ApiResponse`]s for the flow layer to
/// interpret; only failures to obtain an answer become [`TransportError`]s.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the given configuration.
    #[must_use]
    pub fn new(config: &ClientConfiguration) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.authority().as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Replace the HTTP client, keeping the configured base URL.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint_url(&self, request: &ApiRequest) -> String {
        format!("{}/{}", self.base_url, request.endpoint().path())
    }
}

#[async_trait]
impl AuthTransport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        context: &RequestContext,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint_url(request);
        tracing::debug!(
            correlation_id = %context.correlation_id(),
            endpoint = ?request.endpoint(),
            %url,
            "Sending native-auth request"
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header(CLIENT_REQUEST_ID_HEADER, context.correlation_id().to_string())
            .form(request.form_params())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(
            correlation_id = %context.correlation_id(),
            endpoint = ?request.endpoint(),
            status,
            "Received native-auth response"
        );

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Endpoint;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        // Test-only http base: bypass ClientConfiguration's https requirement
        // by pointing the transport at the mock server directly.
        HttpTransport {
            client: Client::new(),
            base_url: server.uri(),
        }
    }

    #[tokio::test]
    async fn test_posts_form_to_endpoint_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/v2.0/initiate"))
            .and(body_string_contains("username=user%40contoso.com"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"continuation_token":"ct-1"}"#),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let request = ApiRequest::new(Endpoint::SignInInitiate)
            .form("client_id", "client-1")
            .form("username", "user@contoso.com");

        let response = transport
            .send(&request, &RequestContext::new())
            .await
            .unwrap();
        assert!(response.is_success());
        assert!(response.body.contains("ct-1"));
    }

    #[tokio::test]
    async fn test_attaches_correlation_header() {
        let server = MockServer::start().await;
        let context = RequestContext::new();
        Mock::given(method("POST"))
            .and(header(
                CLIENT_REQUEST_ID_HEADER,
                context.correlation_id().to_string().as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let request = ApiRequest::new(Endpoint::Token).form("grant_type", "password");
        transport.send(&request, &context).await.unwrap();
    }

    #[tokio::test]
    async fn test_protocol_error_is_a_response_not_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid_grant","error_codes":[50126]}"#),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server).await;
        let request = ApiRequest::new(Endpoint::Token).form("grant_type", "password");
        let response = transport
            .send(&request, &RequestContext::new())
            .await
            .unwrap();
        assert_eq!(response.status, 400);
        assert!(response.body.contains("invalid_grant"));
    }
}
