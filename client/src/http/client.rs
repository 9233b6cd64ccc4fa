use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use shared::types::{Alias, ErrorResponse, PostAlias, PutAlias};

use crate::error::ClientError;
use crate::http::Backend;
use crate::storage::TokenStore;

/// Status, redirect target and collected body of one exchange.
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    location: Option<String>,
    body: Bytes,
}

/// [`Backend`] over plain HTTP/1.1 using the hyper client.
///
/// Every request carries `Authorization: Bearer <token>` when the token
/// store holds one. Redirects are not followed; `login_redirect` reads the
/// `Location` header instead.
#[derive(Debug)]
pub struct HttpBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
    tokens: Arc<dyn TokenStore>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        json: Option<Vec<u8>>,
    ) -> Result<RawResponse, ClientError> {
        let uri: Uri = format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|e: http::uri::InvalidUri| ClientError::InvalidUrl(e.to_string()))?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = self.tokens.get()? {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match json {
            Some(bytes) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };

        let request = builder
            .body(body)
            .map_err(|e| ClientError::InvalidUrl(format!("Failed to build request: {}", e)))?;

        debug!("{} {}", method, path);

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            let status = response.status();
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?
                .to_bytes();

            Ok::<_, ClientError>(RawResponse {
                status,
                location,
                body,
            })
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                warn!("{} {} timed out", method, path);
                ClientError::Transport(format!("Request timed out after {:?}", self.timeout))
            })??;

        debug!("{} {} -> {}", method, path, response.status);
        Ok(response)
    }
}

/// Turn a non-2xx response into [`ClientError::Rejected`], preferring the
/// backend's own message over the status reason.
fn ensure_success(response: RawResponse) -> Result<RawResponse, ClientError> {
    if response.status.is_success() {
        return Ok(response);
    }

    let message = ErrorResponse::from_body(&response.body)
        .map(|e| e.message)
        .unwrap_or_else(|| {
            response
                .status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(ClientError::Rejected {
        status: response.status.as_u16(),
        message,
    })
}

fn alias_path(name: &str) -> String {
    format!("/alias/{}", urlencoding::encode(name))
}

impl Backend for HttpBackend {
    async fn list_aliases(&self) -> Result<Vec<Alias>, ClientError> {
        let response = ensure_success(self.send(Method::GET, "/alias", None).await?)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn create_alias(&self, form: &PostAlias) -> Result<Alias, ClientError> {
        let body = serde_json::to_vec(form)?;
        let response = ensure_success(self.send(Method::POST, "/alias", Some(body)).await?)?;

        // Some backends answer with an empty 200; fall back to what we sent.
        match serde_json::from_slice::<Alias>(&response.body) {
            Ok(alias) => Ok(alias),
            Err(e) => {
                debug!("Create response had no alias body ({}), using form", e);
                Ok(Alias::from(form.clone()))
            }
        }
    }

    async fn update_alias(&self, name: &str, form: &PutAlias) -> Result<(), ClientError> {
        let body = serde_json::to_vec(form)?;
        ensure_success(self.send(Method::PUT, &alias_path(name), Some(body)).await?)?;
        Ok(())
    }

    async fn delete_alias(&self, name: &str) -> Result<(), ClientError> {
        ensure_success(self.send(Method::DELETE, &alias_path(name), None).await?)?;
        Ok(())
    }

    async fn login_redirect(&self) -> Result<Option<String>, ClientError> {
        let response = self.send(Method::GET, "/account/login", None).await?;

        if response.status.is_redirection() {
            return Ok(response.location);
        }

        ensure_success(response)?;
        Ok(None)
    }

    async fn authorize(&self, redirect_uri: &str, token: &str) -> Result<(), ClientError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("token", token)
            .finish();

        let path = format!("/auth/authorize?{}", query);
        let response = self.send(Method::GET, &path, None).await?;

        // The backend answers the callback with a redirect that sets its
        // cookie; that counts as success here.
        if response.status.is_redirection() {
            return Ok(());
        }

        ensure_success(response)?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self.send(Method::POST, "/auth/logout", None).await?;

        if response.status.is_redirection() {
            return Ok(());
        }

        ensure_success(response)?;
        Ok(())
    }
}
