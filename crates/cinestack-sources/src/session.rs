use crate::error::{classify_status, ApiError};
use cinestack_config::CredentialStore;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Credential state for one signed-in (or anonymous) user.
///
/// Built once at startup and handed to every client; signing out produces a new
/// context rather than mutating a shared one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    credential: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self { credential: None }
    }

    pub fn with_credential(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            credential: (!token.is_empty()).then_some(token),
        }
    }

    pub fn from_store(store: &CredentialStore) -> Self {
        match store.get_api_token() {
            Some(token) => Self::with_credential(token.clone()),
            None => Self::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn sign_out(&self) -> Self {
        Self::anonymous()
    }

    /// Value of the `Authorization` header, if there is a credential
    pub fn authorization(&self) -> Option<String> {
        self.credential.as_ref().map(|token| format!("Token {}", token))
    }
}

/// Thin HTTP layer over the backend: attaches the credential and classifies failures.
///
/// Never retries and never drops the credential on its own; both are caller decisions.
#[derive(Clone)]
pub struct SessionClient {
    client: Client,
    base_url: String,
    context: SessionContext,
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>, context: SessionContext, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::NetworkUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url, context))
    }

    /// Use a preconfigured reqwest client (its timeout and proxy settings apply)
    pub fn with_client(client: Client, base_url: impl Into<String>, context: SessionContext) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            context,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same connection pool, credential cleared
    pub fn sign_out(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            context: self.context.sign_out(),
        }
    }

    pub fn with_context(&self, context: SessionContext) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            context,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");
        match self.context.authorization() {
            Some(value) => builder.header("Authorization", value),
            None => builder,
        }
    }

    async fn execute(&self, method: &Method, path: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        debug!("API request: {} {}", method, path);
        let response = builder.send().await.map_err(|e| {
            let err = ApiError::from_transport(e);
            warn!("API request {} {} failed: {}", method, path, err);
            err
        })?;

        let status = response.status();
        debug!("API response: {} {} -> {}", method, path, status);
        if !(status.is_client_error() || status.is_server_error()) {
            return Ok(response);
        }

        // Only error responses get their body consumed here
        let body = response.text().await.unwrap_or_default();
        let err = classify_status(status, body).unwrap_or(ApiError::ServerError {
            status: status.as_u16(),
            body: String::new(),
        });
        if err == ApiError::AuthExpired {
            warn!("API {} {}: credential rejected (401)", method, path);
        } else {
            debug!("API {} {} error: {}", method, path, err);
        }
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute(&method, path, builder).await?;
        response.json::<T>().await.map_err(ApiError::from_body)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).query(query);
        self.send_json(Method::GET, path, builder).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path).json(body);
        self.send_json(Method::POST, path, builder).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let builder = self.request(Method::PATCH, path).json(body);
        self.send_json(Method::PATCH, path, builder).await
    }

    /// POST where the response body is irrelevant
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(&Method::POST, path, builder).await.map(|_| ())
    }

    pub async fn patch_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let builder = self.request(Method::PATCH, path).json(body);
        self.execute(&Method::PATCH, path, builder).await.map(|_| ())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path);
        self.execute(&Method::DELETE, path, builder).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests;
