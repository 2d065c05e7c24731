use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::ApiError;
use crate::session::SessionClient;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Exchange username/password for an API token.
///
/// Bad credentials come back as `ClientError { status: 400 }` (or `AuthExpired` for a 401).
pub async fn login(session: &SessionClient, username: &str, password: &str) -> Result<String, ApiError> {
    let response: TokenResponse = session
        .post("/api/token/", &LoginRequest { username, password })
        .await?;
    if response.token.is_empty() {
        return Err(ApiError::Decode("token response was empty".to_string()));
    }
    info!("Signed in as {}", username);
    Ok(response.token)
}

pub async fn register(session: &SessionClient, username: &str, email: &str, password: &str) -> Result<(), ApiError> {
    session
        .post_unit("/api/register/", &RegisterRequest { username, email, password })
        .await?;
    info!("Registered account {}", username);
    Ok(())
}
