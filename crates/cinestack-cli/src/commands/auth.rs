use super::prompts::{prompt_password, value_or_prompt};
use super::{fail, load_config, load_credentials, path_manager};
use crate::output::Output;
use cinestack_core::CineError;
use cinestack_sources::backend::{login, register};
use cinestack_sources::{ApiError, SessionClient, SessionContext};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

fn anonymous_session() -> Result<SessionClient> {
    let config = load_config(&path_manager())?;
    SessionClient::new(config.api.base_url.clone(), SessionContext::anonymous(), config.api.timeout())
        .map_err(|e| eyre!("Failed to create HTTP client: {}", e))
}

/// Bad credentials come back as a plain 400, which is not a validation problem of ours
fn login_error(err: ApiError) -> CineError {
    match err.status() {
        Some(400) | Some(401) => CineError::ValidationError("unable to sign in with the provided credentials".to_string()),
        _ => CineError::from(err),
    }
}

async fn sign_in(session: &SessionClient, username: &str, password: &str, output: &Output) -> Result<()> {
    let token = login(session, username, password)
        .await
        .map_err(|e| fail(login_error(e), output))?;

    let paths = path_manager();
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create {}: {}", paths.config_dir().display(), e))?;
    let mut credentials = load_credentials(&paths)?;
    credentials.set_api_token(token, username);
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;

    output.success(format!("Signed in as {}", username));
    output.json(&json!({"signed_in": true, "username": username}));
    Ok(())
}

pub async fn run_login(username: Option<String>, output: &Output) -> Result<()> {
    let session = anonymous_session()?;
    let previous = load_credentials(&path_manager())?.get_username().cloned();
    let username = value_or_prompt(username, "Username", previous)?;
    let password = prompt_password("Password", false)?;
    sign_in(&session, &username, &password, output).await
}

pub async fn run_register(username: Option<String>, email: Option<String>, output: &Output) -> Result<()> {
    let session = anonymous_session()?;
    let username = value_or_prompt(username, "Username", None)?;
    let email = value_or_prompt(email, "Email", None)?;
    let password = prompt_password("Password", true)?;

    register(&session, &username, &email, &password)
        .await
        .map_err(|e| fail(CineError::from(e), output))?;
    output.success(format!("Registered {}", username));

    sign_in(&session, &username, &password, output).await
}

pub async fn run_logout(output: &Output) -> Result<()> {
    let paths = path_manager();
    let mut credentials = load_credentials(&paths)?;
    if credentials.get_api_token().is_none() {
        output.info("Not signed in");
        return Ok(());
    }

    // The username stays behind so the next login can suggest it
    let username = credentials.get_username().cloned().unwrap_or_default();
    credentials.clear_api_token();
    credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success(format!("Signed out {}", username).trim_end());
    output.json(&json!({"signed_in": false, "username": username}));
    Ok(())
}
