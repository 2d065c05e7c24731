use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Use `value` if given, otherwise prompt until something non-empty is entered
pub fn value_or_prompt(value: Option<String>, prompt: &str, suggestion: Option<String>) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value.trim().to_string());
    }
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(suggestion) = suggestion {
        input = input.default(suggestion);
    }
    let input = input
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("a value is required")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))?;
    Ok(input.trim().to_string())
}

/// Masked password input
pub fn prompt_password(prompt: &str, confirm: bool) -> Result<String> {
    let mut password = Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation("Repeat password", "Passwords do not match");
    }
    password
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| eyre!("Failed to read confirmation: {}", e))
}
