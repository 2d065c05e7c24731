use super::{load_config, load_credentials, path_manager};
use crate::output::Output;
use crate::ConfigCommands;
use cinestack_config::Config;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(output).await,
        ConfigCommands::Init { force } => init_config(force, output).await,
    }
}

async fn show_config(output: &Output) -> Result<()> {
    let paths = path_manager();
    let config_file = paths.config_file();
    let config = load_config(&paths)?;
    let credentials = load_credentials(&paths)?;

    if !config_file.exists() {
        output.info(format!(
            "No configuration file at {}, showing defaults. Run `cinestack config init` to write one.",
            config_file.display()
        ));
    }

    let signed_in = credentials.get_api_token().is_some();
    let user = match (signed_in, credentials.get_username()) {
        (true, Some(name)) => name.clone(),
        (true, None) => "(unknown)".to_string(),
        (false, _) => "(not signed in)".to_string(),
    };

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec!["Config file".to_string(), config_file.display().to_string()]);
    table.add_row(vec!["api.base_url".to_string(), config.api.base_url.clone()]);
    table.add_row(vec!["api.timeout_secs".to_string(), config.api.timeout_secs.to_string()]);
    table.add_row(vec!["images.base_url".to_string(), config.images.base_url.clone()]);
    table.add_row(vec!["images.poster_size".to_string(), config.images.poster_size.clone()]);
    table.add_row(vec!["feeds.page_limit".to_string(), config.feeds.page_limit.to_string()]);
    table.add_row(vec!["Record cache".to_string(), paths.record_cache_file().display().to_string()]);
    table.add_row(vec!["Signed in as".to_string(), user]);
    output.table(table);

    output.json(&json!({
        "config_file": config_file,
        "config": config,
        "signed_in": signed_in,
        "username": credentials.get_username(),
        "signed_in_at": credentials.get_signed_in_at(),
    }));
    Ok(())
}

async fn init_config(force: bool, output: &Output) -> Result<()> {
    let paths = path_manager();
    let config_file = paths.config_file();

    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
        return Ok(());
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create {}: {}", paths.config_dir().display(), e))?;
    let config = Config::default();
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    output.json(&json!({"config_file": config_file, "config": config}));
    Ok(())
}
