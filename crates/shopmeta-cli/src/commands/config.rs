use std::env;

use shopmeta_core::config::ENV_API_URL;
use shopmeta_core::util::is_http_url;

use crate::auth::TokenStore;
use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_url,
            author,
            timeout_secs,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_url,
            author,
            timeout_secs,
            no_activate,
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn run_config_init(
    profile_name: Option<&str>,
    api_url: Option<String>,
    author: Option<String>,
    timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged_api_url = normalize_text_option(api_url)
        .or_else(|| normalize_text_option(env::var(ENV_API_URL).ok()))
        .or_else(|| existing_profile.api_base_url())
        .map(normalize_api_url)
        .transpose()?;
    let merged_author = normalize_text_option(author).or_else(|| existing_profile.author());

    let profile = config.profile_mut_or_default(&profile_name);
    if let Some(value) = merged_api_url {
        profile.api_base_url = Some(value);
    }
    if let Some(value) = merged_author {
        profile.author = Some(value);
    }
    if let Some(value) = timeout_secs {
        profile.timeout_secs = Some(value);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let ready = config
        .profile(&profile_name)
        .and_then(|profile| profile.api_base_url())
        .is_some();
    if ready {
        println!(
            "Run `shopmeta auth login --profile {profile_name}` to store the admin API token."
        );
    } else {
        println!("Profile '{profile_name}' is missing: api_url");
    }

    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let Some(profile) = config.profile(&profile_name) else {
        println!("Profile '{profile_name}' is not configured.");
        return Ok(());
    };

    let active = config.active_profile.as_deref() == Some(profile_name.as_str());
    let token_stored = TokenStore::new(&profile_name).load()?.is_some();
    println!(
        "Profile '{}'{}",
        profile_name,
        if active { " (active)" } else { "" }
    );
    println!(
        "  api_url: {}",
        profile.api_base_url().as_deref().unwrap_or("(not set)")
    );
    println!(
        "  author:  {}",
        profile.author().as_deref().unwrap_or("(not set)")
    );
    println!(
        "  timeout: {}",
        profile
            .timeout()
            .map_or_else(|| "(default)".to_string(), |t| format!("{}s", t.as_secs()))
    );
    println!(
        "  token:   {}",
        if token_stored { "stored" } else { "(not set)" }
    );
    Ok(())
}

pub fn normalize_api_url(url: String) -> Result<String, CliError> {
    let normalized = normalize_text_option(Some(url))
        .ok_or_else(|| CliError::Config("api_url must not be empty".to_string()))?;
    if !is_http_url(&normalized) {
        return Err(CliError::Config(
            "api_url must include http:// or https://".to_string(),
        ));
    }
    Ok(normalized.trim_end_matches('/').to_string())
}
