use crate::auth::{mask_token, TokenStore};
use crate::cli::AuthCommands;
use crate::commands::common::read_piped_stdin;
use crate::config_profiles::{normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { profile, token } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            let token = match normalize_text_option(token) {
                Some(token) => token,
                None => read_piped_stdin()?.ok_or_else(|| {
                    CliError::Auth("No token provided; pass --token or pipe it on stdin".to_string())
                })?,
            };
            TokenStore::new(&profile_name).save(&token)?;
            println!(
                "Stored admin API token {} for profile '{profile_name}'",
                mask_token(&token)
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            match TokenStore::new(&profile_name).load()? {
                Some(token) => println!(
                    "Profile '{profile_name}' has a stored token ({})",
                    mask_token(&token)
                ),
                None => println!("Profile '{profile_name}' has no stored token."),
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let profile_name = resolve_profile(profile.as_deref().or(global_profile))?;
            TokenStore::new(&profile_name).clear()?;
            println!("Removed stored token for profile '{profile_name}'");
            Ok(())
        }
    }
}

fn resolve_profile(explicit: Option<&str>) -> Result<String, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    Ok(config.resolve_profile_name(explicit))
}
