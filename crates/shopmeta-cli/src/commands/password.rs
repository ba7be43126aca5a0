use shopmeta_core::widgets::{FlagChange, PasswordRestrictionWidget};

use crate::cli::PasswordCommands;
use crate::commands::common::{open_session, resolve_customer};
use crate::error::CliError;

pub async fn run_password(
    command: PasswordCommands,
    global_profile: Option<&str>,
    api_url: Option<&str>,
) -> Result<(), CliError> {
    let session = open_session(global_profile, api_url)?;
    let (target, desired) = match command {
        PasswordCommands::Status { target } => (target, None),
        PasswordCommands::Allow { target } => (target, Some(true)),
        PasswordCommands::Deny { target } => (target, Some(false)),
    };
    let customer_id = resolve_customer(&target)?;
    let mut widget = PasswordRestrictionWidget::mount(session.api.clone(), &customer_id).await?;

    let Some(allowed) = desired else {
        println!(
            "Customer {customer_id}: {}",
            password_status_label(widget.allowed())
        );
        return Ok(());
    };

    match widget.set_allowed(allowed).await {
        FlagChange::Committed(value) => {
            println!("Customer {customer_id}: {}", password_status_label(value));
            Ok(())
        }
        FlagChange::Reverted { value, error } => {
            eprintln!(
                "Customer {customer_id} unchanged: {}",
                password_status_label(value)
            );
            Err(error.into())
        }
    }
}

pub const fn password_status_label(allowed: bool) -> &'static str {
    if allowed {
        "may change password"
    } else {
        "may not change password"
    }
}
