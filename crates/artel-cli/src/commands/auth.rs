//! Authentication commands.

use super::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_engine::{
    route_for, Profile, RegisterProfile, RegisterRequest, SessionEvent, SessionState,
};
use std::io::{self, Write};

/// Prompt for one line of input on stdout/stdin.
fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Push an event into the machine and wait for the stream to settle.
async fn dispatch_and_settle(app: &App, event: SessionEvent) -> Result<SessionState> {
    let mut states = app.machine.subscribe();
    app.machine.dispatch(event).await;
    let settled = states.wait_for(|state| !state.is_transient()).await?.clone();
    Ok(settled)
}

/// Login with email and password.
pub async fn login(app: &App, format: &OutputFormat) -> Result<()> {
    if app.repository.is_logged_in()? {
        let role = app.repository.current_role()?;
        let suffix = role.map(|r| format!(" ({})", r)).unwrap_or_default();
        output::print_success(&format!("Already logged in{}", suffix), format);
        return Ok(());
    }

    let email = prompt_line("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    println!("Logging in...");

    let settled = dispatch_and_settle(
        app,
        SessionEvent::LoginRequested {
            email: email.clone(),
            password,
        },
    )
    .await?;

    match settled {
        SessionState::Authenticated => {
            let role = app.repository.current_role()?;
            let suffix = role.map(|r| format!(" ({})", r)).unwrap_or_default();
            output::print_success(&format!("Logged in as {}{}", email, suffix), format);
        }
        SessionState::Error(message) => output::print_error(&message, format),
        other => output::print_error(&format!("Unexpected session state: {:?}", other), format),
    }

    Ok(())
}

/// Register a new account with a role-specific profile.
pub async fn register(
    app: &App,
    email: String,
    phone: String,
    profile: RegisterProfile,
    format: &OutputFormat,
) -> Result<()> {
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    let request = match profile {
        RegisterProfile::Worker(profile) => {
            RegisterRequest::worker(email.clone(), password, phone, profile)
        }
        RegisterProfile::Business(profile) => {
            RegisterRequest::business(email.clone(), password, phone, profile)
        }
        RegisterProfile::Individual(profile) => {
            RegisterRequest::individual(email.clone(), password, phone, profile)
        }
    };

    println!("Registering...");

    let settled = dispatch_and_settle(app, SessionEvent::RegisterRequested(request)).await?;

    match settled {
        SessionState::Authenticated => {
            let role = app.repository.current_role()?;
            let suffix = role.map(|r| format!(" ({})", r)).unwrap_or_default();
            output::print_success(&format!("Registered as {}{}", email, suffix), format);
        }
        SessionState::Error(message) => output::print_error(&message, format),
        other => output::print_error(&format!("Unexpected session state: {:?}", other), format),
    }

    Ok(())
}

/// Logout and clear session.
pub async fn logout(app: &App, format: &OutputFormat) -> Result<()> {
    dispatch_and_settle(app, SessionEvent::LogoutRequested).await?;
    output::print_success("Logged out", format);
    Ok(())
}

/// Check authentication status.
pub async fn status(app: &App, format: &OutputFormat) -> Result<()> {
    let settled = dispatch_and_settle(app, SessionEvent::CheckRequested).await?;
    let role = app.repository.current_role()?;
    let logged_in = settled.is_authenticated();

    match format {
        OutputFormat::Text => {
            if logged_in {
                println!("Auth:     logged in");
                if let Some(role) = role {
                    println!("Role:     {}", role);
                }
            } else {
                println!("Auth:     not logged in");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "logged_in": logged_in,
                "role": role,
                "route": route_for(&settled, role),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// Show the profile of the active session.
pub async fn whoami(app: &App, format: &OutputFormat) -> Result<()> {
    let profile = match app.repository.get_profile().await {
        Ok(profile) => profile,
        Err(err) => {
            output::print_error(&err.to_string(), format);
            return Ok(());
        }
    };

    match format {
        OutputFormat::Text => match &profile {
            Profile::Worker(p) => {
                output::print_row("Role", "worker");
                output::print_row("Name", &p.full_name);
            }
            Profile::Business(p) => {
                output::print_row("Role", "business");
                output::print_row("Company", &p.company_name);
                output::print_row("BIN", &p.bin);
                output::print_row("INN", &p.inn);
                output::print_row("Address", &p.legal_address);
                output::print_row("Contact", &p.contact_name);
                output::print_row("Phone", &p.contact_number);
            }
            Profile::Individual(p) => {
                output::print_row("Role", "individual");
                output::print_row("Name", &p.full_name_ru);
            }
        },
        OutputFormat::Json => {
            let json = match &profile {
                Profile::Worker(p) => serde_json::json!({
                    "role": "worker",
                    "full_name": p.full_name,
                }),
                Profile::Business(p) => serde_json::json!({
                    "role": "business",
                    "company_name": p.company_name,
                    "bin": p.bin,
                    "inn": p.inn,
                    "legal_address": p.legal_address,
                    "contact_name": p.contact_name,
                    "contact_number": p.contact_number,
                }),
                Profile::Individual(p) => serde_json::json!({
                    "role": "individual",
                    "full_name_ru": p.full_name_ru,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
