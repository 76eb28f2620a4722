//! CLI auth command handlers for login and status.

use std::io::Write;

use super::GlobalArgs;
use crate::auth::{AuthSession, TokenStatus};

/// Handle `insighter auth login`.
pub async fn handle_login(global: &GlobalArgs, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = global.settings()?;
    let session = AuthSession::from_settings(&settings)?;

    let request = match session.fetch_token(force)? {
        TokenStatus::Ready => {
            println!("✅ Already authenticated ({})", session.flow().name());
            return Ok(());
        }
        TokenStatus::AuthorizationRequired(request) => request,
    };

    println!("🔗 Visit: {}", request.url);
    println!("📋 After authorizing, paste the full redirect URL below:");
    print!("> ");
    std::io::stdout().flush()?;

    let mut response = String::new();
    std::io::stdin().read_line(&mut response)?;
    let response = response.trim();

    if response.is_empty() {
        eprintln!("❌ No redirect URL provided.");
        std::process::exit(1);
    }

    session.complete_authorization(&request, response).await?;
    match &settings.token_path {
        Some(path) => println!("✅ Login successful, token saved to {}", path.display()),
        None => println!("✅ Login successful (no token path configured, token not saved)"),
    }
    Ok(())
}

/// Handle `insighter auth status`.
pub async fn handle_status(global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = global.settings()?;
    let session = AuthSession::from_settings(&settings)?;

    println!("🔐 Authentication Status\n");
    println!("  Flow: {}", session.flow().name());
    println!("  Host: {}", session.environment().host());
    if let Some(tenant) = &settings.tenant {
        println!("  Tenant: {tenant}");
    }
    match session.token() {
        Some(token) => {
            let expiry = token
                .expires_at_utc()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            let refresh = if token.refresh_token.is_some() { "yes" } else { "no" };
            println!("  Token: ✅ loaded (expires {expiry}, refreshable: {refresh})");
        }
        None => println!("  Token: ❌ Not logged in"),
    }
    if let Some(path) = &settings.token_path {
        println!("  Token file: {}", path.display());
    }
    Ok(())
}
