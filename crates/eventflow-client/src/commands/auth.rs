//! Session commands.

use eventflow_remote::Registration;
use tracing::info;

use crate::commands::App;
use crate::error::ClientResult;
use crate::render;
use crate::secret;

pub async fn login(app: &App, username: &str, password: &str) -> ClientResult<()> {
    let password = secret::resolve(password)?;
    let user = app.gate().login(username, password).await?;
    info!(username = %user.username, "login succeeded");
    println!("Logged in as {}.", render::format_user(&user));
    Ok(())
}

pub async fn register(
    app: &App,
    username: &str,
    password: &str,
    email: Option<String>,
) -> ClientResult<()> {
    let password = secret::resolve(password)?;
    let mut registration = Registration::new(username, password);
    if let Some(email) = email {
        registration = registration.with_email(email);
    }
    let user = app.gate().register(registration).await?;
    println!("Registered and logged in as {}.", render::format_user(&user));
    Ok(())
}

/// Forgets the stored credential. Works offline.
pub fn logout(app: &App) -> ClientResult<()> {
    app.gate().logout();
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &App) -> ClientResult<()> {
    let user = app.require_user().await?;
    println!("{}", render::format_user(&user));
    Ok(())
}
