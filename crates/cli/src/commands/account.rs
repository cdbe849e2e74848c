//! Account and profile commands.

use std::path::Path;

use food_order_client::Result;
use food_order_client::backend::{SignInForm, SignUpForm, User};
use food_order_client::services::{save_name, upload_avatar};
use food_order_client::state::AppState;

/// Create an account, which also signs in.
pub async fn sign_up(state: &AppState, name: &str, email: &str, password: &str) -> Result<()> {
    let form = SignUpForm::parse(name, email, password)?;
    let auth = state.auth().sign_up(state.backend(), &form).await?;
    tracing::info!("Account created");
    print_user(auth.user.as_ref());
    Ok(())
}

/// Sign in and show the account.
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<()> {
    let form = SignInForm::parse(email, password)?;
    let auth = state.auth().sign_in(state.backend(), &form).await?;
    print_user(auth.user.as_ref());
    Ok(())
}

/// End the current session.
#[allow(clippy::print_stdout)]
pub async fn sign_out(state: &AppState) -> Result<()> {
    state.auth().sign_out(state.backend()).await?;
    println!("Signed out.");
    Ok(())
}

/// Show who is signed in.
pub fn whoami(state: &AppState) {
    print_user(state.auth().user().as_ref());
}

/// Rename the signed-in user.
pub async fn set_name(state: &AppState, name: &str) -> Result<()> {
    let user = save_name(state.backend(), state.auth(), name).await?;
    print_user(Some(&user));
    Ok(())
}

/// Upload an avatar for the signed-in user.
pub async fn avatar(state: &AppState, path: &Path) -> Result<()> {
    let user = upload_avatar(state.backend(), state.auth(), path).await?;
    print_user(Some(&user));
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_user(user: Option<&User>) {
    match user {
        Some(user) => {
            println!("{} <{}>", user.name, user.email);
            println!("  Avatar: {}", user.avatar_url);
        }
        None => println!("Not signed in."),
    }
}
