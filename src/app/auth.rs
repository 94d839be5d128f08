use std::error::Error;

use super::{ App, Console };
use crate::models::user::UserProfile;
use crate::validate;

/// Login/signup screen. Returns the logged-in user, or None when the user
/// quits. Validation failures and API errors print inline and the menu
/// comes back; every action is retryable.
pub async fn run(
    app: &App,
    console: &mut Console
) -> Result<Option<UserProfile>, Box<dyn Error + Send + Sync>> {
    println!();
    println!("Welcome to Emergency QR.");

    loop {
        if console.eof() {
            return Ok(None);
        }
        let choice = console.prompt("login / signup / quit").await?;
        match choice.as_str() {
            "login" => {
                if let Some(user) = login(app, console).await? {
                    return Ok(Some(user));
                }
            }
            "signup" => {
                signup(app, console).await?;
            }
            "quit" => {
                return Ok(None);
            }
            "" => {}
            other => {
                println!("Unknown choice '{}'.", other);
            }
        }
    }
}

async fn login(
    app: &App,
    console: &mut Console
) -> Result<Option<UserProfile>, Box<dyn Error + Send + Sync>> {
    let email = console.prompt("Email").await?;
    let password = console.prompt("Password").await?;

    if let Err(e) = validate::check_login(&email, &password) {
        println!("{}", e);
        return Ok(None);
    }

    match app.api.login(&email, &password).await {
        Ok((user, token)) => {
            app.session.save_user(&user)?;
            app.session.save_token(&token)?;
            println!("Login successful! Redirecting...");
            Ok(Some(user))
        }
        Err(e) => {
            println!("{}", e);
            Ok(None)
        }
    }
}

async fn signup(app: &App, console: &mut Console) -> Result<(), Box<dyn Error + Send + Sync>> {
    let name = console.prompt("Name").await?;
    let email = console.prompt("Email").await?;
    let password = console.prompt("Password").await?;
    let confirm = console.prompt("Confirm password").await?;

    if let Err(e) = validate::check_signup(&name, &email, &password, &confirm) {
        println!("{}", e);
        return Ok(());
    }

    match app.api.register(&name, &email, &password).await {
        Ok(_user) => {
            println!("Account created successfully! Please log in.");
        }
        Err(e) => {
            println!("{}", e);
        }
    }
    Ok(())
}
