use std::error::Error;
use std::fs;

use super::{ profile, App, Console };
use crate::api::ProfileUpdate;
use crate::models::user::{ EmergencyContact, UserProfile };
use crate::validate;

pub enum Exit {
    Logout,
    Quit,
}

/// The authenticated dashboard: view and edit emergency information,
/// generate the QR code, and open public profiles.
pub async fn run(
    app: &App,
    console: &mut Console,
    mut user: UserProfile
) -> Result<Exit, Box<dyn Error + Send + Sync>> {
    println!();
    println!("Emergency QR Dashboard — signed in as {}", user.name);
    render(&user);

    loop {
        if console.eof() {
            return Ok(Exit::Quit);
        }
        let choice = console.prompt("info / edit / qr / link / profile / logout / quit").await?;
        match choice.as_str() {
            "info" => {
                render(&user);
            }
            "edit" => {
                if let Some(updated) = edit(app, console, &user).await? {
                    user = updated;
                }
            }
            "qr" => {
                save_qr(app, &user).await?;
            }
            "link" => {
                println!(
                    "{}/{}",
                    app.args.profile_link_base.trim_end_matches('/'),
                    user.id
                );
            }
            "profile" => {
                let id = console.prompt("Profile id (blank for your own)").await?;
                let id = if id.is_empty() { user.id.clone() } else { id };
                profile::run(app, console, &id).await?;
            }
            "logout" => {
                return Ok(Exit::Logout);
            }
            "quit" => {
                return Ok(Exit::Quit);
            }
            "" => {}
            other => {
                println!("Unknown command '{}'.", other);
            }
        }
    }
}

fn render(user: &UserProfile) {
    println!();
    println!("Blood Type:      {}", user.blood_type.as_deref().unwrap_or("not set"));
    println!("Medical History: {}", user.medical_history.as_deref().unwrap_or("None"));
    if user.emergency_contacts.is_empty() {
        println!("Emergency Contacts: none");
    } else {
        println!("Emergency Contacts:");
        for contact in &user.emergency_contacts {
            match &contact.relationship {
                Some(rel) => println!("  - {} ({}) {}", contact.name, rel, contact.phone),
                None => println!("  - {} {}", contact.name, contact.phone),
            }
        }
    }
    println!("QR Code: {}", if user.qr_code.is_some() {
        "generated"
    } else {
        "not generated yet"
    });
}

/// Collects the update form, pushes it, then requests a fresh QR code and
/// persists the merged user. Runs entirely on the dashboard; nothing is
/// submitted if validation fails.
async fn edit(
    app: &App,
    console: &mut Console,
    user: &UserProfile
) -> Result<Option<UserProfile>, Box<dyn Error + Send + Sync>> {
    let blood_type = console.prompt("Blood type (e.g. O+)").await?;
    let medical_history = console.prompt("Medical history (e.g. Diabetes, Asthma, None)").await?;

    let mut contacts: Vec<EmergencyContact> = Vec::new();
    println!("Enter emergency contacts; blank name finishes the list.");
    loop {
        let name = console.prompt("Contact name").await?;
        if name.is_empty() {
            break;
        }
        let phone = console.prompt("Contact phone").await?;
        let relationship = console.prompt("Relationship (optional)").await?;
        contacts.push(EmergencyContact {
            name,
            phone,
            relationship: if relationship.is_empty() {
                None
            } else {
                Some(relationship)
            },
        });
    }

    let contacts = match validate::check_profile_update(&blood_type, &contacts) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            println!("{}", e);
            return Ok(None);
        }
    };

    let token = app.session.load_token()?.unwrap_or_default();
    let update = ProfileUpdate {
        blood_type,
        medical_history,
        emergency_contacts: contacts,
    };

    let updated = match app.api.update_profile(&token, &update).await {
        Ok(u) => u,
        Err(e) => {
            println!("{}", e);
            return Ok(None);
        }
    };

    match app.api.generate_qr(&token).await {
        Ok(qr_code) => {
            let mut merged = updated;
            merged.qr_code = Some(qr_code);
            app.session.save_user(&merged)?;
            println!("QR code generated successfully!");
            Ok(Some(merged))
        }
        Err(e) => {
            // the profile update went through; only the QR request failed
            app.session.save_user(&updated)?;
            println!("Failed to generate QR code. Please try again. ({})", e);
            Ok(Some(updated))
        }
    }
}

async fn save_qr(app: &App, user: &UserProfile) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(reference) = user.qr_code.as_deref() else {
        println!("No QR code yet. Use 'edit' to generate one.");
        return Ok(());
    };
    match app.api.fetch_qr_png(reference).await {
        Ok(bytes) => {
            fs::write(&app.args.qr_output_path, bytes)?;
            println!("Saved QR code to {}", app.args.qr_output_path);
        }
        Err(e) => {
            println!("QR download failed: {}", e);
        }
    }
    Ok(())
}
