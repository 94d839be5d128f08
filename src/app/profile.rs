use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use super::{ App, Console };
use crate::assistant::{ Assistant, ChatBackend };
use crate::geo::{ FixedGeoProvider, GeoProvider, LocationPoller, PollerSettings };
use crate::models::user::PublicProfile;
use crate::sos::{ SosAlerter, SosFlow, SosTimings };

/// The public emergency profile screen: profile display, the SOS trigger,
/// and the assistant chat. Owns the location poller for its lifetime and
/// stops it on exit, so no polling outlives the screen.
pub async fn run(
    app: &App,
    console: &mut Console,
    id: &str
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let profile = match app.api.public_profile(id).await {
        Ok(p) => p,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    render(&profile);

    let provider: Arc<dyn GeoProvider> = Arc::new(
        FixedGeoProvider::new(app.args.device_lat, app.args.device_lon)
    );
    let settings = PollerSettings {
        interval: Duration::from_secs(app.args.location_poll_secs),
        acquire_timeout: Duration::from_secs(app.args.location_timeout_secs),
        high_accuracy: app.args.location_high_accuracy,
    };
    let mut poller = match LocationPoller::start(provider, profile.location, settings) {
        Ok(p) => Some(p),
        Err(e) => {
            println!("{}", e);
            None
        }
    };

    let token = app.session.load_token()?.unwrap_or_default();
    let sos = SosFlow::new(
        Arc::clone(&app.api) as Arc<dyn SosAlerter>,
        token,
        profile.id.clone(),
        SosTimings {
            send_delay: Duration::from_secs(app.args.sos_send_delay_secs),
            cooldown: Duration::from_secs(app.args.sos_cooldown_secs),
        }
    );
    let assistant = Assistant::new(
        Arc::clone(&app.api) as Arc<dyn ChatBackend>,
        profile.id.clone(),
        Duration::from_millis(app.args.chat_typing_delay_ms)
    );
    println!("{}", crate::assistant::GREETING);

    loop {
        if console.eof() {
            break;
        }
        let choice = console.prompt("info / sos / chat / back").await?;
        match choice.as_str() {
            "info" => {
                render(&profile);
            }
            "sos" => {
                println!("Sending alerts...");
                let sample = poller.as_ref().and_then(|p| p.sample());
                let outcome = sos.trigger(sample).await;
                println!("{}", outcome.message());
            }
            "chat" => {
                let message = console.prompt("You").await?;
                if message.is_empty() {
                    continue;
                }
                println!("Assistant is typing...");
                let reply = assistant.dispatch(&message).await;
                println!("Assistant: {}", reply.text);
            }
            "back" => {
                break;
            }
            "" => {}
            other => {
                println!("Unknown command '{}'.", other);
            }
        }
    }

    if let Some(poller) = poller.as_mut() {
        poller.stop();
    }
    Ok(())
}

fn render(profile: &PublicProfile) {
    println!();
    println!("Emergency Medical Information — {}", profile.name);
    println!("Blood Type:      {}", profile.blood_type.as_deref().unwrap_or("not set"));
    println!("Medical History: {}", profile.medical_history.as_deref().unwrap_or("None"));
    if profile.emergency_contacts.is_empty() {
        println!("No emergency contacts added.");
    } else {
        println!("Emergency Contacts:");
        for contact in &profile.emergency_contacts {
            match &contact.relationship {
                Some(rel) => println!("  - {} ({}) {}", contact.name, rel, contact.phone),
                None => println!("  - {} {}", contact.name, contact.phone),
            }
        }
    }
    println!("In case of emergency, use 'sos' or call emergency services directly.");
}
