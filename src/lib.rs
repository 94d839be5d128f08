pub mod api;
pub mod app;
pub mod assistant;
pub mod cli;
pub mod geo;
pub mod models;
pub mod session;
pub mod sos;
pub mod validate;

use cli::Args;
use log::info;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("API Base URL: {}", args.api_base_url);
    info!("Profile Link Base: {}", args.profile_link_base);
    info!("Session Path: {}", args.session_path);
    info!("Token Path: {}", args.token_path);
    info!("Location Poll Interval: {}s", args.location_poll_secs);
    info!("Location Acquire Timeout: {}s", args.location_timeout_secs);
    info!("Location High Accuracy: {}", args.location_high_accuracy);
    info!("SOS Send Delay: {}s", args.sos_send_delay_secs);
    info!("SOS Cooldown: {}s", args.sos_cooldown_secs);
    info!("Assistant Typing Delay: {}ms", args.chat_typing_delay_ms);
    info!("QR Output Path: {}", args.qr_output_path);
    info!("-------------------------");

    app::run(args).await
}
