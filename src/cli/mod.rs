use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Remote API Args ---
    /// Base URL of the EmergencyQR API.
    #[arg(long, env = "API_BASE_URL", default_value = "https://emergencyqr.vercel.app/api")]
    pub api_base_url: String,

    /// Base URL used when printing shareable public profile links.
    #[arg(
        long,
        env = "PROFILE_LINK_BASE",
        default_value = "https://emergencyqr-frontend.vercel.app/profile"
    )]
    pub profile_link_base: String,

    // --- Session Store Args ---
    /// Path of the persisted session document (last known user).
    #[arg(long, env = "SESSION_PATH", default_value = ".emergency-qr/session.json")]
    pub session_path: String,

    /// Path of the persisted bearer token.
    #[arg(long, env = "TOKEN_PATH", default_value = ".emergency-qr/token")]
    pub token_path: String,

    // --- Geolocation Args ---
    /// Seconds between location polls on the public profile screen.
    #[arg(long, env = "LOCATION_POLL_SECS", default_value = "10")]
    pub location_poll_secs: u64,

    /// Seconds to wait for a single position acquisition before giving up.
    #[arg(long, env = "LOCATION_TIMEOUT_SECS", default_value = "5")]
    pub location_timeout_secs: u64,

    /// Request high-accuracy position fixes.
    #[arg(long, env = "LOCATION_HIGH_ACCURACY", default_value = "true")]
    pub location_high_accuracy: bool,

    /// Device latitude reported by the fixed location provider.
    #[arg(long, env = "DEVICE_LAT")]
    pub device_lat: Option<f64>,

    /// Device longitude reported by the fixed location provider.
    #[arg(long, env = "DEVICE_LON")]
    pub device_lon: Option<f64>,

    // --- SOS Args ---
    /// Seconds between the server accepting an SOS and the confirmation showing.
    #[arg(long, env = "SOS_SEND_DELAY_SECS", default_value = "2")]
    pub sos_send_delay_secs: u64,

    /// Seconds before an activated SOS automatically returns to idle.
    #[arg(long, env = "SOS_COOLDOWN_SECS", default_value = "10")]
    pub sos_cooldown_secs: u64,

    // --- Assistant Args ---
    /// Minimum milliseconds the assistant spends "typing" before replying.
    #[arg(long, env = "CHAT_TYPING_DELAY_MS", default_value = "500")]
    pub chat_typing_delay_ms: u64,

    // --- General App Args ---
    /// File the dashboard writes the QR code image to.
    #[arg(long, env = "QR_OUTPUT_PATH", default_value = "emergency-qr.png")]
    pub qr_output_path: String,
}
