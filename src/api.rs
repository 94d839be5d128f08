use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{ debug, info };
use reqwest::{ Client as HttpClient, Response, StatusCode };
use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::models::location::Coordinates;
use crate::models::user::{ EmergencyContact, PublicProfile, UserProfile };

/// Fallback reply when the chatbot returns an empty payload.
const CHATBOT_EMPTY_REPLY: &str = "I couldn't understand that. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    Unauthorized,
    #[error("Too many requests")]
    RateLimited,
    #[error("User not found")]
    NotFound,
    #[error("Server error (status {0})")]
    Server(u16),
    #[error("{0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid QR code reference: {0}")]
    BadQrReference(String),
}

/// Server error payloads carry an optional human-readable message.
#[derive(Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: UserProfile,
    token: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    user: UserProfile,
}

#[derive(Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "bloodType")]
    pub blood_type: String,
    #[serde(rename = "medicalHistory")]
    pub medical_history: String,
    #[serde(rename = "emergencyContacts")]
    pub emergency_contacts: Vec<EmergencyContact>,
}

#[derive(Deserialize)]
struct UpdateResponse {
    user: UserProfile,
}

#[derive(Deserialize)]
struct QrResponse {
    #[serde(rename = "qrCode")]
    qr_code: String,
}

#[derive(Serialize)]
struct SosRequest<'a> {
    id: &'a str,
    location: SosLocation,
}

// The SOS endpoint spells longitude "long"; everything else uses "lon".
#[derive(Serialize)]
struct SosLocation {
    lat: f64,
    long: f64,
}

#[derive(Deserialize)]
struct SosResponse {
    success: bool,
    message: Option<String>,
}

#[derive(Serialize)]
struct ChatbotRequest<'a> {
    message: &'a str,
    id: &'a str,
}

#[derive(Deserialize)]
struct ChatbotResponse {
    message: Option<String>,
}

/// Typed client for the EmergencyQR HTTP API. All seven endpoints live here
/// so every screen shares one request/response and error-mapping path.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = HttpClient::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str
    ) -> Result<(UserProfile, String), ApiError> {
        let resp = self.http
            .post(self.endpoint("/auth/login"))
            .json(&(LoginRequest { email, password }))
            .send().await?;
        let body: LoginResponse = Self::read_json(resp).await?;
        info!("Logged in as user {}", body.user.id);
        Ok((body.user, body.token))
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str
    ) -> Result<UserProfile, ApiError> {
        let resp = self.http
            .post(self.endpoint("/auth/register"))
            .json(&(RegisterRequest { name, email, password }))
            .send().await?;
        let body: RegisterResponse = Self::read_json(resp).await?;
        info!("Registered user {}", body.user.id);
        Ok(body.user)
    }

    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate
    ) -> Result<UserProfile, ApiError> {
        let resp = self.http
            .put(self.endpoint("/auth/update"))
            .bearer_auth(token)
            .json(update)
            .send().await?;
        let body: UpdateResponse = Self::read_json(resp).await?;
        Ok(body.user)
    }

    pub async fn generate_qr(&self, token: &str) -> Result<String, ApiError> {
        let resp = self.http
            .get(self.endpoint("/qr/generate"))
            .bearer_auth(token)
            .send().await?;
        let body: QrResponse = Self::read_json(resp).await?;
        Ok(body.qr_code)
    }

    pub async fn public_profile(&self, id: &str) -> Result<PublicProfile, ApiError> {
        let resp = self.http
            .get(self.endpoint(&format!("/auth/me/{}", id)))
            .send().await?;
        Self::read_json(resp).await
    }

    /// Sends one SOS alert. A 2xx response whose payload reports
    /// `success: false` is still a failure.
    pub async fn trigger_sos(
        &self,
        token: &str,
        id: &str,
        coords: Coordinates
    ) -> Result<(), ApiError> {
        let req = SosRequest {
            id,
            location: SosLocation { lat: coords.lat, long: coords.lon },
        };
        let resp = self.http
            .post(self.endpoint("/sos/trigger"))
            .bearer_auth(token)
            .json(&req)
            .send().await?;
        let body: SosResponse = Self::read_json(resp).await?;
        if !body.success {
            return Err(
                ApiError::Rejected(
                    body.message.unwrap_or_else(|| "SOS request failed".to_string())
                )
            );
        }
        Ok(())
    }

    pub async fn ask_chatbot(&self, message: &str, id: &str) -> Result<String, ApiError> {
        let resp = self.http
            .post(self.endpoint("/chatbot/ask"))
            .json(&(ChatbotRequest { message, id }))
            .send().await?;
        let body: ChatbotResponse = Self::read_json(resp).await?;
        Ok(
            body.message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| CHATBOT_EMPTY_REPLY.to_string())
        )
    }

    /// Resolves a QR code reference to PNG bytes: inline `data:` URLs are
    /// decoded locally, anything else is fetched.
    pub async fn fetch_qr_png(&self, reference: &str) -> Result<Vec<u8>, ApiError> {
        if reference.starts_with("data:") {
            return decode_data_url(reference);
        }
        let resp = self.http.get(reference).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        debug!("API response: {} {}", resp.status(), resp.url());
        Ok(resp.json::<T>().await?)
    }
}

async fn error_from_response(resp: Response) -> ApiError {
    let status = resp.status();
    let message = resp
        .json::<ApiMessage>().await
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.is_empty());
    classify_status(status, message)
}

fn classify_status(status: StatusCode, message: Option<String>) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        _ =>
            match message {
                Some(m) => ApiError::Rejected(m),
                None => ApiError::Server(status.as_u16()),
            }
    }
}

fn decode_data_url(reference: &str) -> Result<Vec<u8>, ApiError> {
    let payload = reference
        .split_once("base64,")
        .map(|(_, data)| data)
        .ok_or_else(|| ApiError::BadQrReference("not a base64 data URL".to_string()))?;
    BASE64.decode(payload).map_err(|e| ApiError::BadQrReference(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_buckets_match_the_taxonomy() {
        assert!(matches!(classify_status(StatusCode::UNAUTHORIZED, None), ApiError::Unauthorized));
        assert!(
            matches!(classify_status(StatusCode::TOO_MANY_REQUESTS, None), ApiError::RateLimited)
        );
        assert!(matches!(classify_status(StatusCode::NOT_FOUND, None), ApiError::NotFound));
        assert!(
            matches!(
                classify_status(StatusCode::INTERNAL_SERVER_ERROR, None),
                ApiError::Server(500)
            )
        );
    }

    #[test]
    fn server_message_is_surfaced_when_present() {
        match classify_status(StatusCode::BAD_REQUEST, Some("Email already in use".to_string())) {
            ApiError::Rejected(m) => assert_eq!(m, "Email already in use"),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn data_url_decodes_to_raw_bytes() {
        let bytes = decode_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn non_base64_reference_is_rejected() {
        assert!(matches!(decode_data_url("data:image/png,plain"), Err(ApiError::BadQrReference(_))));
    }

    #[test]
    fn sos_body_spells_longitude_long() {
        let req = SosRequest {
            id: "u1",
            location: SosLocation { lat: 12.9, long: 77.5 },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["location"]["long"], 77.5);
        assert!(json["location"].get("lon").is_none());
    }
}
