use serde::{ Deserialize, Serialize };

use super::location::Coordinates;

/// A single emergency contact nested inside a profile. Contacts carry no
/// identity of their own; the ordered list is replaced wholesale on update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// The authenticated user's profile as returned by the remote API. The client
/// only ever holds a cached copy; the API owns the record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "bloodType", default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(rename = "medicalHistory", default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(rename = "emergencyContacts", default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    #[serde(rename = "qrCode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// Last location the server knows for this user, used as the poller
    /// fallback when live acquisition fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

/// The public emergency document served for a scanned QR code. Same shape as
/// the profile minus the account fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "bloodType", default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(rename = "medicalHistory", default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(rename = "emergencyContacts", default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    #[serde(rename = "qrCode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_uses_wire_field_names() {
        let json = r#"{
            "_id": "abc123",
            "name": "Asha",
            "email": "asha@example.com",
            "bloodType": "O+",
            "medicalHistory": "Asthma",
            "emergencyContacts": [
                { "name": "Ravi", "phone": "+919876543210", "relationship": "Brother" }
            ],
            "qrCode": "data:image/png;base64,AAAA"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, "abc123");
        assert_eq!(profile.blood_type.as_deref(), Some("O+"));
        assert_eq!(profile.emergency_contacts.len(), 1);
        assert_eq!(
            profile.emergency_contacts[0].relationship.as_deref(),
            Some("Brother")
        );
        assert!(profile.location.is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{ "_id": "x", "name": "N", "email": "n@example.com" }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert!(profile.blood_type.is_none());
        assert!(profile.emergency_contacts.is_empty());
        assert!(profile.qr_code.is_none());
    }
}
