use thiserror::Error;

use crate::models::user::EmergencyContact;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Client-side checks that block submission before any network call. The
/// messages are shown inline on the active screen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Name is required")]
    NameRequired,
    #[error("Please select a blood type")]
    BloodTypeRequired,
    #[error("Please add at least one emergency contact")]
    NoContacts,
}

pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }
    if domain.contains('@') || domain.contains(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn check_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if !valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !valid_password(password) {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn check_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if !valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !valid_password(password) {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Drops blank contact rows (not an error), then requires a blood type and at
/// least one surviving contact. Returns the cleaned contact list.
pub fn check_profile_update(
    blood_type: &str,
    contacts: &[EmergencyContact]
) -> Result<Vec<EmergencyContact>, ValidationError> {
    if blood_type.trim().is_empty() {
        return Err(ValidationError::BloodTypeRequired);
    }
    let valid: Vec<EmergencyContact> = contacts
        .iter()
        .filter(|c| !c.name.trim().is_empty() && !c.phone.trim().is_empty())
        .cloned()
        .collect();
    if valid.is_empty() {
        return Err(ValidationError::NoContacts);
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, phone: &str) -> EmergencyContact {
        EmergencyContact {
            name: name.to_string(),
            phone: phone.to_string(),
            relationship: None,
        }
    }

    #[test]
    fn email_without_at_or_domain_is_rejected() {
        assert!(!valid_email("plainaddress"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("no-tld@example"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("two@@example.com"));
        assert!(!valid_email("spaced name@example.com"));
        assert!(valid_email("asha@example.com"));
        assert!(valid_email("a.b+c@sub.example.co.in"));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(check_login("asha@example.com", "seven77").is_err());
        assert!(check_login("asha@example.com", "eight888").is_ok());
    }

    #[test]
    fn signup_rejects_mismatched_confirmation() {
        let err = check_signup("Asha", "asha@example.com", "password1", "password2");
        assert_eq!(err, Err(ValidationError::PasswordMismatch));
    }

    #[test]
    fn signup_requires_a_name() {
        let err = check_signup("   ", "asha@example.com", "password1", "password1");
        assert_eq!(err, Err(ValidationError::NameRequired));
    }

    #[test]
    fn profile_update_drops_blank_rows_but_needs_one_contact() {
        let contacts = vec![contact("", ""), contact("Ravi", "+919876543210"), contact("  ", "x")];
        let cleaned = check_profile_update("O+", &contacts).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].name, "Ravi");

        let all_blank = vec![contact("", ""), contact(" ", " ")];
        assert_eq!(
            check_profile_update("O+", &all_blank),
            Err(ValidationError::NoContacts)
        );
    }

    #[test]
    fn profile_update_requires_a_blood_type() {
        let contacts = vec![contact("Ravi", "+919876543210")];
        assert_eq!(
            check_profile_update("", &contacts),
            Err(ValidationError::BloodTypeRequired)
        );
    }
}
