use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ApiError, FieldError};
use crate::users::dto::{
    AdminPasswordChangeRequest, CreateUserRequest, PasswordChangeRequest, ProfileUpdateRequest,
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    // Regional (RU) phone format carried over from the original service.
    static ref PHONE_RE: Regex = Regex::new(
        r"^(\+7|8)?[\s\-]?\(?[489][0-9]{2}\)?[\s\-]?[0-9]{3}[\s\-]?[0-9]{2}[\s\-]?[0-9]{2}$"
    )
    .unwrap();
}

fn check_name(name: &str) -> Option<FieldError> {
    let len = name.chars().count();
    if len < 2 {
        return Some(FieldError::new(
            "name",
            "Name must be at least 2 characters long",
        ));
    }
    if len > 100 {
        return Some(FieldError::new(
            "name",
            "Name must not exceed 100 characters",
        ));
    }
    None
}

fn check_email(email: &str) -> Option<FieldError> {
    if EMAIL_RE.is_match(email) {
        None
    } else {
        Some(FieldError::new("email", "Invalid email address"))
    }
}

/// Strength rule: length >= 8 and at least one ASCII letter and one digit.
fn check_password(field: &str, password: &str) -> Option<FieldError> {
    if password.chars().count() < 8 {
        return Some(FieldError::new(
            field,
            "Password must be at least 8 characters long",
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Some(FieldError::new(
            field,
            "Password must contain both letters and numbers",
        ));
    }
    None
}

fn check_phone(phone: &str) -> Option<FieldError> {
    if PHONE_RE.is_match(phone) {
        None
    } else {
        Some(FieldError::new("phone", "Invalid phone number format"))
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn validate_create(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    errors.extend(check_name(&req.name));
    errors.extend(check_email(&req.email));
    errors.extend(check_password("password", &req.password));
    if let Some(phone) = req.phone.as_deref() {
        errors.extend(check_phone(phone));
    }
    finish(errors)
}

pub fn validate_profile_update(req: &ProfileUpdateRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if let Some(name) = req.name.as_deref() {
        errors.extend(check_name(name));
    }
    if let Some(email) = req.email.as_deref() {
        errors.extend(check_email(email));
    }
    if let Some(phone) = req.phone.as_deref() {
        errors.extend(check_phone(phone));
    }
    finish(errors)
}

pub fn validate_password_change(req: &PasswordChangeRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    errors.extend(check_password("new_password", &req.new_password));
    if req.new_password_repeat != req.new_password {
        errors.push(FieldError::new("new_password_repeat", "Пароли не совпадают"));
    }
    finish(errors)
}

pub fn validate_admin_password_change(req: &AdminPasswordChangeRequest) -> Result<(), ApiError> {
    finish(check_password("new_password", &req.new_password).into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(name: &str, email: &str, password: &str, phone: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            phone: phone.map(Into::into),
        }
    }

    #[test]
    fn accepts_a_well_formed_user() {
        let req = create_req("Ann", "ann@x.com", "abc12345", Some("+7 912 345 67 89"));
        assert!(validate_create(&req).is_ok());
    }

    #[test]
    fn rejects_short_name() {
        let req = create_req("A", "ann@x.com", "abc12345", None);
        let err = validate_create(&req).unwrap_err();
        match err {
            ApiError::Validation(details) => {
                assert_eq!(details[0].field, "name");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "x".repeat(101);
        let req = create_req(&name, "ann@x.com", "abc12345", None);
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn password_needs_length_letter_and_digit() {
        for bad in ["abc1", "abcdefgh", "12345678"] {
            let req = create_req("Ann", "ann@x.com", bad, None);
            assert!(validate_create(&req).is_err(), "{bad} should be rejected");
        }
        let req = create_req("Ann", "ann@x.com", "abc12345", None);
        assert!(validate_create(&req).is_ok());
    }

    #[test]
    fn rejects_malformed_phone() {
        let req = create_req("Ann", "ann@x.com", "abc12345", Some("12345"));
        let err = validate_create(&req).unwrap_err();
        match err {
            ApiError::Validation(details) => assert_eq!(details[0].field, "phone"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn password_change_requires_matching_repeat() {
        let req = PasswordChangeRequest {
            new_password: "abc12345".into(),
            new_password_repeat: "xyz99999".into(),
        };
        let err = validate_password_change(&req).unwrap_err();
        match err {
            ApiError::Validation(details) => {
                assert!(details.iter().any(|d| d.field == "new_password_repeat"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn admin_change_applies_the_same_strength_rule() {
        let weak = AdminPasswordChangeRequest {
            new_password: "short".into(),
        };
        assert!(validate_admin_password_change(&weak).is_err());

        let strong = AdminPasswordChangeRequest {
            new_password: "abc12345".into(),
        };
        assert!(validate_admin_password_change(&strong).is_ok());
    }

    #[test]
    fn profile_update_skips_absent_fields() {
        let req = ProfileUpdateRequest::default();
        assert!(validate_profile_update(&req).is_ok());
    }
}
