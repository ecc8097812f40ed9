//! Tests for the domain user model.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case("  Ada Lovelace ", "Ada Lovelace")]
#[case("Seán O'Brien-Smith", "Seán O'Brien-Smith")]
#[case("J.R", "J.R")]
fn user_name_accepts_and_trims(#[case] raw: &str, #[case] expected: &str) {
    let name = UserName::new(raw).expect("valid name");
    assert_eq!(name.as_ref(), expected);
}

#[rstest]
#[case("   ", UserValidationError::EmptyName)]
#[case("A", UserValidationError::NameTooShort { min: USER_NAME_MIN })]
#[case("a".repeat(USER_NAME_MAX + 1), UserValidationError::NameTooLong { max: USER_NAME_MAX })]
#[case("bad$char", UserValidationError::NameInvalidCharacters)]
fn user_name_rejects_invalid(#[case] raw: String, #[case] expected: UserValidationError) {
    assert_eq!(UserName::new(raw), Err(expected));
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("no-at-sign.example.com", UserValidationError::InvalidEmail)]
#[case("a@nodot", UserValidationError::InvalidEmail)]
#[case("two words@example.com", UserValidationError::InvalidEmail)]
fn email_rejects_invalid(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(EmailAddress::new(raw), Err(expected));
}

#[rstest]
fn email_rejects_overlong_addresses() {
    let raw = format!("{}@example.com", "a".repeat(EMAIL_MAX));
    assert_eq!(
        EmailAddress::new(raw),
        Err(UserValidationError::EmailTooLong { max: EMAIL_MAX })
    );
}

#[rstest]
#[case("+44 7700-900 123", "+447700900123")]
#[case("5551234", "5551234")]
fn phone_strips_separators(#[case] raw: &str, #[case] expected: &str) {
    let phone = PhoneNumber::new(raw).expect("valid phone");
    assert_eq!(phone.as_ref(), expected);
}

#[rstest]
#[case("123456")]
#[case("1234567890123456")]
#[case("++1234567")]
#[case("12a4567")]
fn phone_rejects_invalid(#[case] raw: &str) {
    assert_eq!(PhoneNumber::new(raw), Err(UserValidationError::InvalidPhone));
}

#[rstest]
fn new_user_treats_blank_phone_as_absent() {
    let draft = NewUser::try_from_parts("Ada", "ada@example.com", Some("  ".into()))
        .expect("valid registration");
    assert!(draft.phone.is_none());
}

#[rstest]
fn validation_errors_name_their_field() {
    let err = NewUser::try_from_parts("Ada", "bad", None).expect_err("invalid email");
    assert_eq!(err.field(), "email");
    assert_eq!(err.code(), "invalid_email");
}

#[rstest]
fn user_serialises_camel_case() {
    let user = User {
        id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id"),
        name: UserName::new("Ada Lovelace").expect("valid name"),
        email: EmailAddress::new("ada@example.com").expect("valid email"),
        phone: None,
        role: UserRole::Admin,
        created_at: "2025-01-01T00:00:00Z".parse().expect("timestamp"),
    };
    let value = serde_json::to_value(&user).expect("serialise");
    assert_eq!(
        value,
        json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "admin",
            "createdAt": "2025-01-01T00:00:00Z",
        })
    );
}

#[rstest]
fn actor_access_rules() {
    let owner = UserId::random();
    let stranger = Actor {
        user_id: UserId::random(),
        role: UserRole::User,
    };
    let admin = Actor {
        user_id: UserId::random(),
        role: UserRole::Admin,
    };
    let me = Actor {
        user_id: owner,
        role: UserRole::User,
    };

    assert!(!stranger.may_access(&owner));
    assert!(admin.may_access(&owner));
    assert!(me.may_access(&owner));
}
