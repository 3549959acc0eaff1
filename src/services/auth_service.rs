use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tracing::info;

use crate::auth;
use crate::config::AppConfig;
use crate::db;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, SignupRequest, User};

const PASSWORD_SPECIALS: &str = "@$!%*?&";

fn email_regex() -> Regex {
    // Permissive shape check; deliverability is not our problem.
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
}

/// Password rule: at least 8 characters, at least one letter, one digit and
/// one of @$!%*?&, drawn only from that alphabet.
fn password_is_valid(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
}

fn age_on(today: NaiveDate, dob: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Field-wise signup validation; every failing field gets its own message,
/// mirroring what the signup form renders inline.
pub fn validate_signup(req: &SignupRequest, email_taken: bool) -> Map<String, Value> {
    let mut errors = Map::new();
    let mut err = |field: &str, msg: &str| {
        errors.insert(field.to_string(), Value::String(msg.to_string()));
    };

    if req.first_name.as_deref().unwrap_or("").trim().is_empty() {
        err("first_name", "First name is required.");
    }
    if req.last_name.as_deref().unwrap_or("").trim().is_empty() {
        err("last_name", "Last name is required.");
    }
    if req.country.as_deref().unwrap_or("").trim().is_empty() {
        err("country", "Country is required.");
    }

    match req.email.as_deref() {
        None | Some("") => err("email", "Email is required."),
        Some(_) if email_taken => {
            err("email", "Email is already registered.");
        }
        Some(email) if !email_regex().is_match(email) => {
            err("email", "Invalid email format.");
        }
        _ => {}
    }

    match req.password.as_deref() {
        None | Some("") => err("password", "Password is required."),
        Some(password) if !password_is_valid(password) => err(
            "password",
            "Password must contain at least 8 characters, a number, and a special character.",
        ),
        _ => {}
    }

    match req.confirm_password.as_deref() {
        None | Some("") => err("confirm_password", "Confirm password is required."),
        Some(confirm) if req.password.as_deref() != Some(confirm) => {
            err("confirm_password", "Passwords do not match.");
        }
        _ => {}
    }

    match req.date_of_birth.as_deref() {
        None | Some("") => err("date_of_birth", "Date of birth is required."),
        Some(dob_str) => match NaiveDate::parse_from_str(dob_str, "%Y-%m-%d") {
            Ok(dob) => {
                if age_on(Utc::now().date_naive(), dob) < 18 {
                    err("dob", "You must be at least 18 years old to sign up.");
                }
            }
            Err(_) => err("dob", "Invalid date format."),
        },
    }

    errors
}

pub async fn signup(pool: &PgPool, req: SignupRequest) -> Result<User, AppError> {
    let email_taken = match req.email.as_deref() {
        Some(email) if !email.is_empty() => db::user_queries::email_exists(pool, email).await?,
        _ => false,
    };

    let errors = validate_signup(&req, email_taken);
    if !errors.is_empty() {
        return Err(AppError::FieldErrors(Value::Object(errors)));
    }

    // Validation guarantees these are present and well-formed.
    let email = req.email.unwrap_or_default();
    let dob = NaiveDate::parse_from_str(req.date_of_birth.as_deref().unwrap_or_default(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format".into()))?;
    let password_hash = auth::hash_password(req.password.as_deref().unwrap_or_default())?;

    let user = User {
        id: uuid::Uuid::new_v4(),
        email,
        password_hash,
        first_name: req.first_name.unwrap_or_default(),
        middle_name: req.middle_name.filter(|m| !m.is_empty()),
        last_name: req.last_name.unwrap_or_default(),
        country: req.country.unwrap_or_default(),
        date_of_birth: dob,
        preferences_completed: false,
        created_at: Utc::now(),
    };

    let user = db::user_queries::insert(pool, user).await?;
    info!("👤 New account created: {}", user.email);
    Ok(user)
}

pub async fn login(
    pool: &PgPool,
    config: &AppConfig,
    req: LoginRequest,
) -> Result<LoginResponse, AppError> {
    if !email_regex().is_match(&req.email) {
        return Err(AppError::FieldErrors(json!({
            "email": "Invalid email format."
        })));
    }

    let user = db::user_queries::find_by_email(pool, &req.email).await?;

    let user = match user {
        Some(user) if auth::verify_password(&req.password, &user.password_hash) => user,
        _ => {
            return Err(AppError::FieldErrors(json!({
                "login": "Invalid email or password."
            })));
        }
    };

    let token = auth::mint_token(
        &config.jwt_secret,
        config.token_ttl_hours,
        user.id,
        &user.email,
    )?;

    info!("🔓 Login for {}", user.email);
    Ok(LoginResponse {
        success: true,
        token,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignupRequest {
        SignupRequest {
            first_name: Some("Ada".to_string()),
            middle_name: None,
            last_name: Some("Lovelace".to_string()),
            country: Some("United Kingdom".to_string()),
            date_of_birth: Some("1990-12-10".to_string()),
            email: Some("ada@example.com".to_string()),
            password: Some("S3cure!pass".to_string()),
            confirm_password: Some("S3cure!pass".to_string()),
        }
    }

    #[test]
    fn test_valid_signup_has_no_errors() {
        let errors = validate_signup(&request(), false);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_missing_fields_are_reported_individually() {
        let req = SignupRequest {
            first_name: None,
            middle_name: None,
            last_name: None,
            country: None,
            date_of_birth: None,
            email: None,
            password: None,
            confirm_password: None,
        };
        let errors = validate_signup(&req, false);
        for field in [
            "first_name",
            "last_name",
            "country",
            "date_of_birth",
            "email",
            "password",
            "confirm_password",
        ] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_taken_email_is_rejected() {
        let errors = validate_signup(&request(), true);
        assert_eq!(
            errors.get("email").and_then(|v| v.as_str()),
            Some("Email is already registered.")
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(password_is_valid("S3cure!pass"));
        assert!(password_is_valid("abcdef1@"));
        assert!(!password_is_valid("short1@"));
        assert!(!password_is_valid("nodigits@@"));
        assert!(!password_is_valid("nospecial12"));
        assert!(!password_is_valid("has spaces 1@"));
    }

    #[test]
    fn test_mismatched_passwords() {
        let mut req = request();
        req.confirm_password = Some("different1@".to_string());
        let errors = validate_signup(&req, false);
        assert!(errors.contains_key("confirm_password"));
    }

    #[test]
    fn test_minors_are_rejected() {
        let mut req = request();
        let this_year = Utc::now().date_naive().year();
        req.date_of_birth = Some(format!("{}-01-01", this_year - 10));
        let errors = validate_signup(&req, false);
        assert_eq!(
            errors.get("dob").and_then(|v| v.as_str()),
            Some("You must be at least 18 years old to sign up.")
        );
    }

    #[test]
    fn test_age_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let birthday_today = NaiveDate::from_ymd_opt(2008, 6, 15).unwrap();
        let birthday_tomorrow = NaiveDate::from_ymd_opt(2008, 6, 16).unwrap();
        assert_eq!(age_on(today, birthday_today), 18);
        assert_eq!(age_on(today, birthday_tomorrow), 17);
    }

    #[test]
    fn test_invalid_email_shape() {
        let mut req = request();
        req.email = Some("not-an-email".to_string());
        let errors = validate_signup(&req, false);
        assert_eq!(
            errors.get("email").and_then(|v| v.as_str()),
            Some("Invalid email format.")
        );
    }
}
