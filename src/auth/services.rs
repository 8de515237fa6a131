use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::{NewUser, User},
};
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::otp::OtpService;
use crate::store::{UniqueField, UserStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the account, then issues a code and hands it to the notifier.
///
/// The user row is kept if delivery fails; a later request-otp call can
/// issue a new code.
pub async fn register(
    users: &dyn UserStore,
    otp: &OtpService,
    notifier: &dyn Notifier,
    payload: RegisterRequest,
) -> Result<User, ApiError> {
    let username = payload.username.trim().to_string();
    let email = normalize_email(&payload.email);
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Invalid email"));
    }

    if users.find_user_by_username(&username).await?.is_some() {
        warn!(username = %username, "username already registered");
        return Err(ApiError::Duplicate(UniqueField::Username));
    }
    if users.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Duplicate(UniqueField::Email));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = users
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, "user registered");

    let code = otp.generate(user.id).await?;
    notifier
        .send_code(&user.email, &code)
        .await
        .map_err(ApiError::Delivery)?;

    Ok(user)
}

/// Checks the password and returns a bearer token.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> Result<String, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required"));
    }

    let Some(user) = users.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Issues and delivers one more code. Earlier codes stay valid.
pub async fn request_otp(
    users: &dyn UserStore,
    otp: &OtpService,
    notifier: &dyn Notifier,
    email: &str,
) -> Result<(), ApiError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required"));
    }

    let user = users
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let code = otp.generate(user.id).await?;
    notifier
        .send_code(&user.email, &code)
        .await
        .map_err(ApiError::Delivery)?;

    info!(user_id = %user.id, "otp requested");
    Ok(())
}

/// Consumes the code and returns a bearer token for its owner.
pub async fn verify_otp(
    otp: &OtpService,
    keys: &JwtKeys,
    email: &str,
    code: &str,
) -> Result<String, ApiError> {
    let email = normalize_email(email);
    if email.is_empty() || code.trim().is_empty() {
        return Err(ApiError::Validation("Email and OTP are required"));
    }

    let user = otp.verify(&email, code).await?;
    Ok(keys.sign(user.id)?)
}
