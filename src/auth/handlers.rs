use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, MessageResponse, PublicUser, RegisterRequest, RequestOtpRequest,
            TokenResponse, VerifyOtpRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::ApiError,
    extract::Json,
    otp::OtpService,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/request-otp", post(request_otp))
        .route("/auth/verify-otp", post(verify_otp))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let otp = OtpService::from_ref(&state);
    services::register(
        state.users.as_ref(),
        &otp,
        state.notifier.as_ref(),
        payload,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully. OTP has been sent to your email.",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let access_token = services::login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(TokenResponse { access_token }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.users.find_user_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token subject has no user");
        ApiError::UserNotFound
    })?;

    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

#[instrument(skip(state, payload))]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let otp = OtpService::from_ref(&state);
    services::request_otp(
        state.users.as_ref(),
        &otp,
        state.notifier.as_ref(),
        &payload.email,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "OTP sent successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let otp = OtpService::from_ref(&state);
    let keys = JwtKeys::from_ref(&state);
    let access_token = services::verify_otp(&otp, &keys, &payload.email, &payload.otp).await?;
    Ok(Json(TokenResponse { access_token }))
}
