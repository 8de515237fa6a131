//! One-time passcodes: issuance and single-use verification.

use std::sync::Arc;

use axum::extract::FromRef;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::state::AppState;
use crate::store::{OtpStore, StoreError, UserStore};

pub mod generator;
mod repo;
pub mod repo_types;
pub mod verifier;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid code")]
    InvalidCode,
    #[error("code expired")]
    CodeExpired,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Store handles and TTL needed to issue and check codes.
#[derive(Clone)]
pub struct OtpService {
    users: Arc<dyn UserStore>,
    otps: Arc<dyn OtpStore>,
    ttl: Duration,
}

impl FromRef<AppState> for OtpService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            state.otps.clone(),
            Duration::minutes(state.config.otp.ttl_minutes),
        )
    }
}

impl OtpService {
    pub fn new(users: Arc<dyn UserStore>, otps: Arc<dyn OtpStore>, ttl: Duration) -> Self {
        Self { users, otps, ttl }
    }

    pub async fn generate(&self, user_id: Uuid) -> Result<String, OtpError> {
        Ok(generator::generate(self.otps.as_ref(), user_id, self.ttl).await?)
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<User, OtpError> {
        verifier::verify(
            self.users.as_ref(),
            self.otps.as_ref(),
            email,
            code,
            OffsetDateTime::now_utc(),
        )
        .await
    }
}
