use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Outstanding one-time code. Deleted once a verification attempt matches it.
#[derive(Debug, Clone, FromRow)]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl Otp {
    /// Exact match; no trimming or normalisation of `code`.
    pub fn matches(&self, user_id: Uuid, code: &str) -> bool {
        self.user_id == user_id && self.code == code
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}
