//! Persistence seams.
//!
//! Handlers and the OTP core only talk to these traits. `PgStore` backs them
//! with PostgreSQL (queries live next to each domain in its `repo.rs`);
//! `MemoryStore` keeps everything in process for local runs and tests.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::notes::repo_types::{Note, NoteDraft};
use crate::otp::repo_types::Otp;

mod memory;

pub use memory::MemoryStore;

/// Column that caused a uniqueness conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0:?} already taken")]
    Conflict(UniqueField),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn create_otp(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Otp, StoreError>;

    /// Finds the oldest record matching `(user_id, code)` and deletes it in
    /// one transaction. At most one caller can ever receive a given record.
    async fn take_otp(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, StoreError>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError>;
    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, StoreError>;
    async fn create_note(&self, draft: NoteDraft) -> Result<Note, StoreError>;
    /// Returns `None` when no note has this id.
    async fn update_note(&self, id: Uuid, draft: NoteDraft) -> Result<Option<Note>, StoreError>;
    /// Returns `false` when no note has this id.
    async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Everything the application needs from a backend.
pub trait Store: UserStore + OtpStore + NoteStore {}

impl<T: UserStore + OtpStore + NoteStore> Store for T {}

#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
