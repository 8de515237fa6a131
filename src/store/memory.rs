use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NoteStore, OtpStore, StoreError, UniqueField, UserStore};
use crate::auth::repo_types::{NewUser, User};
use crate::notes::repo_types::{Note, NoteDraft};
use crate::otp::repo_types::Otp;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // Insertion order doubles as creation order.
    otps: Vec<Otp>,
    notes: Vec<Note>,
}

/// In-process store. Every operation holds the table lock for its whole
/// duration, which gives the same atomicity as a database transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn create_otp(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Otp, StoreError> {
        let otp = Otp {
            id: Uuid::new_v4(),
            user_id,
            code: code.to_string(),
            expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.lock().await.otps.push(otp.clone());
        Ok(otp)
    }

    async fn take_otp(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, StoreError> {
        let mut t = self.tables.lock().await;
        let pos = t
            .otps
            .iter()
            .position(|o| o.matches(user_id, code));
        Ok(pos.map(|i| t.otps.remove(i)))
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        Ok(self.tables.lock().await.notes.clone())
    }

    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<Note, StoreError> {
        let now = OffsetDateTime::now_utc();
        let note = Note {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: Uuid, draft: NoteDraft) -> Result<Option<Note>, StoreError> {
        let mut t = self.tables.lock().await;
        let Some(note) = t.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };
        note.title = draft.title;
        note.content = draft.content;
        note.updated_at = OffsetDateTime::now_utc();
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.tables.lock().await;
        let before = t.notes.len();
        t.notes.retain(|n| n.id != id);
        Ok(t.notes.len() != before)
    }
}
