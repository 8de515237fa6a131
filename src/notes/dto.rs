use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::notes::repo_types::{Note, NoteDraft};

/// Body for create and full update.
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl TryFrom<NoteRequest> for NoteDraft {
    type Error = ApiError;

    fn try_from(req: NoteRequest) -> Result<Self, Self::Error> {
        match (req.title, req.content) {
            (Some(title), Some(content)) if !title.trim().is_empty() => Ok(NoteDraft {
                title: title.trim().to_string(),
                content,
            }),
            _ => Err(ApiError::Validation("Title and content are required")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            content: n.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteMessage {
    pub message: &'static str,
}
