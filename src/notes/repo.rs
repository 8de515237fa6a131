use async_trait::async_trait;
use uuid::Uuid;

use crate::notes::repo_types::{Note, NoteDraft};
use crate::store::{NoteStore, PgStore, StoreError};

#[async_trait]
impl NoteStore for PgStore {
    async fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, title, content, created_at, updated_at
            FROM notes
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"SELECT id, title, content, created_at, updated_at FROM notes WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn create_note(&self, draft: NoteDraft) -> Result<Note, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (title, content)
            VALUES ($1, $2)
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    async fn update_note(&self, id: Uuid, draft: NoteDraft) -> Result<Option<Note>, StoreError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
               SET title = $2, content = $3, updated_at = now()
             WHERE id = $1
            RETURNING id, title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
