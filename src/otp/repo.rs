use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::otp::repo_types::Otp;
use crate::store::{OtpStore, PgStore, StoreError};

#[async_trait]
impl OtpStore for PgStore {
    async fn create_otp(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Otp, StoreError> {
        let otp = sqlx::query_as::<_, Otp>(
            r#"
            INSERT INTO otps (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(otp)
    }

    async fn take_otp(&self, user_id: Uuid, code: &str) -> Result<Option<Otp>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps a concurrent attempt from seeing the same record.
        let otp = sqlx::query_as::<_, Otp>(
            r#"
            SELECT id, user_id, code, expires_at, created_at
              FROM otps
             WHERE user_id = $1 AND code = $2
             ORDER BY created_at ASC
             LIMIT 1
               FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(otp) = otp else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM otps WHERE id = $1")
            .bind(otp.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(otp))
    }
}

