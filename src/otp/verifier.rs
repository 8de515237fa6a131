use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::repo_types::User;
use crate::otp::OtpError;
use crate::store::{OtpStore, UserStore};

/// Checks `code` for the user behind `email` and consumes it.
///
/// A matched record is removed whether it is still valid or already
/// expired, so the same code never verifies twice.
pub async fn verify(
    users: &dyn UserStore,
    otps: &dyn OtpStore,
    email: &str,
    code: &str,
    now: OffsetDateTime,
) -> Result<User, OtpError> {
    let user = users
        .find_user_by_email(email)
        .await?
        .ok_or(OtpError::UserNotFound)?;

    let Some(otp) = otps.take_otp(user.id, code).await? else {
        warn!(user_id = %user.id, "otp mismatch");
        return Err(OtpError::InvalidCode);
    };

    if otp.is_expired_at(now) {
        warn!(
            user_id = %user.id,
            otp_id = %otp.id,
            issued_at = %otp.created_at,
            "otp expired; removed"
        );
        return Err(OtpError::CodeExpired);
    }

    info!(
        user_id = %user.id,
        otp_id = %otp.id,
        issued_at = %otp.created_at,
        "otp consumed"
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::NewUser;
    use crate::store::MemoryStore;
    use time::Duration;

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "a@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .expect("create user");
        (store, user)
    }

    #[tokio::test]
    async fn valid_code_verifies_once() {
        let (store, user) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        store
            .create_otp(user.id, "123456", now + Duration::minutes(5))
            .await
            .unwrap();

        let verified = verify(&store, &store, "a@x.com", "123456", now)
            .await
            .expect("first attempt");
        assert_eq!(verified.id, user.id);

        let err = verify(&store, &store, "a@x.com", "123456", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::InvalidCode));
    }

    #[tokio::test]
    async fn expired_code_is_removed() {
        let (store, user) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        store
            .create_otp(user.id, "004213", now - Duration::seconds(1))
            .await
            .unwrap();

        let err = verify(&store, &store, "a@x.com", "004213", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::CodeExpired));

        let err = verify(&store, &store, "a@x.com", "004213", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::InvalidCode));
    }

    #[tokio::test]
    async fn expiry_instant_counts_as_expired() {
        let (store, user) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        store.create_otp(user.id, "111111", now).await.unwrap();

        let err = verify(&store, &store, "a@x.com", "111111", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::CodeExpired));
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let (store, _) = store_with_user().await;
        let err = verify(&store, &store, "b@x.com", "123456", OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::UserNotFound));
    }

    #[tokio::test]
    async fn wrong_code_leaves_outstanding_code_alone() {
        let (store, user) = store_with_user().await;
        let now = OffsetDateTime::now_utc();
        store
            .create_otp(user.id, "222222", now + Duration::minutes(5))
            .await
            .unwrap();

        let err = verify(&store, &store, "a@x.com", "333333", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::InvalidCode));

        verify(&store, &store, "a@x.com", "222222", now)
            .await
            .expect("real code still valid");
    }

    #[tokio::test]
    async fn code_of_another_user_does_not_match() {
        let (store, alice) = store_with_user().await;
        store
            .create_user(NewUser {
                username: "bob".into(),
                email: "b@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .create_otp(alice.id, "555555", now + Duration::minutes(5))
            .await
            .unwrap();

        let err = verify(&store, &store, "b@x.com", "555555", now)
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::InvalidCode));
    }

    #[tokio::test]
    async fn concurrent_attempts_succeed_at_most_once() {
        let (store, user) = store_with_user().await;
        let store = std::sync::Arc::new(store);
        let now = OffsetDateTime::now_utc();
        store
            .create_otp(user.id, "777777", now + Duration::minutes(5))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                verify(&*store, &*store, "a@x.com", "777777", now).await.is_ok()
            }));
        }

        let mut successes = 0;
        for h in handles {
            if h.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
