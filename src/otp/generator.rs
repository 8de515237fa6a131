use rand::{rngs::OsRng, CryptoRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::store::{OtpStore, StoreError};

/// Number of decimal digits in a code.
pub const CODE_DIGITS: usize = 6;

const CODE_SPACE: u32 = 1_000_000;

/// Draws a code uniformly from `000000..=999999`.
pub fn random_code<R: Rng + CryptoRng>(rng: &mut R) -> String {
    format_code(rng.gen_range(0..CODE_SPACE))
}

fn format_code(n: u32) -> String {
    format!("{:0width$}", n, width = CODE_DIGITS)
}

/// Stores a fresh code for `user_id` valid for `ttl` and returns it.
///
/// The caller must have confirmed that the user exists. Codes issued
/// earlier for the same user are left in place.
pub async fn generate(
    store: &dyn OtpStore,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, StoreError> {
    let code = random_code(&mut OsRng);
    let expires_at = OffsetDateTime::now_utc() + ttl;
    let otp = store.create_otp(user_id, &code, expires_at).await?;
    debug!(user_id = %user_id, otp_id = %otp.id, expires_at = %otp.expires_at, "otp issued");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn codes_keep_leading_zeros() {
        assert_eq!(format_code(4213), "004213");
        assert_eq!(format_code(0), "000000");
        assert_eq!(format_code(999_999), "999999");
    }

    #[test]
    fn random_codes_are_six_decimal_digits() {
        for _ in 0..1_000 {
            let code = random_code(&mut OsRng);
            assert_eq!(code.len(), CODE_DIGITS);
            assert!(code.bytes().all(|b| b.is_ascii_digit()), "bad code {code}");
        }
    }

    #[tokio::test]
    async fn generate_persists_code_with_expiry() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let before = OffsetDateTime::now_utc();

        let code = generate(&store, user_id, Duration::minutes(5))
            .await
            .expect("generate");

        let otp = store
            .take_otp(user_id, &code)
            .await
            .expect("take")
            .expect("code was stored");
        assert_eq!(otp.user_id, user_id);
        assert!(otp.expires_at >= before + Duration::minutes(5));
        assert!(otp.expires_at <= OffsetDateTime::now_utc() + Duration::minutes(5));
    }

    #[tokio::test]
    async fn generate_keeps_earlier_codes() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = generate(&store, user_id, Duration::minutes(5)).await.unwrap();
        let second = generate(&store, user_id, Duration::minutes(5)).await.unwrap();

        assert!(store.take_otp(user_id, &second).await.unwrap().is_some());
        assert!(store.take_otp(user_id, &first).await.unwrap().is_some());
    }
}
