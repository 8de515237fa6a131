//! Out-of-band delivery of one-time codes.
//!
//! `LogNotifier` is the default and only writes a log line; the code itself
//! is logged in debug builds only. `SmtpNotifier` mails the code and is used
//! when `SMTP_HOST` is configured.

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::SmtpConfig;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `code` to `destination` or return an error.
    async fn send_code(&self, destination: &str, code: &str) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_code(&self, destination: &str, code: &str) -> anyhow::Result<()> {
        if cfg!(debug_assertions) {
            debug!(to = %destination, %code, "otp delivery (log only)");
        } else {
            info!(to = %destination, "otp delivery (log only)");
        }
        Ok(())
    }
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("smtp relay {}", cfg.host))?
            .port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            mailer: builder.build(),
            from: cfg.from.clone(),
        })
    }
}

fn code_email(from: &str, to: &str, code: &str) -> anyhow::Result<Message> {
    let message = Message::builder()
        .from(from.parse().context("parse sender address")?)
        .to(to.parse().context("parse recipient address")?)
        .subject("Your verification code")
        .header(ContentType::TEXT_PLAIN)
        .body(format!(
            "Your verification code is {code}.\n\nIt expires in a few minutes. \
             If you did not request it, ignore this email.\n"
        ))
        .context("build otp email")?;
    Ok(message)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_code(&self, destination: &str, code: &str) -> anyhow::Result<()> {
        let message = code_email(&self.from, destination, code)?;
        self.mailer.send(message).await.context("smtp send")?;
        info!(to = %destination, "otp email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_email_carries_code() {
        let message = code_email("noreply@example.com", "a@x.com", "004213").expect("build");
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("004213"));
        assert!(raw.contains("To: a@x.com"));
    }

    #[test]
    fn code_email_rejects_bad_recipient() {
        assert!(code_email("noreply@example.com", "not an address", "123456").is_err());
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier.send_code("a@x.com", "123456").await.unwrap();
    }
}
