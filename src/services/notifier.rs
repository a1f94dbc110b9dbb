//! Out-of-band delivery of recovery codes.
//!
//! The `Notifier` trait keeps SMTP behind a seam so tests can record sends
//! instead of talking to a mail server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a recovery code to the account's registered address
    async fn send_reset_code(&self, to: &str, codigo: i32) -> Result<()>;
}

fn reset_mail_body(codigo: i32, ttl_minutes: i64) -> String {
    format!("Tu código de recuperación es: {codigo}. Expira en {ttl_minutes} minutos.")
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    code_ttl_minutes: i64,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig, code_ttl_minutes: i64) -> Result<Self> {
        let from = config
            .from
            .parse()
            .context("Invalid email.from address")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("Failed to create SMTP transport")?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        Ok(Self {
            mailer,
            from,
            code_ttl_minutes,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_reset_code(&self, to: &str, codigo: i32) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid recipient address")?)
            .subject("Recuperación de contraseña")
            .header(lettre::message::header::ContentType::TEXT_PLAIN)
            .body(reset_mail_body(codigo, self.code_ttl_minutes))
            .context("Failed to build reset email")?;

        self.mailer
            .send(email)
            .await
            .context("Failed to send reset email")?;

        tracing::info!("Reset code sent to {to}");
        Ok(())
    }
}

/// Stand-in for disabled email: logs the code instead of sending it
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reset_code(&self, to: &str, codigo: i32) -> Result<()> {
        tracing::warn!("Email disabled; reset code for {to} is {codigo}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_body_carries_code_and_configured_expiry() {
        let body = reset_mail_body(123456, 15);
        assert!(body.contains("123456"));
        assert!(body.contains("15 minutos"));

        let body = reset_mail_body(654321, 30);
        assert!(body.contains("30 minutos"));
    }
}
