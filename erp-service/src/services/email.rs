//! Email delivery for password-reset links.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use std::time::Duration;

use crate::config::SmtpConfig;
use erp_core::error::AppError;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), AppError>;
}

/// SMTP-backed provider.
#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::EmailError(e.to_string()))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        AppError::EmailError(e.to_string())
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::EmailError(e.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(AppError::from)?;

        // Send on the blocking pool; the SMTP transport is synchronous.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        reset_token: &str,
        base_url: &str,
    ) -> Result<(), AppError> {
        let reset_link = format!("{}/reset-password?token={}", base_url, reset_token);

        let plain_body = format!(
            "A password reset was requested for your account.\n\n\
             Open this link to choose a new password (valid for 1 hour):\n{}\n\n\
             If you did not request this, you can ignore this email.",
            reset_link
        );
        let html_body = format!(
            r#"<html>
  <body style="font-family: Arial, sans-serif;">
    <h2>Password reset request</h2>
    <p>A password reset was requested for your account.</p>
    <p><a href="{}">Choose a new password</a> (the link is valid for 1 hour).</p>
    <p>If you did not request this, you can ignore this email.</p>
  </body>
</html>"#,
            reset_link
        );

        self.send_email(to_email, "Password Reset Request", plain_body, html_body)
            .await
    }
}

/// Fallback provider used when SMTP is not configured. The reset link is
/// already written to the log by the auth service; delivery is a no-op.
pub struct NoopEmailer;

#[async_trait]
impl EmailProvider for NoopEmailer {
    async fn send_password_reset_email(
        &self,
        to_email: &str,
        _reset_token: &str,
        _base_url: &str,
    ) -> Result<(), AppError> {
        tracing::warn!(to = %to_email, "SMTP not configured; reset link logged only");
        Ok(())
    }
}
