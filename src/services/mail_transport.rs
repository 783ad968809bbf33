//! services/mail_transport.rs
//! Envío real de correos. El motor solo conoce el trait `MailTransport`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::app_config::{SmtpConfig, SmtpTls},
    error::TransportError,
};

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Envía un mensaje a un único destinatario.
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct SmtpTransport {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    timeout_secs: u64,
}

impl SmtpTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .with_context(|| format!("Invalid from address: {}", config.from))?;

        let mut builder = match config.tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .context("No se pudo configurar relay SMTP (TLS)")?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .context("No se pudo configurar relay SMTP (STARTTLS)")?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        match (&config.user, &config.pass) {
            (Some(user), Some(pass)) => {
                builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
            }
            (None, None) => {}
            _ => return Err(anyhow!("SMTP_USER y SMTP_PASS deben ir juntos")),
        }

        Ok(Self {
            mailer: Arc::new(builder.build()),
            from,
            timeout_secs: config.timeout_secs,
        })
    }

    fn build_message(&self, subject: &str, body: &str, to: &str) -> Result<Message, TransportError> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| TransportError::InvalidAddress(to.to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), TransportError> {
        let message = self.build_message(subject, body, to)?;

        tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.mailer.send(message),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout_secs))?
        .map_err(|e| TransportError::Smtp(e.to_string()))?;

        Ok(())
    }
}

/// Transporte de desarrollo: solo deja constancia en el log.
#[derive(Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), TransportError> {
        if !to.contains('@') {
            return Err(TransportError::InvalidAddress(to.to_string()));
        }
        log::info!(
            "(LogTransport) to={} subject='{}' body_len={}",
            to,
            subject,
            body.len()
        );
        Ok(())
    }
}
