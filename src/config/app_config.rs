//! config/app_config.rs
//! Configuración leída de variables de entorno (con `.env` cargado antes).

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    StartTls,
    Tls,
    None,
}

impl FromStr for SmtpTls {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "starttls" => Ok(SmtpTls::StartTls),
            "tls" => Ok(SmtpTls::Tls),
            "none" => Ok(SmtpTls::None),
            other => Err(anyhow!("SMTP_TLS desconocido: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub tls: SmtpTls,
    pub timeout_secs: u64,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Smtp,
    Log,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub http_workers: usize,
    pub transport: TransportKind,
    /// Presente si hay `SMTP_HOST`; obligatorio con `MAIL_TRANSPORT=smtp`
    pub smtp: Option<SmtpConfig>,
    /// Entregas en vuelo por ejecución (1 = secuencial)
    pub dispatch_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Igual que `from_env` pero con una fuente arbitraria (útil en tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = get_or("DATABASE_URL", "sqlite:data/mailing.db");
        let bind_addr = get_or("BIND_ADDR", "0.0.0.0");
        let port = parse_var("PORT", &get_or("PORT", "5022"))?;
        let http_workers: usize = parse_var("HTTP_WORKERS", &get_or("HTTP_WORKERS", "1"))?;

        let dispatch_concurrency: usize =
            parse_var("DISPATCH_CONCURRENCY", &get_or("DISPATCH_CONCURRENCY", "1"))?;
        if dispatch_concurrency == 0 {
            return Err(anyhow!("DISPATCH_CONCURRENCY debe ser >= 1"));
        }

        let transport = match get_or("MAIL_TRANSPORT", "smtp").to_ascii_lowercase().as_str() {
            "smtp" => TransportKind::Smtp,
            "log" => TransportKind::Log,
            other => return Err(anyhow!("MAIL_TRANSPORT desconocido: {other}")),
        };

        let smtp = match lookup("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", &get_or("SMTP_PORT", "587"))?,
                user: lookup("SMTP_USER"),
                pass: lookup("SMTP_PASS"),
                tls: get_or("SMTP_TLS", "starttls").parse()?,
                timeout_secs: parse_var("SMTP_TIMEOUT_SECS", &get_or("SMTP_TIMEOUT_SECS", "30"))?,
                from: lookup("DEFAULT_FROM_EMAIL").context("Falta DEFAULT_FROM_EMAIL")?,
            }),
            None => None,
        };

        Ok(AppConfig {
            database_url,
            bind_addr,
            port,
            http_workers: http_workers.max(1),
            transport,
            smtp,
            dispatch_concurrency,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("Valor inválido para {key}='{raw}': {e}"))
}
