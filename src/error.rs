//! error.rs
//! Errores tipados en los bordes del servicio.

use thiserror::Error;

/// Fallos estructurales de una ejecución. `DispatchEngine::run` los
/// convierte en `DispatchResult::Error`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("campaign with id {0} not found")]
    CampaignNotFound(String),

    #[error("dispatch failed: {0:#}")]
    Failure(#[from] anyhow::Error),
}

/// Fallo de entrega a un destinatario concreto.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Validaciones de la gestión de registros.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
