//! models/attempt_model.rs
//! Registro de cada intento de envío a un destinatario.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Success,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AttemptStatus::Success),
            "failed" => Ok(AttemptStatus::Failed),
            other => Err(anyhow!("Unknown attempt status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: String,
    pub attempted_at: DateTime<Utc>,
    pub status: AttemptStatus,
    pub server_response: Option<String>,
    pub campaign_id: String,
    /// Queda en `None` si el destinatario se borra después.
    pub recipient_id: Option<String>,
    pub owner_id: String,
}

/// Datos para insertar un intento; id y fecha los pone el store.
#[derive(Debug, Clone)]
pub struct NewDeliveryAttempt {
    pub status: AttemptStatus,
    pub server_response: String,
    pub campaign_id: String,
    pub recipient_id: String,
    pub owner_id: String,
}
