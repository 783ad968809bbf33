//! models/campaign_model.rs
//! Destinatarios, plantillas de mensaje y campañas.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Estado de una campaña. Solo el motor de envío lo cambia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Created,
    Started,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Created => "created",
            CampaignStatus::Started => "started",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(CampaignStatus::Created),
            "started" => Ok(CampaignStatus::Started),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(anyhow!("Unknown campaign status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageTemplate {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub owner_id: String,
}

/// Campaña con su plantilla ya resuelta.
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    pub first_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: CampaignStatus,
    pub message: MessageTemplate,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Vista de una campaña para la API (ids de destinatarios incluidos)
#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub id: String,
    pub first_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: CampaignStatus,
    pub message_id: String,
    pub recipient_ids: Vec<String>,
    pub owner_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipientRequest {
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageRequest {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub first_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub message_id: String,
    #[serde(default)]
    pub recipient_ids: Vec<String>,
}

/// Contadores de la página de inicio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountStats {
    pub total_campaigns: i64,
    pub active_campaigns: i64,
    pub unique_recipients: i64,
}
