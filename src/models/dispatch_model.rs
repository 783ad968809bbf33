//! models/dispatch_model.rs
//! Resultado estructurado de una ejecución de envío.

use serde::Serialize;

use crate::models::campaign_model::CampaignStatus;

pub const NO_RECIPIENTS_MESSAGE: &str = "no recipients to send to.";
pub const ALL_DELIVERED_MESSAGE: &str = "campaign completed successfully";
pub const PARTIAL_FAILURE_MESSAGE: &str = "campaign completed with errors";

/// Lo que devuelve `DispatchEngine::run`. Nunca se propaga como error:
/// quien llama decide cómo mostrarlo según `outcome_kind`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome_kind", rename_all = "lowercase")]
pub enum DispatchResult {
    Ok(DispatchSummary),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub all_succeeded: bool,
    pub campaign_status: CampaignStatus,
    pub message: String,
}

impl DispatchSummary {
    pub fn empty() -> Self {
        DispatchSummary {
            total: 0,
            success: 0,
            failed: 0,
            all_succeeded: true,
            campaign_status: CampaignStatus::Completed,
            message: NO_RECIPIENTS_MESSAGE.to_string(),
        }
    }

    pub fn from_counts(success: usize, failed: usize) -> Self {
        let all_succeeded = failed == 0;
        DispatchSummary {
            total: success + failed,
            success,
            failed,
            all_succeeded,
            campaign_status: if all_succeeded {
                CampaignStatus::Completed
            } else {
                CampaignStatus::Started
            },
            message: if all_succeeded {
                ALL_DELIVERED_MESSAGE.to_string()
            } else {
                PARTIAL_FAILURE_MESSAGE.to_string()
            },
        }
    }
}

impl DispatchResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, DispatchResult::Ok(_))
    }

    pub fn message(&self) -> &str {
        match self {
            DispatchResult::Ok(summary) => &summary.message,
            DispatchResult::Error { message } => message,
        }
    }

    pub fn summary(&self) -> Option<&DispatchSummary> {
        match self {
            DispatchResult::Ok(summary) => Some(summary),
            DispatchResult::Error { .. } => None,
        }
    }
}
