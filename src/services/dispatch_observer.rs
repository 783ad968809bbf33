//! services/dispatch_observer.rs
//! Eventos que emite el motor de envío hacia un observador inyectado.

use crate::models::campaign_model::CampaignStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    RunStarted {
        campaign_id: String,
        recipients: usize,
    },
    Delivered {
        campaign_id: String,
        recipient_id: String,
        email: String,
    },
    DeliveryFailed {
        campaign_id: String,
        recipient_id: String,
        email: String,
        detail: String,
    },
    RunFinished {
        campaign_id: String,
        status: CampaignStatus,
        success: usize,
        failed: usize,
    },
    RunAborted {
        campaign_id: String,
        message: String,
    },
}

pub trait DispatchObserver: Send + Sync {
    fn on_event(&self, event: &DispatchEvent);
}

/// Reenvía los eventos al logger global (`log`).
#[derive(Debug, Clone, Default)]
pub struct LogObserver;

impl DispatchObserver for LogObserver {
    fn on_event(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::RunStarted {
                campaign_id,
                recipients,
            } => log::info!(
                "(dispatch) campaign={} iniciando envío a {} destinatarios",
                campaign_id,
                recipients
            ),
            DispatchEvent::Delivered {
                campaign_id,
                recipient_id,
                email,
            } => log::debug!(
                "(dispatch) campaign={} recipient={} <{}> entregado",
                campaign_id,
                recipient_id,
                email
            ),
            DispatchEvent::DeliveryFailed {
                campaign_id,
                recipient_id,
                email,
                detail,
            } => log::error!(
                "(dispatch) campaign={} recipient={} <{}> error de envío: {}",
                campaign_id,
                recipient_id,
                email,
                detail
            ),
            DispatchEvent::RunFinished {
                campaign_id,
                status,
                success,
                failed,
            } => log::info!(
                "(dispatch) campaign={} finalizada status={} success={} failed={}",
                campaign_id,
                status,
                success,
                failed
            ),
            DispatchEvent::RunAborted {
                campaign_id,
                message,
            } => log::error!("(dispatch) campaign={} abortada: {}", campaign_id, message),
        }
    }
}
