//! services/record_store.rs
//! Lo que el motor de envío necesita leer y escribir.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    attempt_model::{DeliveryAttempt, NewDeliveryAttempt},
    campaign_model::{Campaign, CampaignStatus, Recipient},
};

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Campaña con su plantilla resuelta, `None` si el id no existe.
    async fn find_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>>;

    /// Destinatarios de la campaña en orden estable (email, nombre).
    async fn campaign_recipients(&self, campaign_id: &str) -> Result<Vec<Recipient>>;

    async fn campaigns_with_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>>;

    /// Inserta un intento nuevo. Nunca actualiza uno existente.
    async fn create_attempt(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt>;

    async fn update_campaign_status(&self, campaign_id: &str, status: CampaignStatus)
        -> Result<()>;
}
