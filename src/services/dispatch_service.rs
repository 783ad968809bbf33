//! services/dispatch_service.rs
//! Motor de envío: recorre los destinatarios de una campaña, registra un
//! intento por cada uno y deriva el estado final de la campaña.

use std::sync::Arc;

use anyhow::Result;
use futures_util::{stream::FuturesOrdered, StreamExt};

use crate::{
    error::DispatchError,
    models::{
        attempt_model::{AttemptStatus, NewDeliveryAttempt},
        campaign_model::{Campaign, CampaignStatus, Recipient},
        dispatch_model::{DispatchResult, DispatchSummary},
    },
    services::{
        dispatch_observer::{DispatchEvent, DispatchObserver},
        mail_transport::MailTransport,
        record_store::RecordStore,
    },
};

/// Texto guardado en los intentos exitosos.
pub const DELIVERED_RESPONSE: &str = "delivered";

#[derive(Default)]
struct Tally {
    success: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, status: AttemptStatus) {
        match status {
            AttemptStatus::Success => self.success += 1,
            AttemptStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Clone)]
pub struct DispatchEngine {
    store: Arc<dyn RecordStore>,
    transport: Arc<dyn MailTransport>,
    observer: Arc<dyn DispatchObserver>,
    concurrency: usize,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        transport: Arc<dyn MailTransport>,
        observer: Arc<dyn DispatchObserver>,
    ) -> Self {
        Self {
            store,
            transport,
            observer,
            concurrency: 1,
        }
    }

    /// Máximo de entregas en vuelo dentro de una misma ejecución.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ejecuta la campaña. Nunca devuelve `Err`: los fallos estructurales
    /// llegan como `DispatchResult::Error`.
    pub async fn run(&self, campaign_id: &str) -> DispatchResult {
        match self.try_run(campaign_id).await {
            Ok(summary) => DispatchResult::Ok(summary),
            Err(err) => {
                let message = err.to_string();
                self.observer.on_event(&DispatchEvent::RunAborted {
                    campaign_id: campaign_id.to_string(),
                    message: message.clone(),
                });
                DispatchResult::Error { message }
            }
        }
    }

    async fn try_run(&self, campaign_id: &str) -> Result<DispatchSummary, DispatchError> {
        // 1) Campaña + destinatarios
        let campaign = self
            .store
            .find_campaign(campaign_id)
            .await?
            .ok_or_else(|| DispatchError::CampaignNotFound(campaign_id.to_string()))?;
        let recipients = self.store.campaign_recipients(&campaign.id).await?;

        self.observer.on_event(&DispatchEvent::RunStarted {
            campaign_id: campaign.id.clone(),
            recipients: recipients.len(),
        });

        // 2) Sin destinatarios: se da por completada
        if recipients.is_empty() {
            self.store
                .update_campaign_status(&campaign.id, CampaignStatus::Completed)
                .await?;
            let summary = DispatchSummary::empty();
            self.finish(&campaign, &summary);
            return Ok(summary);
        }

        // 3) Un intento por destinatario; el fallo de uno no corta el resto.
        // Con concurrency = 1 el envío es estrictamente secuencial.
        let mut tally = Tally::default();
        let mut pending = recipients.iter();
        let mut in_flight = FuturesOrdered::new();
        let mut first_error: Option<anyhow::Error> = None;
        for recipient in pending.by_ref().take(self.concurrency) {
            in_flight.push_back(self.deliver(&campaign, recipient));
        }
        // Tras un fallo de almacenamiento no se lanzan entregas nuevas, pero
        // las que ya están en vuelo terminan y quedan registradas.
        while let Some(outcome) = in_flight.next().await {
            match outcome {
                Ok(status) => tally.record(status),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
            if first_error.is_none() {
                if let Some(recipient) = pending.next() {
                    in_flight.push_back(self.deliver(&campaign, recipient));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e.into());
        }
        let Tally { success, failed } = tally;

        // 4) Una sola escritura de estado, después de todos los intentos
        let summary = DispatchSummary::from_counts(success, failed);
        self.store
            .update_campaign_status(&campaign.id, summary.campaign_status)
            .await?;
        self.finish(&campaign, &summary);

        Ok(summary)
    }

    async fn deliver(&self, campaign: &Campaign, recipient: &Recipient) -> Result<AttemptStatus> {
        let sent = self
            .transport
            .send(
                &campaign.message.subject,
                &campaign.message.body,
                &recipient.email,
            )
            .await;

        let (status, server_response) = match sent {
            Ok(()) => {
                self.observer.on_event(&DispatchEvent::Delivered {
                    campaign_id: campaign.id.clone(),
                    recipient_id: recipient.id.clone(),
                    email: recipient.email.clone(),
                });
                (AttemptStatus::Success, DELIVERED_RESPONSE.to_string())
            }
            Err(e) => {
                let detail = e.to_string();
                self.observer.on_event(&DispatchEvent::DeliveryFailed {
                    campaign_id: campaign.id.clone(),
                    recipient_id: recipient.id.clone(),
                    email: recipient.email.clone(),
                    detail: detail.clone(),
                });
                (AttemptStatus::Failed, detail)
            }
        };

        self.store
            .create_attempt(NewDeliveryAttempt {
                status,
                server_response,
                campaign_id: campaign.id.clone(),
                recipient_id: recipient.id.clone(),
                owner_id: campaign.owner_id.clone(),
            })
            .await?;

        Ok(status)
    }

    fn finish(&self, campaign: &Campaign, summary: &DispatchSummary) {
        self.observer.on_event(&DispatchEvent::RunFinished {
            campaign_id: campaign.id.clone(),
            status: summary.campaign_status,
            success: summary.success,
            failed: summary.failed,
        });
    }
}
