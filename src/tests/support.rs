//! tests/support.rs
//! Dobles de prueba y datos de ejemplo compartidos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::error::TransportError;
use crate::models::attempt_model::{DeliveryAttempt, NewDeliveryAttempt};
use crate::models::campaign_model::{
    Campaign, CampaignStatus, CreateCampaignRequest, CreateMessageRequest,
    CreateRecipientRequest, Recipient,
};
use crate::services::campaign_service::CampaignService;
use crate::services::dispatch_observer::{DispatchEvent, DispatchObserver};
use crate::services::dispatch_service::DispatchEngine;
use crate::services::mail_transport::MailTransport;
use crate::services::record_store::RecordStore;

/// Base SQLite en memoria con las migraciones reales aplicadas.
/// Una sola conexión: cada conexión `:memory:` es una base distinta.
pub async fn memory_service() -> (CampaignService, Pool<Sqlite>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    let service = CampaignService::new(pool.clone());
    service
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    (service, pool)
}

pub async fn count_attempts(pool: &Pool<Sqlite>) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM delivery_attempts")
        .fetch_one(pool)
        .await
        .expect("Failed to count attempts")
}

/// Crea un mensaje, los destinatarios dados y una campaña que los agrupa.
pub async fn seed_campaign(service: &CampaignService, owner: &str, emails: &[&str]) -> String {
    let message = service
        .create_message(
            owner,
            CreateMessageRequest {
                subject: "Novedades".to_string(),
                body: "Hola, estas son las novedades del mes.".to_string(),
            },
        )
        .await
        .expect("Failed to create message");

    let mut recipient_ids = Vec::new();
    for email in emails {
        let recipient = service
            .create_recipient(
                owner,
                CreateRecipientRequest {
                    email: email.to_string(),
                    full_name: format!("Cliente {email}"),
                    comment: None,
                },
            )
            .await
            .expect("Failed to create recipient");
        recipient_ids.push(recipient.id);
    }

    let now = Utc::now();
    service
        .create_campaign(
            owner,
            CreateCampaignRequest {
                first_datetime: now,
                end_datetime: now + Duration::days(7),
                message_id: message.id,
                recipient_ids,
            },
        )
        .await
        .expect("Failed to create campaign")
        .id
}

/// Transporte programable: falla para las direcciones indicadas.
#[derive(Default)]
pub struct ScriptedTransport {
    failures: HashMap<String, String>,
    sent: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn failing(pairs: &[(&str, &str)]) -> Self {
        Self {
            failures: pairs
                .iter()
                .map(|(to, detail)| (to.to_string(), detail.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// Direcciones a las que se intentó enviar, en orden.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Máximo de envíos simultáneos observado.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, _subject: &str, _body: &str, to: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(to.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.failures.get(to) {
            Some(detail) => Err(TransportError::Smtp(detail.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_event(&self, event: &DispatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Envuelve el store real y cuenta las escrituras de estado.
/// Opcionalmente hace fallar la n-ésima llamada a `create_attempt`.
pub struct CountingStore {
    inner: CampaignService,
    status_writes: AtomicUsize,
    attempt_calls: AtomicUsize,
    fail_attempt_call: Option<usize>,
}

impl CountingStore {
    pub fn new(inner: CampaignService) -> Self {
        Self {
            inner,
            status_writes: AtomicUsize::new(0),
            attempt_calls: AtomicUsize::new(0),
            fail_attempt_call: None,
        }
    }

    /// `call` empieza en 1.
    pub fn failing_attempt(inner: CampaignService, call: usize) -> Self {
        Self {
            fail_attempt_call: Some(call),
            ..Self::new(inner)
        }
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn find_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        self.inner.find_campaign(campaign_id).await
    }

    async fn campaign_recipients(&self, campaign_id: &str) -> Result<Vec<Recipient>> {
        self.inner.campaign_recipients(campaign_id).await
    }

    async fn campaigns_with_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>> {
        self.inner.campaigns_with_status(status).await
    }

    async fn create_attempt(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt> {
        let call = self.attempt_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_attempt_call == Some(call) {
            return Err(anyhow!("disk I/O error"));
        }
        self.inner.create_attempt(attempt).await
    }

    async fn update_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<()> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_campaign_status(campaign_id, status).await
    }
}

pub fn engine_with(
    store: Arc<dyn RecordStore>,
    transport: Arc<ScriptedTransport>,
    observer: Arc<RecordingObserver>,
) -> DispatchEngine {
    DispatchEngine::new(store, transport, observer)
}
