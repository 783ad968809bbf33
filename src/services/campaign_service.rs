//! services/campaign_service.rs
//! Persistencia en SQLite de destinatarios, mensajes, campañas e intentos.

use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::{
    error::RecordError,
    models::{
        attempt_model::{DeliveryAttempt, NewDeliveryAttempt},
        campaign_model::{
            AccountStats, Campaign, CampaignResponse, CampaignStatus, CreateCampaignRequest,
            CreateMessageRequest, CreateRecipientRequest, MessageTemplate, Recipient,
        },
    },
    services::record_store::RecordStore,
};

const CAMPAIGN_SELECT: &str = r#"
    SELECT
        c.id, c.first_datetime, c.end_datetime, c.status, c.owner_id, c.created_at,
        m.id AS message_id, m.subject, m.body, m.owner_id AS message_owner_id
    FROM campaigns c
    JOIN messages m ON m.id = c.message_id
"#;

#[derive(Debug, FromRow)]
struct CampaignRow {
    id: String,
    first_datetime: String,
    end_datetime: String,
    status: String,
    owner_id: String,
    created_at: String,
    message_id: String,
    subject: String,
    body: String,
    message_owner_id: String,
}

impl CampaignRow {
    fn into_campaign(self) -> Result<Campaign> {
        Ok(Campaign {
            first_datetime: parse_timestamp(&self.first_datetime)?,
            end_datetime: parse_timestamp(&self.end_datetime)?,
            status: self.status.parse()?,
            created_at: parse_timestamp(&self.created_at)?,
            message: MessageTemplate {
                id: self.message_id,
                subject: self.subject,
                body: self.body,
                owner_id: self.message_owner_id,
            },
            id: self.id,
            owner_id: self.owner_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecipientRow {
    id: String,
    email: String,
    full_name: String,
    comment: Option<String>,
    owner_id: String,
}

impl From<RecipientRow> for Recipient {
    fn from(r: RecipientRow) -> Self {
        Recipient {
            id: r.id,
            email: r.email,
            full_name: r.full_name,
            comment: r.comment,
            owner_id: r.owner_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct AttemptRow {
    id: String,
    attempted_at: String,
    status: String,
    server_response: Option<String>,
    campaign_id: String,
    recipient_id: Option<String>,
    owner_id: String,
}

impl AttemptRow {
    fn into_attempt(self) -> Result<DeliveryAttempt> {
        Ok(DeliveryAttempt {
            attempted_at: parse_timestamp(&self.attempted_at)?,
            status: self.status.parse()?,
            id: self.id,
            server_response: self.server_response,
            campaign_id: self.campaign_id,
            recipient_id: self.recipient_id,
            owner_id: self.owner_id,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .with_context(|| format!("Timestamp inválido en la base: {raw}"))
}

#[derive(Clone, Debug)]
pub struct CampaignService {
    db_pool: Pool<Sqlite>,
}

impl CampaignService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        CampaignService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Failed to run mailing migrations")?;
        Ok(())
    }

    // ----------------------------------------------------------------
    // Gestión de registros (lo mínimo para alimentar los envíos)
    // ----------------------------------------------------------------

    pub async fn create_recipient(
        &self,
        owner_id: &str,
        req: CreateRecipientRequest,
    ) -> Result<Recipient, RecordError> {
        let email = req.email.trim().to_string();
        let full_name = req.full_name.trim().to_string();
        if !email.contains('@') {
            return Err(RecordError::Invalid(format!("invalid email address: {email}")));
        }
        if full_name.is_empty() {
            return Err(RecordError::Invalid("full_name must not be empty".to_string()));
        }

        let recipient = Recipient {
            id: Uuid::new_v4().to_string(),
            email,
            full_name,
            comment: req.comment,
            owner_id: owner_id.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO recipients (id, email, full_name, comment, owner_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&recipient.id)
        .bind(&recipient.email)
        .bind(&recipient.full_name)
        .bind(&recipient.comment)
        .bind(&recipient.owner_id)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar recipient")?;

        Ok(recipient)
    }

    /// Borra un destinatario. Sus intentos previos quedan sin referencia.
    pub async fn delete_recipient(&self, owner_id: &str, recipient_id: &str) -> Result<(), RecordError> {
        let result = sqlx::query(r#"DELETE FROM recipients WHERE id = ?1 AND owner_id = ?2"#)
            .bind(recipient_id)
            .bind(owner_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar recipient")?;

        if result.rows_affected() == 0 {
            return Err(RecordError::NotFound("recipient"));
        }
        Ok(())
    }

    pub async fn create_message(
        &self,
        owner_id: &str,
        req: CreateMessageRequest,
    ) -> Result<MessageTemplate, RecordError> {
        if req.subject.trim().is_empty() {
            return Err(RecordError::Invalid("subject must not be empty".to_string()));
        }

        let message = MessageTemplate {
            id: Uuid::new_v4().to_string(),
            subject: req.subject,
            body: req.body,
            owner_id: owner_id.to_string(),
        };

        sqlx::query(r#"INSERT INTO messages (id, subject, body, owner_id) VALUES (?1, ?2, ?3, ?4)"#)
            .bind(&message.id)
            .bind(&message.subject)
            .bind(&message.body)
            .bind(&message.owner_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al insertar message")?;

        Ok(message)
    }

    /// Crea la campaña en estado "created". El mensaje y todos los
    /// destinatarios deben pertenecer a la misma cuenta.
    pub async fn create_campaign(
        &self,
        owner_id: &str,
        req: CreateCampaignRequest,
    ) -> Result<CampaignResponse, RecordError> {
        if req.end_datetime < req.first_datetime {
            return Err(RecordError::Invalid(
                "end_datetime must not precede first_datetime".to_string(),
            ));
        }

        // 1) Mensaje
        let message_owner: Option<String> =
            sqlx::query_scalar(r#"SELECT owner_id FROM messages WHERE id = ?1"#)
                .bind(&req.message_id)
                .fetch_optional(&self.db_pool)
                .await
                .context("Fallo al buscar message")?;
        match message_owner {
            None => return Err(RecordError::NotFound("message")),
            Some(owner) if owner != owner_id => {
                return Err(RecordError::Forbidden(
                    "message belongs to another account".to_string(),
                ))
            }
            Some(_) => {}
        }

        // 2) Destinatarios (sin duplicados, conservando el orden recibido)
        let mut seen = HashSet::new();
        let recipient_ids: Vec<String> = req
            .recipient_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        for recipient_id in &recipient_ids {
            let recipient_owner: Option<String> =
                sqlx::query_scalar(r#"SELECT owner_id FROM recipients WHERE id = ?1"#)
                    .bind(recipient_id)
                    .fetch_optional(&self.db_pool)
                    .await
                    .context("Fallo al buscar recipient")?;
            match recipient_owner {
                None => return Err(RecordError::NotFound("recipient")),
                Some(owner) if owner != owner_id => {
                    return Err(RecordError::Forbidden(
                        "recipients belong to another account".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        // 3) Insertar todo en una transacción
        let campaign_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .db_pool
            .begin()
            .await
            .context("Fallo al abrir transacción")?;

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, first_datetime, end_datetime, status, message_id, owner_id, created_at
            )
            VALUES (?1, ?2, ?3, 'created', ?4, ?5, ?6)
            "#,
        )
        .bind(&campaign_id)
        .bind(req.first_datetime.to_rfc3339())
        .bind(req.end_datetime.to_rfc3339())
        .bind(&req.message_id)
        .bind(owner_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .context("Fallo al insertar campaign")?;

        for recipient_id in &recipient_ids {
            sqlx::query(
                r#"INSERT INTO campaign_recipients (campaign_id, recipient_id) VALUES (?1, ?2)"#,
            )
            .bind(&campaign_id)
            .bind(recipient_id)
            .execute(&mut *tx)
            .await
            .context("Fallo al vincular recipient")?;
        }

        tx.commit().await.context("Fallo al confirmar campaign")?;

        Ok(CampaignResponse {
            id: campaign_id,
            first_datetime: req.first_datetime,
            end_datetime: req.end_datetime,
            status: CampaignStatus::Created,
            message_id: req.message_id,
            recipient_ids,
            owner_id: owner_id.to_string(),
        })
    }

    /// Campaña visible solo para su dueño; para otra cuenta es "not found".
    pub async fn get_owned_campaign(
        &self,
        owner_id: &str,
        campaign_id: &str,
    ) -> Result<Campaign, RecordError> {
        match self.find_campaign(campaign_id).await? {
            Some(campaign) if campaign.owner_id == owner_id => Ok(campaign),
            _ => Err(RecordError::NotFound("campaign")),
        }
    }

    pub async fn campaign_response(
        &self,
        owner_id: &str,
        campaign_id: &str,
    ) -> Result<CampaignResponse, RecordError> {
        let campaign = self.get_owned_campaign(owner_id, campaign_id).await?;
        let recipient_ids = self
            .campaign_recipients(campaign_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        Ok(CampaignResponse {
            id: campaign.id,
            first_datetime: campaign.first_datetime,
            end_datetime: campaign.end_datetime,
            status: campaign.status,
            message_id: campaign.message.id,
            recipient_ids,
            owner_id: campaign.owner_id,
        })
    }

    /// Intentos de la campaña, los más recientes primero.
    pub async fn list_attempts(
        &self,
        owner_id: &str,
        campaign_id: &str,
    ) -> Result<Vec<DeliveryAttempt>, RecordError> {
        self.get_owned_campaign(owner_id, campaign_id).await?;

        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, attempted_at, status, server_response,
                   campaign_id, recipient_id, owner_id
            FROM delivery_attempts
            WHERE campaign_id = ?1
            ORDER BY attempted_at DESC, rowid DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar intentos")?;

        let mut attempts = Vec::with_capacity(rows.len());
        for row in rows {
            attempts.push(row.into_attempt()?);
        }
        Ok(attempts)
    }

    pub async fn account_stats(&self, owner_id: &str) -> Result<AccountStats> {
        let total_campaigns: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM campaigns WHERE owner_id = ?1"#)
                .bind(owner_id)
                .fetch_one(&self.db_pool)
                .await?;

        let active_campaigns: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM campaigns WHERE owner_id = ?1 AND status = 'started'"#,
        )
        .bind(owner_id)
        .fetch_one(&self.db_pool)
        .await?;

        let unique_recipients: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(DISTINCT email) FROM recipients WHERE owner_id = ?1"#)
                .bind(owner_id)
                .fetch_one(&self.db_pool)
                .await?;

        Ok(AccountStats {
            total_campaigns,
            active_campaigns,
            unique_recipients,
        })
    }
}

#[async_trait]
impl RecordStore for CampaignService {
    async fn find_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let sql = format!("{CAMPAIGN_SELECT} WHERE c.id = ?1");
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(campaign_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Fallo al buscar campaign")?;

        row.map(CampaignRow::into_campaign).transpose()
    }

    async fn campaign_recipients(&self, campaign_id: &str) -> Result<Vec<Recipient>> {
        let rows = sqlx::query_as::<_, RecipientRow>(
            r#"
            SELECT r.id, r.email, r.full_name, r.comment, r.owner_id
            FROM recipients r
            JOIN campaign_recipients cr ON cr.recipient_id = r.id
            WHERE cr.campaign_id = ?1
            ORDER BY r.email, r.full_name, r.id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al cargar recipients de la campaign")?;

        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    async fn campaigns_with_status(&self, status: CampaignStatus) -> Result<Vec<Campaign>> {
        let sql = format!("{CAMPAIGN_SELECT} WHERE c.status = ?1 ORDER BY c.first_datetime DESC");
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.db_pool)
            .await
            .context("Fallo al listar campaigns por estado")?;

        rows.into_iter().map(CampaignRow::into_campaign).collect()
    }

    async fn create_attempt(&self, attempt: NewDeliveryAttempt) -> Result<DeliveryAttempt> {
        let record = DeliveryAttempt {
            id: Uuid::new_v4().to_string(),
            attempted_at: Utc::now(),
            status: attempt.status,
            server_response: Some(attempt.server_response),
            campaign_id: attempt.campaign_id,
            recipient_id: Some(attempt.recipient_id),
            owner_id: attempt.owner_id,
        };

        sqlx::query(
            r#"
            INSERT INTO delivery_attempts (
                id, attempted_at, status, server_response,
                campaign_id, recipient_id, owner_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(record.attempted_at.to_rfc3339())
        .bind(record.status.as_str())
        .bind(&record.server_response)
        .bind(&record.campaign_id)
        .bind(&record.recipient_id)
        .bind(&record.owner_id)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar delivery attempt")?;

        Ok(record)
    }

    async fn update_campaign_status(
        &self,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<()> {
        let result = sqlx::query(r#"UPDATE campaigns SET status = ?1 WHERE id = ?2"#)
            .bind(status.as_str())
            .bind(campaign_id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al actualizar estado de campaign")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Campaign {campaign_id} desapareció antes de guardar su estado");
        }
        Ok(())
    }
}
