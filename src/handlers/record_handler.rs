//! handlers/record_handler.rs
//! Alta de destinatarios y mensajes, más los contadores de la cuenta.

use actix_web::{http::StatusCode, web, HttpResponse};

use crate::{
    handlers::{error_response, record_error_response, CallerAccount},
    models::campaign_model::{CreateMessageRequest, CreateRecipientRequest},
    services::campaign_service::CampaignService,
};

/// POST /api/recipients
pub async fn create_recipient_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CreateRecipientRequest>,
) -> HttpResponse {
    match campaign_service
        .create_recipient(&account.0, body.into_inner())
        .await
    {
        Ok(recipient) => HttpResponse::Created().json(recipient),
        Err(e) => record_error_response(e),
    }
}

/// DELETE /api/recipients/{id}
pub async fn delete_recipient_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    match campaign_service
        .delete_recipient(&account.0, &path.into_inner())
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => record_error_response(e),
    }
}

/// POST /api/messages
pub async fn create_message_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CreateMessageRequest>,
) -> HttpResponse {
    match campaign_service
        .create_message(&account.0, body.into_inner())
        .await
    {
        Ok(message) => HttpResponse::Created().json(message),
        Err(e) => record_error_response(e),
    }
}

/// GET /api/stats
pub async fn stats_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
) -> HttpResponse {
    match campaign_service.account_stats(&account.0).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            log::error!("(stats) error: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
