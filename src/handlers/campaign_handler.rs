//! handlers/campaign_handler.rs
use actix_web::{http::StatusCode, web, HttpResponse};
use serde_json::json;

use crate::{
    handlers::{error_response, record_error_response, CallerAccount},
    models::campaign_model::{CampaignStatus, CreateCampaignRequest},
    services::{campaign_service::CampaignService, dispatch_service::DispatchEngine},
};

/// POST /api/campaigns
pub async fn create_campaign_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    body: web::Json<CreateCampaignRequest>,
) -> HttpResponse {
    match campaign_service
        .create_campaign(&account.0, body.into_inner())
        .await
    {
        Ok(campaign) => HttpResponse::Created().json(campaign),
        Err(e) => record_error_response(e),
    }
}

/// GET /api/campaigns/{id}
pub async fn get_campaign_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    match campaign_service
        .campaign_response(&account.0, &campaign_id)
        .await
    {
        Ok(campaign) => HttpResponse::Ok().json(campaign),
        Err(e) => record_error_response(e),
    }
}

/// GET /api/campaigns/{id}/attempts
pub async fn list_attempts_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    path: web::Path<String>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    match campaign_service.list_attempts(&account.0, &campaign_id).await {
        Ok(attempts) => HttpResponse::Ok().json(attempts),
        Err(e) => record_error_response(e),
    }
}

/// POST /api/campaigns/{id}/start
///
/// Valida y lanza el envío en segundo plano; el resultado se consulta
/// después en `/attempts`.
pub async fn start_campaign_endpoint(
    account: CallerAccount,
    campaign_service: web::Data<CampaignService>,
    engine: web::Data<DispatchEngine>,
    path: web::Path<String>,
) -> HttpResponse {
    let campaign_id = path.into_inner();

    let campaign = match campaign_service
        .get_owned_campaign(&account.0, &campaign_id)
        .await
    {
        Ok(campaign) => campaign,
        Err(e) => return record_error_response(e),
    };

    if campaign.status == CampaignStatus::Completed {
        return error_response(StatusCode::BAD_REQUEST, "campaign already completed");
    }

    let engine = engine.get_ref().clone();
    tokio::spawn(async move {
        let result = engine.run(&campaign.id).await;
        match result.summary() {
            Some(summary) => log::info!(
                "(start_campaign) campaign={} total={} success={} failed={}",
                campaign.id,
                summary.total,
                summary.success,
                summary.failed
            ),
            None => log::error!(
                "(start_campaign) campaign={} error: {}",
                campaign.id,
                result.message()
            ),
        }
    });

    HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "campaign started"
    }))
}
