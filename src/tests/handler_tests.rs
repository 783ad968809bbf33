//! tests/handler_tests.rs
//! Pruebas de la API HTTP con `actix_web::test`.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use crate::app::init_app;
use crate::handlers::ACCOUNT_HEADER;
use crate::models::campaign_model::CampaignStatus;
use crate::services::campaign_service::CampaignService;
use crate::services::record_store::RecordStore;
use crate::tests::support::{
    engine_with, memory_service, seed_campaign, RecordingObserver, ScriptedTransport,
};

macro_rules! test_app {
    ($service:expr, $transport:expr) => {{
        let engine = engine_with(
            Arc::new($service.clone()),
            $transport,
            Arc::new(RecordingObserver::default()),
        );
        test::init_service(
            App::new()
                .app_data(web::Data::new($service.clone()))
                .app_data(web::Data::new(engine))
                .configure(init_app),
        )
        .await
    }};
}

async fn wait_for_status(service: &CampaignService, campaign_id: &str, status: CampaignStatus) {
    for _ in 0..100 {
        let campaign = service.find_campaign(campaign_id).await.unwrap().unwrap();
        if campaign.status == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("campaign {campaign_id} never reached {status}");
}

#[actix_rt::test]
async fn full_flow_over_http() {
    let (service, _pool) = memory_service().await;
    let app = test_app!(service, Arc::new(ScriptedTransport::default()));

    // Destinatarios
    let mut recipient_ids = Vec::new();
    for email in ["a@example.com", "b@example.com"] {
        let req = test::TestRequest::post()
            .uri("/api/recipients")
            .insert_header((ACCOUNT_HEADER, "alice"))
            .set_json(json!({"email": email, "full_name": "Cliente"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        recipient_ids.push(body["id"].as_str().unwrap().to_string());
    }

    // Mensaje
    let req = test::TestRequest::post()
        .uri("/api/messages")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .set_json(json!({"subject": "Hola", "body": "Texto"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = test::read_body_json(resp).await;

    // Campaña
    let req = test::TestRequest::post()
        .uri("/api/campaigns")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .set_json(json!({
            "first_datetime": "2025-03-01T09:00:00Z",
            "end_datetime": "2025-03-08T09:00:00Z",
            "message_id": message["id"],
            "recipient_ids": recipient_ids,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let campaign: Value = test::read_body_json(resp).await;
    assert_eq!(campaign["status"], "created");
    let campaign_id = campaign["id"].as_str().unwrap().to_string();

    // Lanzar: respuesta inmediata, el envío sigue en segundo plano
    let req = test::TestRequest::post()
        .uri(&format!("/api/campaigns/{campaign_id}/start"))
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "success", "message": "campaign started"}));

    wait_for_status(&service, &campaign_id, CampaignStatus::Completed).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{campaign_id}/attempts"))
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let attempts: Value = test::read_body_json(resp).await;
    let attempts = attempts.as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|a| a["status"] == "success"));

    // Ya completada: 400
    let req = test::TestRequest::post()
        .uri(&format!("/api/campaigns/{campaign_id}/start"))
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "campaign already completed");

    // Contadores
    let req = test::TestRequest::get()
        .uri("/api/stats")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        stats,
        json!({"total_campaigns": 1, "active_campaigns": 0, "unique_recipients": 2})
    );
}

#[actix_rt::test]
async fn start_is_limited_to_the_owner() {
    let (service, _pool) = memory_service().await;
    let campaign_id = seed_campaign(&service, "alice", &["a@x"]).await;
    let transport = Arc::new(ScriptedTransport::default());
    let app = test_app!(service, transport.clone());

    let req = test::TestRequest::post()
        .uri(&format!("/api/campaigns/{campaign_id}/start"))
        .insert_header((ACCOUNT_HEADER, "mallory"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "campaign not found");

    let req = test::TestRequest::post()
        .uri("/api/campaigns/missing/start")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/campaigns/{campaign_id}/start"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert!(transport.sent().is_empty());
}

#[actix_rt::test]
async fn partially_failed_campaign_can_be_started_again() {
    let (service, _pool) = memory_service().await;
    let campaign_id = seed_campaign(&service, "alice", &["a@x", "b@x"]).await;
    let app = test_app!(
        service,
        Arc::new(ScriptedTransport::failing(&[("a@x", "mailbox full")]))
    );

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri(&format!("/api/campaigns/{campaign_id}/start"))
            .insert_header((ACCOUNT_HEADER, "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        wait_for_status(&service, &campaign_id, CampaignStatus::Started).await;
    }

    // Las dos ejecuciones terminan escribiendo 2 intentos cada una
    for _ in 0..100 {
        if service.list_attempts("alice", &campaign_id).await.unwrap().len() == 4 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected 4 attempts after two runs");
}

#[actix_rt::test]
async fn campaign_creation_validates_ownership_and_dates() {
    let (service, _pool) = memory_service().await;
    let app = test_app!(service, Arc::new(ScriptedTransport::default()));

    let req = test::TestRequest::post()
        .uri("/api/messages")
        .insert_header((ACCOUNT_HEADER, "bob"))
        .set_json(json!({"subject": "De Bob", "body": "..."}))
        .to_request();
    let bobs_message: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/campaigns")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .set_json(json!({
            "first_datetime": "2025-03-01T09:00:00Z",
            "end_datetime": "2025-03-08T09:00:00Z",
            "message_id": bobs_message["id"],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/campaigns")
        .insert_header((ACCOUNT_HEADER, "bob"))
        .set_json(json!({
            "first_datetime": "2025-03-08T09:00:00Z",
            "end_datetime": "2025-03-01T09:00:00Z",
            "message_id": bobs_message["id"],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/recipients")
        .insert_header((ACCOUNT_HEADER, "bob"))
        .set_json(json!({"email": "sin-arroba", "full_name": "X"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn stats_storage_error_uses_shared_error_body() {
    let (service, pool) = memory_service().await;
    let app = test_app!(service, Arc::new(ScriptedTransport::default()));

    pool.close().await;
    let req = test::TestRequest::get()
        .uri("/api/stats")
        .insert_header((ACCOUNT_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().is_some());
}
