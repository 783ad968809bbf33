//! app.rs
use crate::handlers::{campaign_handler, record_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/recipients")
                    .route(
                        "",
                        web::post().to(record_handler::create_recipient_endpoint),
                    )
                    .route(
                        "/{id}",
                        web::delete().to(record_handler::delete_recipient_endpoint),
                    ),
            )
            .service(
                web::scope("/messages")
                    .route("", web::post().to(record_handler::create_message_endpoint)),
            )
            .service(
                web::scope("/campaigns")
                    .route(
                        "",
                        web::post().to(campaign_handler::create_campaign_endpoint),
                    )
                    .route(
                        "/{id}",
                        web::get().to(campaign_handler::get_campaign_endpoint),
                    )
                    .route(
                        "/{id}/start",
                        web::post().to(campaign_handler::start_campaign_endpoint),
                    )
                    .route(
                        "/{id}/attempts",
                        web::get().to(campaign_handler::list_attempts_endpoint),
                    ),
            )
            .route("/stats", web::get().to(record_handler::stats_endpoint)),
    );
}
