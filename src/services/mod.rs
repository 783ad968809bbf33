//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod campaign_service;
pub mod dispatch_observer;
pub mod dispatch_service;
pub mod mail_transport;
pub mod record_store;
pub mod run_invoker;
