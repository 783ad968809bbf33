//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod attempt_model;
pub mod campaign_model;
pub mod dispatch_model;
