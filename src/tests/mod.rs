//! tests/mod.rs
//! Pruebas del motor de envío, del invocador y de la API.

mod handler_tests;
mod support;
