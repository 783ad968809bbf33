use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::cli::{Cli, Commands, StartCampaignArgs};
use crate::config::app_config::{AppConfig, TransportKind};
use crate::logger::init_logger;
use crate::services::campaign_service::CampaignService;
use crate::services::dispatch_observer::LogObserver;
use crate::services::dispatch_service::DispatchEngine;
use crate::services::mail_transport::{LogTransport, MailTransport, SmtpTransport};
use crate::services::record_store::RecordStore;
use crate::services::run_invoker::{ConsoleReporter, RunInvoker};

mod app;
mod cli;
mod config;
mod error;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

async fn setup_database(database_url: &str) -> Result<Pool<Sqlite>> {
    // 1) Crear la carpeta del archivo si no existe (p.ej. ./data)
    if let Some(parent) = sqlite_file_path(database_url).and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("No se pudo crear directorio {:?}", parent))?;
        }
    }

    log::info!("Conectando a SQLite en {}", database_url);

    // 2) Conectarnos con SQLx
    let options = SqliteConnectOptions::from_str(database_url)
        .context("DATABASE_URL inválida")?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")
}

fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let file = rest.split('?').next()?;
    if file.is_empty() || file == ":memory:" {
        None
    } else {
        Some(Path::new(file))
    }
}

fn build_transport(config: &AppConfig) -> Result<Arc<dyn MailTransport>> {
    match config.transport {
        TransportKind::Log => {
            log::warn!("MAIL_TRANSPORT=log: los correos no salen del proceso");
            Ok(Arc::new(LogTransport))
        }
        TransportKind::Smtp => {
            let smtp = config
                .smtp
                .as_ref()
                .ok_or_else(|| anyhow!("MAIL_TRANSPORT=smtp requiere SMTP_HOST y DEFAULT_FROM_EMAIL"))?;
            Ok(Arc::new(SmtpTransport::from_config(smtp)?))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Conectarnos a la DB y migrar
    let db_pool = setup_database(&config.database_url).await?;
    let campaign_service = CampaignService::new(db_pool.clone());
    campaign_service
        .run_migrations()
        .await
        .context("Fallo en migraciones de 'mailing'")?;

    if let Commands::Migrate = cli.command {
        log::info!("Migraciones aplicadas");
        return Ok(());
    }

    let store: Arc<dyn RecordStore> = Arc::new(campaign_service.clone());
    let engine = DispatchEngine::new(
        store.clone(),
        build_transport(&config)?,
        Arc::new(LogObserver),
    )
    .with_concurrency(config.dispatch_concurrency);

    match cli.command {
        Commands::StartCampaign(args) => start_campaign(args, engine, store).await,
        Commands::Serve => serve(config, campaign_service, engine).await,
        Commands::Migrate => Ok(()),
    }
}

async fn start_campaign(
    args: StartCampaignArgs,
    engine: DispatchEngine,
    store: Arc<dyn RecordStore>,
) -> Result<()> {
    let invoker = RunInvoker::new(engine, store);
    let stdout = std::io::stdout();
    let colored = !args.no_color && stdout.is_terminal();
    let mut reporter = ConsoleReporter::new(stdout.lock(), colored);

    let report = match (&args.campaign_id, args.all_active) {
        (Some(campaign_id), _) => invoker.run_single(campaign_id, &mut reporter).await,
        (None, true) => invoker.run_all_active(&mut reporter).await,
        // clap ya exige uno de los dos
        (None, false) => return Err(anyhow!("Se requiere --campaign-id o --all-active")),
    };

    report.into_result()
}

async fn serve(
    config: AppConfig,
    campaign_service: CampaignService,
    engine: DispatchEngine,
) -> Result<()> {
    log::info!("Levantando servidor en {}:{}", config.bind_addr, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(campaign_service.clone()))
            .app_data(web::Data::new(engine.clone()))
            .configure(app::init_app)
    })
    .workers(config.http_workers)
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}

#[cfg(test)]
mod main_tests {
    use super::sqlite_file_path;
    use std::path::Path;

    #[test]
    fn extracts_sqlite_file_from_url() {
        assert_eq!(
            sqlite_file_path("sqlite:data/mailing.db"),
            Some(Path::new("data/mailing.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite://data/x.db?mode=rwc"),
            Some(Path::new("data/x.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://x"), None);
    }
}
