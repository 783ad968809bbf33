//! cli.rs
//! Definición de la línea de comandos con clap.

use clap::{ArgGroup, Args, Parser, Subcommand};

/// Gestor de campañas de correo
#[derive(Parser, Debug)]
#[command(name = "mailing-service", version, about = "Mailing campaign dispatch service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Levanta la API HTTP
    Serve,

    /// Lanza una campaña concreta o todas las activas
    StartCampaign(StartCampaignArgs),

    /// Aplica las migraciones y termina
    Migrate,
}

#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["campaign_id", "all_active"]),
))]
pub struct StartCampaignArgs {
    /// Id de la campaña a lanzar
    #[arg(long)]
    pub campaign_id: Option<String>,

    /// Lanza todas las campañas en estado `started`
    #[arg(long)]
    pub all_active: bool,

    /// Desactiva los colores en la salida
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}
