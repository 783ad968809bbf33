//! services/run_invoker.rs
//! Puntos de entrada de consola: una campaña concreta o todas las activas.

use std::io::Write;
use std::sync::Arc;

use clap::builder::styling::{AnsiColor, Style};

use crate::{
    models::{campaign_model::CampaignStatus, dispatch_model::DispatchResult},
    services::{dispatch_service::DispatchEngine, record_store::RecordStore},
};

/// Destino de las líneas que produce el invocador.
pub trait RunReporter {
    fn progress(&mut self, line: &str);
    fn success(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

/// Escribe en la consola, en verde los éxitos y en rojo los errores.
pub struct ConsoleReporter<W: Write> {
    out: W,
    colored: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self { out, colored }
    }

    fn write_styled(&mut self, style: Style, line: &str) {
        let written = if self.colored {
            writeln!(self.out, "{}{}{}", style.render(), line, style.render_reset())
        } else {
            writeln!(self.out, "{}", line)
        };
        if let Err(e) = written {
            log::warn!("No se pudo escribir en consola: {}", e);
        }
    }
}

impl<W: Write> RunReporter for ConsoleReporter<W> {
    fn progress(&mut self, line: &str) {
        self.write_styled(Style::new(), line);
    }

    fn success(&mut self, line: &str) {
        self.write_styled(Style::new().fg_color(Some(AnsiColor::Green.into())), line);
    }

    fn error(&mut self, line: &str) {
        self.write_styled(Style::new().fg_color(Some(AnsiColor::Red.into())), line);
    }
}

/// Resumen de una invocación, para decidir el código de salida.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationReport {
    pub campaigns_run: usize,
    pub errors: usize,
}

impl InvocationReport {
    /// `Err` si alguna campaña terminó con un resultado de error.
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.errors > 0 {
            return Err(anyhow::anyhow!(
                "{} campaña(s) terminaron con error",
                self.errors
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct RunInvoker {
    engine: DispatchEngine,
    store: Arc<dyn RecordStore>,
}

impl RunInvoker {
    pub fn new(engine: DispatchEngine, store: Arc<dyn RecordStore>) -> Self {
        Self { engine, store }
    }

    pub async fn run_single(
        &self,
        campaign_id: &str,
        reporter: &mut dyn RunReporter,
    ) -> InvocationReport {
        let mut report = InvocationReport::default();

        match self.store.find_campaign(campaign_id).await {
            Ok(Some(_)) => {
                reporter.progress(&format!("Starting campaign {campaign_id}..."));
                let result = self.engine.run(campaign_id).await;
                report_result(reporter, campaign_id, &result, &mut report);
            }
            Ok(None) => {
                reporter.error(&format!("Campaign {campaign_id} not found"));
                report.errors += 1;
            }
            Err(e) => {
                reporter.error(&format!("Error running campaign {campaign_id}: {e:#}"));
                report.errors += 1;
            }
        }

        report
    }

    /// Corre, una tras otra, todas las campañas en estado `started`.
    pub async fn run_all_active(&self, reporter: &mut dyn RunReporter) -> InvocationReport {
        let mut report = InvocationReport::default();

        let campaigns = match self.store.campaigns_with_status(CampaignStatus::Started).await {
            Ok(campaigns) => campaigns,
            Err(e) => {
                reporter.error(&format!("Could not load active campaigns: {e:#}"));
                report.errors += 1;
                return report;
            }
        };

        if campaigns.is_empty() {
            reporter.progress("No active campaigns to run");
            return report;
        }

        reporter.progress(&format!("Found {} active campaigns...", campaigns.len()));

        for campaign in campaigns {
            reporter.progress(&format!("Starting campaign {}...", campaign.id));
            let result = self.engine.run(&campaign.id).await;
            report_result(reporter, &campaign.id, &result, &mut report);
        }

        report
    }
}

fn report_result(
    reporter: &mut dyn RunReporter,
    campaign_id: &str,
    result: &DispatchResult,
    report: &mut InvocationReport,
) {
    report.campaigns_run += 1;
    match result {
        DispatchResult::Ok(summary) => reporter.success(&format!(
            "Campaign {} finished. Total: {}, success: {}, failed: {}. Message: {}",
            campaign_id, summary.total, summary.success, summary.failed, summary.message
        )),
        DispatchResult::Error { message } => {
            report.errors += 1;
            reporter.error(&format!("Error running campaign {campaign_id}: {message}"));
        }
    }
}
