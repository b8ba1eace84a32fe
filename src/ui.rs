//! Interface de terminal do accessgate — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`PassProgress`] acompanha visualmente
//! uma passada de reconciliação ou de recuperação de jobs.

use std::fmt::Display;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use accessgate::{AccessState, AccessValue, ReclaimReport, ReconcileOutcome};

/// Indicador visual de progresso para uma passada no terminal.
///
/// Exibe um spinner durante a execução e mensagens coloridas para
/// sucesso (verde), falha (vermelho) e avisos (amarelo).
pub struct PassProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl PassProgress {
    /// Inicia o spinner com a descrição da passada.
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(label.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e descreve o resultado da reconciliação.
    pub fn finish_reconcile(&self, outcome: &ReconcileOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            ReconcileOutcome::Unchanged(value) => {
                println!("  {} Access unchanged ({value})", self.green.apply_to("✓"));
            }
            ReconcileOutcome::Transitioned {
                transition,
                alert_sent,
                bulk,
            } => {
                println!(
                    "  {} Access changed: {} → {}",
                    self.yellow.apply_to("↻"),
                    transition.from,
                    transition.to
                );
                if transition.alert.is_some() {
                    let mark = if *alert_sent {
                        self.green.apply_to("✓")
                    } else {
                        self.red.apply_to("✗")
                    };
                    println!("  {mark} Admin alert");
                }
                match bulk {
                    Some(report) if report.is_clean() => println!(
                        "  {} {} across {} workspaces ({} entries)",
                        self.green.apply_to("✓"),
                        report.mode,
                        report.workspaces,
                        report.pushed
                    ),
                    Some(report) => {
                        println!(
                            "  {} {} across {} workspaces: {} failed",
                            self.red.apply_to("✗"),
                            report.mode,
                            report.workspaces,
                            report.failures.len()
                        );
                        for f in &report.failures {
                            println!("      {}/{} {}: {}", f.project, f.workspace, f.principal, f.error);
                        }
                    }
                    None => println!("  {} Bulk permission pass did not run", self.red.apply_to("✗")),
                }
            }
        }
    }

    /// Finaliza o spinner e descreve a recuperação de jobs.
    pub fn finish_reclaim(&self, report: &ReclaimReport) {
        self.pb.finish_and_clear();
        println!(
            "  {} Unlocked {} of {} locked jobs",
            self.green.apply_to("✓"),
            report.unlocked,
            report.examined
        );
        if report.malformed > 0 || report.failed > 0 {
            println!(
                "  {} {} unparseable, {} failed to unlock",
                self.yellow.apply_to("!"),
                report.malformed,
                report.failed
            );
        }
    }

    /// Finaliza o spinner exibindo o erro em vermelho.
    pub fn fail(&self, err: &dyn Display) {
        self.pb.finish_and_clear();
        println!("  {} {err}", self.red.apply_to("✗"));
    }
}

/// Imprime o estado atual do acesso com cor conforme o valor.
pub fn print_state(state: &AccessState) {
    let style = match state.value {
        AccessValue::On => Style::new().green().bold(),
        AccessValue::LocalOff => Style::new().red().bold(),
        AccessValue::Readonly | AccessValue::Off => Style::new().yellow().bold(),
    };
    println!("Platform access: {}", style.apply_to(state.value));
    println!(
        "Outage alert:    {}",
        if state.notifier_armed { "armed" } else { "sent, waiting for recovery" }
    );
    println!("Last change:     {}", state.updated_at.to_rfc3339());
}
