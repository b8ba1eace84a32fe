//! Interface de linha de comando do accessgate baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (reconcile, reclaim,
//! status, set, watch) e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// accessgate — Reconciliação do acesso à plataforma e recuperação de jobs órfãos.
#[derive(Debug, Parser)]
#[command(name = "accessgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./accessgate.toml).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (nível debug no log).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma verificação de saúde da plataforma e ajusta o acesso.
    Reconcile,

    /// Destrava jobs cujo worker não está mais em execução.
    Reclaim,

    /// Mostra o estado atual do acesso à plataforma.
    Status,

    /// Define o acesso manualmente (on, readonly ou off).
    Set {
        /// Novo modo de acesso.
        mode: String,
    },

    /// Executa as duas passadas periodicamente até Ctrl-C.
    Watch,
}
