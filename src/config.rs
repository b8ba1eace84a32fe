//! Configuração do accessgate carregada a partir de `accessgate.toml`.
//!
//! A struct [`AccessConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `ACCESSGATE_PLATFORM_TOKEN` tem precedência sobre o arquivo.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::state_machine::RevokeLevel;

/// Arquivo de configuração procurado no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "accessgate.toml";

/// Variável de ambiente com o token de acesso da plataforma.
pub const TOKEN_ENV_VAR: &str = "ACCESSGATE_PLATFORM_TOKEN";

/// Ambiente de implantação. Em `Production` a capacidade de computação
/// nunca é concedida por uma restauração de permissões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Deployment {
    pub fn allows_compute(self) -> bool {
        self != Deployment::Production
    }
}

/// Configuração de nível superior carregada de `accessgate.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Diretório dos arquivos JSON de estado, workspaces e jobs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Diretório com os arquivos `<workerId>.pid` dos workers ativos.
    #[serde(default = "default_pid_dir")]
    pub pid_dir: PathBuf,

    #[serde(default)]
    pub deployment: Deployment,

    /// Projetos cujos workspaces são gerenciados automaticamente.
    #[serde(default)]
    pub managed_projects: BTreeSet<String>,

    /// Nível aplicado aos colaboradores quando uma queda é detectada.
    #[serde(default = "default_outage_revoke_level")]
    pub outage_revoke_level: RevokeLevel,

    /// Máximo de workspaces processados em paralelo numa passada em massa.
    #[serde(default = "default_bulk_concurrency")]
    pub bulk_concurrency: usize,

    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,

    #[serde(default = "default_reclaim_interval_secs")]
    pub reclaim_interval_secs: u64,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Parâmetros de conexão com a API da plataforma.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Destino dos alertas administrativos. Sem webhook, os alertas vão para o log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_pid_dir() -> PathBuf {
    PathBuf::from("tmp/pids")
}

fn default_outage_revoke_level() -> RevokeLevel {
    RevokeLevel::NoAccess
}

fn default_bulk_concurrency() -> usize {
    4
}

// Intervalo padrão da verificação de saúde: 5 minutos.
fn default_reconcile_interval_secs() -> u64 {
    300
}

// Intervalo padrão da recuperação de jobs órfãos: 10 minutos.
fn default_reclaim_interval_secs() -> u64 {
    600
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pid_dir: default_pid_dir(),
            deployment: Deployment::default(),
            managed_projects: BTreeSet::new(),
            outage_revoke_level: default_outage_revoke_level(),
            bulk_concurrency: default_bulk_concurrency(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            reclaim_interval_secs: default_reclaim_interval_secs(),
            platform: PlatformConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl AccessConfig {
    /// Carrega a configuração do caminho informado ou de `accessgate.toml`.
    /// Usa valores padrão se o arquivo padrão não existir; um caminho
    /// explícito inexistente é erro.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        // Variável de ambiente tem precedência sobre o arquivo para o token.
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                config.platform.access_token = token;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str::<AccessConfig>(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bulk_concurrency == 0 {
            bail!("bulk_concurrency must be at least 1");
        }
        if self.reconcile_interval_secs == 0 || self.reclaim_interval_secs == 0 {
            bail!("pass intervals must be at least 1 second");
        }
        Ok(())
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("access_state.json")
    }

    pub fn workspaces_path(&self) -> PathBuf {
        self.data_dir.join("workspaces.json")
    }

    pub fn jobs_path(&self) -> PathBuf {
        self.data_dir.join("jobs.json")
    }
}
