//! Tipos de dados trocados com a API da plataforma.
//!
//! [`AclEntry`] é o corpo enviado ao endpoint de ACL de um workspace;
//! [`PlatformStatus`] é a resposta do endpoint `/status`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Nível de acesso nativo da plataforma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformAccessLevel {
    #[serde(rename = "OWNER")]
    Owner,
    #[serde(rename = "WRITER")]
    Writer,
    #[serde(rename = "READER")]
    Reader,
    #[serde(rename = "NO ACCESS")]
    NoAccess,
}

impl PlatformAccessLevel {
    /// Apenas donos podem compartilhar o workspace.
    pub fn can_share(self) -> bool {
        self == PlatformAccessLevel::Owner
    }

    /// Níveis com permissão de escrita (candidatos a capacidade de computação).
    pub fn can_write(self) -> bool {
        matches!(self, PlatformAccessLevel::Owner | PlatformAccessLevel::Writer)
    }
}

impl fmt::Display for PlatformAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformAccessLevel::Owner => write!(f, "OWNER"),
            PlatformAccessLevel::Writer => write!(f, "WRITER"),
            PlatformAccessLevel::Reader => write!(f, "READER"),
            PlatformAccessLevel::NoAccess => write!(f, "NO ACCESS"),
        }
    }
}

/// Uma entrada de controle de acesso para um principal em um workspace.
///
/// Serializada em camelCase (`accessLevel`, `canShare`, `canCompute`),
/// conforme o formato esperado pela API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    /// Email do principal.
    pub email: String,
    /// Nível de acesso solicitado.
    pub access_level: PlatformAccessLevel,
    /// Pode compartilhar o workspace com terceiros.
    pub can_share: bool,
    /// Pode lançar computação cobrada no projeto.
    pub can_compute: bool,
}

/// Estado de um subsistema individual da plataforma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemStatus {
    pub ok: bool,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Resposta do endpoint `/status` da plataforma.
///
/// `ok` é o veredito global; `systems` detalha cada subsistema e é usado
/// apenas no texto dos alertas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStatus {
    pub ok: bool,
    #[serde(default)]
    pub systems: BTreeMap<String, SubsystemStatus>,
}

impl PlatformStatus {
    /// Status sintético para quando a própria sonda falhou.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        let mut systems = BTreeMap::new();
        systems.insert(
            "api".to_string(),
            SubsystemStatus {
                ok: false,
                messages: vec![reason.into()],
            },
        );
        Self { ok: false, systems }
    }

    /// Nomes dos subsistemas que reportaram falha, em ordem alfabética.
    pub fn failing_systems(&self) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|(_, s)| !s.ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
