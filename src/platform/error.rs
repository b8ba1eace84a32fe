//! Tipos de erro para o cliente da API da plataforma de workspaces.
//!
//! Define [`PlatformError`] com variantes para erros HTTP da API, URLs
//! inválidas e erros de rede. Usa `thiserror` para derivar `Display` e
//! `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao falar com a API da plataforma.
///
/// - [`ApiError`](PlatformError::ApiError) — a API respondeu com 4xx/5xx
/// - [`InvalidUrl`](PlatformError::InvalidUrl) — a URL base configurada não é válida
/// - [`NetworkError`](PlatformError::NetworkError) — falha na camada de rede
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Erro retornado pela API (ex.: 403 sem permissão, 503 indisponível).
    /// Contém o código de status HTTP e o corpo da resposta.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A URL base não pôde ser combinada com o caminho do endpoint.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
