//! # Erros de Configuração
//!
//! Todos os erros do transdutor acontecem na fase de **construção** da tabela.
//! A execução (`Transducer::run`) nunca falha: se a tabela foi construída,
//! ela é consistente.

use thiserror::Error;

/// Erros detectados ao registrar estados, transições ou carregar definições.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// O estado já havia sido registrado.
    #[error("estado duplicado: '{0}'")]
    DuplicateState(String),

    /// Uma transição (ou o estado inicial) referencia um estado inexistente.
    #[error("estado desconhecido: '{0}'")]
    UnknownState(String),

    /// O padrão da transição não é uma expressão regular válida.
    #[error("padrão inválido '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Falha ao ler um arquivo de definições.
    #[error("falha ao ler definições de '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// O conjunto de definições não é um JSON válido.
    #[error("definições malformadas: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Nome curto da categoria do erro (útil em logs e respostas HTTP)
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::DuplicateState(_) => "duplicate_state",
            ConfigError::UnknownState(_) => "unknown_state",
            ConfigError::InvalidPattern { .. } => "invalid_pattern",
            ConfigError::Io { .. } => "io",
            ConfigError::Parse(_) => "parse",
        }
    }
}
