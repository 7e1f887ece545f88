//! # Registro de Estados
//!
//! Um estado é apenas um nome que marca um ponto do processo de reconhecimento
//! (ex: `"q0"`, `"q_person"`, `"q_date"`). O registro guarda os nomes conhecidos
//! na ordem em que foram adicionados; não há remoção.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identificador opaco de um estado.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StateId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metadados de um estado registrado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub id: StateId,
    /// Marca informativa: o estado encerra uma entidade.
    /// Não altera a política de emissão, que depende apenas dos rótulos.
    pub is_final: bool,
}

/// Conjunto de estados conhecidos.
///
/// Internamente cada estado recebe um índice denso, usado pela tabela de
/// transições para indexar suas listas sem precisar de hashing durante a execução.
#[derive(Debug, Clone, Default)]
pub struct StateRegistry {
    states: Vec<StateInfo>,
    index: HashMap<StateId, usize>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra um novo estado. Falha com `DuplicateState` se o nome já existe.
    pub fn add_state(&mut self, id: impl Into<StateId>) -> Result<usize, ConfigError> {
        self.insert(id.into(), false)
    }

    /// Registra um novo estado marcado como final.
    pub fn add_final_state(&mut self, id: impl Into<StateId>) -> Result<usize, ConfigError> {
        self.insert(id.into(), true)
    }

    fn insert(&mut self, id: StateId, is_final: bool) -> Result<usize, ConfigError> {
        if self.index.contains_key(&id) {
            return Err(ConfigError::DuplicateState(id.to_string()));
        }
        let slot = self.states.len();
        self.index.insert(id.clone(), slot);
        self.states.push(StateInfo { id, is_final });
        Ok(slot)
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Índice denso do estado, se registrado
    pub fn slot(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn info(&self, slot: usize) -> Option<&StateInfo> {
        self.states.get(slot)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Estados na ordem de registro
    pub fn iter(&self) -> impl Iterator<Item = &StateInfo> {
        self.states.iter()
    }
}
