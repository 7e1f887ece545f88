//! # Tabela de Transições
//!
//! Cada transição liga um estado de origem a um estado de destino e é disparada
//! quando o token atual casa com uma expressão regular. Opcionalmente carrega um
//! **rótulo** (ex: `"EMAIL"`): quando presente, a entidade acumulada é emitida
//! com essa categoria.
//!
//! ## Ordem importa
//!
//! Um estado pode ter várias transições de saída. Elas são testadas na ordem
//! de registro e a **primeira** que casar vence. Isso permite, por exemplo,
//! tentar "tipo de logradouro" antes de "mais uma palavra do nome da rua".
//!
//! ## Semântica de casamento
//!
//! O padrão precisa casar com o token **inteiro**: `\d{4}` casa com `"1051"`,
//! mas não com `"10512"`. O padrão é compilado uma única vez, no registro.

use std::fmt;

use regex::Regex;
use regex_syntax::hir::{Hir, Look};
use serde::{Serialize, Serializer};

use crate::error::ConfigError;
use crate::state::{StateId, StateRegistry};

/// Expressão regular compilada, ancorada no token inteiro.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compila o padrão. Erros de sintaxe são reportados imediatamente.
    ///
    /// O padrão é validado como foi escrito e só então ancorado, sobre a
    /// árvore sintática: colar `^(?:` e `)$` no texto mudaria o sentido de
    /// padrões como `a)|(b` ou de comentários no modo `(?x)`.
    pub fn compile(source: &str) -> Result<Self, ConfigError> {
        let invalid = |err: regex::Error| ConfigError::InvalidPattern {
            pattern: source.to_string(),
            source: err,
        };

        Regex::new(source).map_err(invalid)?;
        let hir = regex_syntax::Parser::new()
            .parse(source)
            .map_err(|err| invalid(regex::Error::Syntax(err.to_string())))?;
        let anchored = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);
        let regex = Regex::new(&anchored.to_string()).map_err(invalid)?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// O padrão como foi escrito na configuração (sem as âncoras)
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, token: &str) -> bool {
        self.regex.is_match(token)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Uma regra `origem --padrão--> destino [rótulo]`.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub from: StateId,
    pub pattern: Pattern,
    pub to: StateId,
    pub label: Option<String>,
    /// Índice denso do destino no registro (resolvido no momento do registro)
    #[serde(skip)]
    pub(crate) to_slot: usize,
}

impl Transition {
    pub fn matches(&self, token: &str) -> bool {
        self.pattern.is_match(token)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --/{}/--> {}", self.from, self.pattern.as_str(), self.to)?;
        if let Some(label) = &self.label {
            write!(f, " [{}]", label)?;
        }
        Ok(())
    }
}

/// Estados + transições ordenadas por estado de origem.
///
/// A tabela é mutável enquanto está sendo construída. Para estender uma tabela
/// já em uso, clone-a, altere o clone e construa um novo transdutor.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    registry: StateRegistry,
    /// `outgoing[slot]` = transições do estado com aquele índice, em ordem de registro
    outgoing: Vec<Vec<Transition>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, id: impl Into<StateId>) -> Result<(), ConfigError> {
        self.registry.add_state(id)?;
        self.outgoing.push(Vec::new());
        Ok(())
    }

    pub fn add_final_state(&mut self, id: impl Into<StateId>) -> Result<(), ConfigError> {
        self.registry.add_final_state(id)?;
        self.outgoing.push(Vec::new());
        Ok(())
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.registry.has_state(id)
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    /// Anexa uma transição ao fim da lista do estado de origem.
    ///
    /// Os dois estados precisam estar registrados e o padrão precisa compilar;
    /// caso contrário nada é alterado.
    pub fn add_transition(
        &mut self,
        from: &str,
        pattern: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<(), ConfigError> {
        let from_slot = self
            .registry
            .slot(from)
            .ok_or_else(|| ConfigError::UnknownState(from.to_string()))?;
        let to_slot = self
            .registry
            .slot(to)
            .ok_or_else(|| ConfigError::UnknownState(to.to_string()))?;
        let pattern = Pattern::compile(pattern)?;

        self.outgoing[from_slot].push(Transition {
            from: StateId::from(from),
            pattern,
            to: StateId::from(to),
            label: label.map(str::to_string),
            to_slot,
        });
        Ok(())
    }

    /// Transições de saída do estado, na ordem de registro.
    /// Estado sem transições (ou desconhecido) → fatia vazia.
    pub fn transitions_for(&self, from: &str) -> &[Transition] {
        match self.registry.slot(from) {
            Some(slot) => self.transitions_at(slot),
            None => &[],
        }
    }

    pub(crate) fn transitions_at(&self, slot: usize) -> &[Transition] {
        self.outgoing.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Todas as transições, agrupadas por estado de origem na ordem do registro
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.outgoing.iter().flatten()
    }

    pub fn transition_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(states: &[&str]) -> TransitionTable {
        let mut table = TransitionTable::new();
        for s in states {
            table.add_state(*s).unwrap();
        }
        table
    }

    #[test]
    fn test_pattern_is_full_match() {
        let p = Pattern::compile(r"\d{4}").unwrap();
        assert!(p.is_match("1051"));
        assert!(!p.is_match("10512"));
        assert!(!p.is_match("a1051"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        // "^a|b$" casaria "abc"
        let p = Pattern::compile("a|b").unwrap();
        assert!(p.is_match("a"));
        assert!(p.is_match("b"));
        assert!(!p.is_match("abc"));
    }

    #[test]
    fn test_unbalanced_groups_are_rejected() {
        // inválido sozinho; não pode ser "consertado" pelas âncoras
        let err = Pattern::compile("a)|(b").unwrap_err();
        assert_eq!(err.kind(), "invalid_pattern");
        assert!(Pattern::compile("(a").is_err());
    }

    #[test]
    fn test_verbose_pattern_with_trailing_comment() {
        let p = Pattern::compile("(?x) \\d{4}  # irányítószám").unwrap();
        assert!(p.is_match("1051"));
        assert!(!p.is_match("10512"));
        assert!(!p.is_match("x1051"));
        assert_eq!(p.as_str(), "(?x) \\d{4}  # irányítószám");
    }

    #[test]
    fn test_inline_flags_keep_their_meaning() {
        let p = Pattern::compile("(?i)utca").unwrap();
        assert!(p.is_match("UTCA"));
        assert!(!p.is_match("utcai"));
    }

    #[test]
    fn test_invalid_pattern_fails_at_registration() {
        let mut table = table_with(&["q0", "q1"]);
        let err = table.add_transition("q0", "[a-z", "q1", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "[a-z"));
        assert!(table.transitions_for("q0").is_empty());
    }

    #[test]
    fn test_unknown_states_rejected() {
        let mut table = table_with(&["q0"]);
        let err = table.add_transition("q0", "x", "q_missing", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownState(s) if s == "q_missing"));

        let err = table.add_transition("q_missing", "x", "q0", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownState(s) if s == "q_missing"));
        assert_eq!(table.transition_count(), 0);
    }

    #[test]
    fn test_transitions_keep_registration_order() {
        let mut table = table_with(&["q0", "q_a", "q_b"]);
        table.add_transition("q0", "x", "q_a", Some("A")).unwrap();
        table.add_transition("q0", "[a-z]", "q_b", Some("B")).unwrap();

        let outgoing = table.transitions_for("q0");
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].to.as_str(), "q_a");
        assert_eq!(outgoing[1].to.as_str(), "q_b");
        assert!(table.transitions_for("q_a").is_empty());
        assert!(table.transitions_for("nope").is_empty());
    }

    #[test]
    fn test_transition_display() {
        let mut table = table_with(&["q0", "q_email"]);
        table.add_transition("q0", r"\S+@\S+", "q_email", Some("EMAIL")).unwrap();
        let t = &table.transitions_for("q0")[0];
        assert_eq!(t.to_string(), r"q0 --/\S+@\S+/--> q_email [EMAIL]");
    }
}
