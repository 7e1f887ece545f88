//! # Configuração do Transdutor — Definições de Entidades
//!
//! Os estados e transições são **dados**: um [`EntityDefinitions`] descreve o
//! autômato de forma declarativa (e pode ser lido de JSON), e o
//! [`TransducerBuilder`] transforma essas definições em um [`Transducer`]
//! imutável.
//!
//! ## Conjunto padrão
//!
//! [`EntityDefinitions::default_set`] cobre as categorias
//! `PERSON, POSTALCODE, CITY, ADDRESS, PRICE, EMAIL, DATE, PHONE_NUMBER, URL, NUMBER`
//! com padrões voltados a textos em húngaro (telefones `06`/`+36`, ruas com
//! `utca`/`út`/`tér`, valores em forint).
//!
//! ## Formato JSON
//!
//! ```json
//! {
//!   "initial_state": "q0",
//!   "states": [{ "name": "q_iban", "final": true }],
//!   "transitions": [
//!     { "from": "q0", "pattern": "HU\\d{26}", "to": "q_iban", "label": "IBAN" }
//!   ]
//! }
//! ```
//!
//! ## Carga tudo-ou-nada
//!
//! Um conjunto de definições é aplicado sobre uma cópia da tabela; a cópia só
//! substitui a original se **todas** as definições forem válidas.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::Transducer;
use crate::error::ConfigError;
use crate::state::StateId;
use crate::transition::TransitionTable;

/// Estado inicial usado quando as definições não especificam um.
pub const DEFAULT_INITIAL_STATE: &str = "q0";

/// Declaração de um estado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

/// Declaração de uma transição.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: String,
    pub pattern: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Conjunto declarativo de estados e transições.
///
/// Um conjunto de **extensão** pode omitir `initial_state` e referenciar
/// estados registrados por um conjunto anterior (ex: transições a partir de `q0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinitions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<String>,
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

/// Estados do conjunto padrão: (nome, final)
const DEFAULT_STATES: &[(&str, bool)] = &[
    ("q0", false),
    ("q_phone", true),
    ("q_date", true),
    ("q_email", true),
    ("q_url", true),
    ("q_price", true),
    ("q_postalcode", true),
    ("q_city", true),
    ("q_number", true),
    // inteiro isolado: pode virar preço ("1500 forint") ou início de endereço ("1051 Budapest, ...")
    ("q_amount", false),
    ("q_address_city", false),
    ("q_address_street", false),
    ("q_address_street_type", false),
    ("q_address", true),
    ("q_person", false),
    ("q_person_last", true),
];

const CAPITALIZED_WORD: &str = r"\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?";

/// Transições do conjunto padrão: (origem, padrão, destino, rótulo).
/// Agrupadas por estado de origem, na ordem dos estados. Dentro de cada estado
/// a ordem é significativa: padrões mais específicos vêm primeiro.
const DEFAULT_TRANSITIONS: &[(&str, &str, &str, Option<&str>)] = &[
    (
        "q0",
        r"(?:\+36|06)[-/]?\d{1,2}[-/]?\d{3}-?\d{3,4}",
        "q_phone",
        Some("PHONE_NUMBER"),
    ),
    (
        "q0",
        r"\d{4}[./-]\d{1,2}[./-]\d{1,2}|\d{1,2}[./-]\d{1,2}[./-]\d{4}",
        "q_date",
        Some("DATE"),
    ),
    (
        "q0",
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        "q_email",
        Some("EMAIL"),
    ),
    (
        "q0",
        r"https?://[A-Za-z0-9.-]+(?:/[A-Za-z0-9&%_./?=#-]*)?|www\.[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?:/[A-Za-z0-9&%_./?=#-]*)?",
        "q_url",
        Some("URL"),
    ),
    (
        "q0",
        r"\d+(?:[.,]\d+)*(?:Ft|HUF|EUR|USD|GBP|€|\$)|[$€£]\d+(?:[.,]\d+)*",
        "q_price",
        Some("PRICE"),
    ),
    ("q0", r"H-\d{4}", "q_postalcode", Some("POSTALCODE")),
    (
        "q0",
        r"(?:Budapest|Debrecen|Szeged|Miskolc|Pécs|Győr|Nyíregyháza|Kecskemét|Székesfehérvár|Szombathely|Szolnok|Eger|Veszprém|Sopron|Kaposvár),?",
        "q_city",
        Some("CITY"),
    ),
    (
        "q0",
        r"[+-]?\d{1,3}(?:\.\d{3})+(?:,\d+)?|[+-]?\d+[.,]\d+|[+-]\d+|\d+(?:[.,]\d+)?%",
        "q_number",
        Some("NUMBER"),
    ),
    ("q0", r"\d+", "q_amount", None),
    ("q0", CAPITALIZED_WORD, "q_person", None),
    (
        "q_amount",
        r"forint|Ft|HUF|euró|euro|EUR|dollár|dollars?|USD|fonts?|pounds?|GBP|jen|yen",
        "q_price",
        Some("PRICE"),
    ),
    ("q_amount", r"\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?,?", "q_address_city", None),
    ("q_address_city", r"\p{Lu}[\p{L}-]*", "q_address_street", None),
    (
        "q_address_street",
        r"(?:utca|u|út|útja|tér|körút|krt|köz|sor|sétány|rakpart|fasor|park),?",
        "q_address_street_type",
        None,
    ),
    ("q_address_street", r"\p{Lu}[\p{L}-]*", "q_address_street", None),
    (
        "q_address_street_type",
        r"\d+(?:/[A-Za-z]|[A-Za-z])?,?",
        "q_address",
        Some("ADDRESS"),
    ),
    ("q_person", CAPITALIZED_WORD, "q_person_last", Some("PERSON")),
];

impl EntityDefinitions {
    /// Conjunto padrão, construído sob demanda (não há instância global).
    pub fn default_set() -> Self {
        Self {
            initial_state: Some(DEFAULT_INITIAL_STATE.to_string()),
            states: DEFAULT_STATES
                .iter()
                .map(|(name, is_final)| StateDef {
                    name: name.to_string(),
                    is_final: *is_final,
                })
                .collect(),
            transitions: DEFAULT_TRANSITIONS
                .iter()
                .map(|(from, pattern, to, label)| TransitionDef {
                    from: from.to_string(),
                    pattern: pattern.to_string(),
                    to: to.to_string(),
                    label: label.map(str::to_string),
                })
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Anexa um conjunto de extensão a este conjunto.
    /// O estado inicial deste conjunto prevalece, se definido.
    pub fn merge(mut self, other: EntityDefinitions) -> Self {
        if self.initial_state.is_none() {
            self.initial_state = other.initial_state;
        }
        self.states.extend(other.states);
        self.transitions.extend(other.transitions);
        self
    }

    /// Categorias distintas emitidas pelas transições, na ordem em que aparecem
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for label in self.transitions.iter().filter_map(|t| t.label.as_deref()) {
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        seen
    }
}

/// Fase mutável de construção do transdutor.
///
/// ```rust
/// use ner_fst::config::TransducerBuilder;
///
/// let mut builder = TransducerBuilder::new("q0");
/// builder.add_state("q0").unwrap();
/// builder.add_final_state("q_tag").unwrap();
/// builder.add_transition("q0", r"#\w+", "q_tag", Some("HASHTAG")).unwrap();
/// let fst = builder.build().unwrap();
///
/// let out = fst.run(&["olá", "#rust"]);
/// assert_eq!(out[0].as_pair(), ("#rust", "HASHTAG"));
/// ```
#[derive(Debug, Clone)]
pub struct TransducerBuilder {
    table: TransitionTable,
    initial: StateId,
}

impl TransducerBuilder {
    /// Builder vazio; o estado inicial precisa ser registrado antes de `build`.
    pub fn new(initial: impl Into<StateId>) -> Self {
        Self {
            table: TransitionTable::new(),
            initial: initial.into(),
        }
    }

    /// Builder pré-carregado com o conjunto padrão.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::from_definitions(&EntityDefinitions::default_set())
    }

    pub fn from_definitions(defs: &EntityDefinitions) -> Result<Self, ConfigError> {
        let initial = defs
            .initial_state
            .as_deref()
            .unwrap_or(DEFAULT_INITIAL_STATE);
        let mut builder = Self::new(initial);
        builder.extend(defs)?;
        Ok(builder)
    }

    /// Continua a construção a partir de um transdutor existente (que não é alterado).
    pub fn from_transducer(fst: &Transducer) -> Self {
        Self {
            table: fst.to_table(),
            initial: fst.initial_state().clone(),
        }
    }

    /// Aplica um conjunto de definições. Se qualquer definição for inválida,
    /// retorna o erro e a tabela permanece exatamente como estava.
    pub fn extend(&mut self, defs: &EntityDefinitions) -> Result<&mut Self, ConfigError> {
        let mut staged = self.table.clone();
        if let Err(err) = apply_definitions(&mut staged, defs) {
            warn!(kind = err.kind(), error = %err, "definições rejeitadas");
            return Err(err);
        }
        self.table = staged;
        debug!(
            states = defs.states.len(),
            transitions = defs.transitions.len(),
            "definições aplicadas"
        );
        Ok(self)
    }

    pub fn add_state(&mut self, id: impl Into<StateId>) -> Result<&mut Self, ConfigError> {
        self.table.add_state(id)?;
        Ok(self)
    }

    pub fn add_final_state(&mut self, id: impl Into<StateId>) -> Result<&mut Self, ConfigError> {
        self.table.add_final_state(id)?;
        Ok(self)
    }

    pub fn has_state(&self, id: &str) -> bool {
        self.table.has_state(id)
    }

    pub fn add_transition(
        &mut self,
        from: &str,
        pattern: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<&mut Self, ConfigError> {
        self.table.add_transition(from, pattern, to, label)?;
        Ok(self)
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Congela a tabela em um transdutor imutável.
    pub fn build(self) -> Result<Transducer, ConfigError> {
        Transducer::new(self.table, self.initial)
    }
}

fn apply_definitions(table: &mut TransitionTable, defs: &EntityDefinitions) -> Result<(), ConfigError> {
    for state in &defs.states {
        if state.is_final {
            table.add_final_state(state.name.as_str())?;
        } else {
            table.add_state(state.name.as_str())?;
        }
    }
    for t in &defs.transitions {
        table.add_transition(&t.from, &t.pattern, &t.to, t.label.as_deref())?;
    }
    Ok(())
}

impl Transducer {
    /// Exporta a tabela de volta para o formato declarativo.
    pub fn definitions(&self) -> EntityDefinitions {
        let table = self.table();
        EntityDefinitions {
            initial_state: Some(self.initial_state().to_string()),
            states: table
                .registry()
                .iter()
                .map(|info| StateDef {
                    name: info.id.to_string(),
                    is_final: info.is_final,
                })
                .collect(),
            transitions: table
                .iter()
                .map(|t| TransitionDef {
                    from: t.from.to_string(),
                    pattern: t.pattern.as_str().to_string(),
                    to: t.to.to_string(),
                    label: t.label.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_fst() -> Transducer {
        TransducerBuilder::with_defaults().unwrap().build().unwrap()
    }

    fn recognize(fst: &Transducer, tokens: &[&str]) -> Vec<(String, String)> {
        fst.run(tokens)
            .into_iter()
            .map(|e| (e.text, e.category))
            .collect()
    }

    fn pair(text: &str, category: &str) -> (String, String) {
        (text.to_string(), category.to_string())
    }

    #[test]
    fn test_default_set_loads() {
        let defs = EntityDefinitions::default_set();
        let fst = TransducerBuilder::from_definitions(&defs).unwrap().build().unwrap();
        assert_eq!(fst.initial_state().as_str(), "q0");
        assert_eq!(fst.table().registry().len(), DEFAULT_STATES.len());
        assert_eq!(fst.table().transition_count(), DEFAULT_TRANSITIONS.len());
    }

    #[test]
    fn test_default_set_covers_all_categories() {
        let defs = EntityDefinitions::default_set();
        let mut categories = defs.categories();
        categories.sort();
        assert_eq!(
            categories,
            vec![
                "ADDRESS", "CITY", "DATE", "EMAIL", "NUMBER", "PERSON", "PHONE_NUMBER",
                "POSTALCODE", "PRICE", "URL"
            ]
        );
    }

    #[test]
    fn test_default_person() {
        let fst = default_fst();
        assert_eq!(
            recognize(&fst, &["Kovács", "János", "lakik"]),
            vec![pair("Kovács János", "PERSON")]
        );
        assert!(recognize(&fst, &["Kovács", "lakik"]).is_empty());
    }

    #[test]
    fn test_default_no_entities() {
        let fst = default_fst();
        assert!(recognize(&fst, &["hello", "world"]).is_empty());
    }

    #[test]
    fn test_default_single_token_categories() {
        let fst = default_fst();
        let cases = [
            ("2024.12.10", "DATE"),
            ("10/12/2024", "DATE"),
            ("kovacs.janos@example.com", "EMAIL"),
            ("+36201234567", "PHONE_NUMBER"),
            ("06-30/123-4567", "PHONE_NUMBER"),
            ("https://example.com/path?q=1", "URL"),
            ("www.example.hu", "URL"),
            ("1500Ft", "PRICE"),
            ("$20", "PRICE"),
            ("H-1051", "POSTALCODE"),
            ("Debrecen", "CITY"),
            ("3,14", "NUMBER"),
            ("1.000.000", "NUMBER"),
            ("25%", "NUMBER"),
            ("-7", "NUMBER"),
        ];
        for (token, category) in cases {
            assert_eq!(
                recognize(&fst, &[token]),
                vec![pair(token, category)],
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_default_two_token_price() {
        let fst = default_fst();
        assert_eq!(
            recognize(&fst, &["Ára", "1500", "forint", "volt"]),
            vec![pair("1500 forint", "PRICE")]
        );
        // inteiro sem moeda nem cidade: o span é descartado
        assert!(recognize(&fst, &["1500", "alma"]).is_empty());
    }

    #[test]
    fn test_default_address() {
        let fst = default_fst();
        let tokens = ["1051", "Budapest,", "Kossuth", "Lajos", "utca", "12", "alatt"];
        assert_eq!(
            recognize(&fst, &tokens),
            vec![pair("1051 Budapest, Kossuth Lajos utca 12", "ADDRESS")]
        );
    }

    #[test]
    fn test_extend_adds_categories() {
        let ext = EntityDefinitions::from_json_str(
            r#"{
                "states": [{ "name": "q_iban", "final": true }],
                "transitions": [
                    { "from": "q0", "pattern": "HU\\d{26}", "to": "q_iban", "label": "IBAN" }
                ]
            }"#,
        )
        .unwrap();
        let mut builder = TransducerBuilder::with_defaults().unwrap();
        builder.extend(&ext).unwrap();
        let fst = builder.build().unwrap();
        let iban = "HU42117730161111101800000000";
        assert_eq!(recognize(&fst, &[iban]), vec![pair(iban, "IBAN")]);
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut builder = TransducerBuilder::with_defaults().unwrap();
        let before = builder.table().transition_count();

        let bad = EntityDefinitions {
            initial_state: None,
            states: vec![StateDef {
                name: "q_tag".into(),
                is_final: true,
            }],
            transitions: vec![
                TransitionDef {
                    from: "q0".into(),
                    pattern: r"#\w+".into(),
                    to: "q_tag".into(),
                    label: Some("TAG".into()),
                },
                TransitionDef {
                    from: "q0".into(),
                    pattern: "x".into(),
                    to: "q_missing".into(),
                    label: None,
                },
            ],
        };
        let err = builder.extend(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownState(s) if s == "q_missing"));
        assert!(!builder.has_state("q_tag"));
        assert_eq!(builder.table().transition_count(), before);
    }

    #[test]
    fn test_duplicate_state_in_definitions() {
        let defs = EntityDefinitions::default_set().merge(EntityDefinitions {
            initial_state: None,
            states: vec![StateDef {
                name: "q_email".into(),
                is_final: true,
            }],
            transitions: vec![],
        });
        let err = TransducerBuilder::from_definitions(&defs).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateState(s) if s == "q_email"));
    }

    #[test]
    fn test_invalid_pattern_in_definitions() {
        let json = r#"{
            "initial_state": "q0",
            "states": [{ "name": "q0" }, { "name": "q1" }],
            "transitions": [{ "from": "q0", "pattern": "(unclosed", "to": "q1" }]
        }"#;
        let defs = EntityDefinitions::from_json_str(json).unwrap();
        let err = TransducerBuilder::from_definitions(&defs).unwrap_err();
        assert_eq!(err.kind(), "invalid_pattern");
    }

    #[test]
    fn test_missing_initial_state_fails_on_build() {
        let mut builder = TransducerBuilder::new("start");
        builder.add_state("q0").unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownState(s) if s == "start"));
    }

    #[test]
    fn test_malformed_json() {
        let err = EntityDefinitions::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_missing_file() {
        let err = EntityDefinitions::from_json_file("/nonexistent/definitions.json").unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_export_roundtrip_is_idempotent() {
        let fst = default_fst();
        let exported = fst.definitions();
        assert_eq!(exported, EntityDefinitions::default_set());

        let rebuilt = TransducerBuilder::from_definitions(&exported)
            .unwrap()
            .build()
            .unwrap();
        let tokens = ["Nagy", "Éva", "2024.12.10", "1500", "Ft"];
        assert_eq!(fst.run(&tokens), rebuilt.run(&tokens));
    }

    #[test]
    fn test_extension_between_runs_leaves_original_untouched() {
        let fst = default_fst();
        let mut builder = TransducerBuilder::from_transducer(&fst);
        builder
            .add_final_state("q_hashtag")
            .unwrap()
            .add_transition("q0", r"#\w+", "q_hashtag", Some("HASHTAG"))
            .unwrap();
        let extended = builder.build().unwrap();

        assert!(fst.run(&["#rust"]).is_empty());
        assert_eq!(recognize(&extended, &["#rust"]), vec![pair("#rust", "HASHTAG")]);
    }
}
