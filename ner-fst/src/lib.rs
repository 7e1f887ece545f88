//! # ner-fst — Reconhecimento de Entidades Nomeadas com Transdutor de Estados Finitos
//!
//! Este crate reconhece entidades (pessoas, datas, e-mails, endereços, preços,
//! telefones, URLs, números...) percorrendo um **transdutor de estados finitos**
//! configurável, cujas transições são disparadas por expressões regulares
//! aplicadas a cada token.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Tokenização** ([`tokenizer`]): divisão por espaços, preservando offsets.
//! 3.  **Configuração** ([`config`]): definições declarativas → tabela de transições.
//! 4.  **Transdutor** ([`engine`]): percorre os tokens e emite entidades rotuladas.
//! 5.  **Saída**: Lista de [`EntitySpan`] (ex: "Kovács János" -> PERSON).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use ner_fst::NerPipeline;
//!
//! let pipeline = NerPipeline::new();
//! let pairs = pipeline.analyze_pairs("Kovács János lakik, írj neki: kovacs.janos@example.com");
//!
//! assert_eq!(pairs[0], ("Kovács János".to_string(), "PERSON".to_string()));
//! assert_eq!(pairs[1], ("kovacs.janos@example.com".to_string(), "EMAIL".to_string()));
//! ```
//!
//! ## Módulos Principais
//!
//! - [`state`] e [`transition`]: o modelo de dados do autômato.
//! - [`engine`]: o algoritmo de travessia.
//! - [`pipeline`]: orquestrador que conecta todos os estágios.

pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod tokenizer;
pub mod transition;

pub use config::{EntityDefinitions, TransducerBuilder};
pub use engine::{EntityMatch, TraceEvent, Transducer};
pub use error::ConfigError;
pub use pipeline::{EntitySpan, NerPipeline, PipelineEvent};
pub use tokenizer::Token;
