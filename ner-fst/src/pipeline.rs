//! # Pipeline NER — Orquestrador com Eventos Observáveis
//!
//! Conecta o tokenizador ao transdutor e converte as entidades (índices de
//! token) em [`EntitySpan`]s com posições de byte no texto original.
//!
//! Além do modo síncrono, o pipeline pode emitir cada passo do autômato por um
//! canal (`mpsc`), permitindo que o servidor WebSocket mostre o caminho
//! percorrido em tempo real.

use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{EntityDefinitions, TransducerBuilder};
use crate::engine::{EntityMatch, TraceEvent, Transducer};
use crate::error::ConfigError;
use crate::tokenizer::{tokenize, Token};

/// Uma entidade localizada no texto original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Trecho do texto original, do primeiro ao último token da entidade
    pub text: String,
    /// Categoria (ex: "PERSON", "EMAIL")
    pub category: String,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice do último token (inclusivo)
    pub end_token: usize,
    /// Posição de byte inicial no texto original
    pub start: usize,
    /// Posição de byte final no texto original
    pub end: usize,
}

/// Eventos emitidos pelo pipeline durante o processamento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Tokenização concluída.
    TokenizationDone { tokens: Vec<Token>, total: usize },
    /// **Passo 2** (repetido): um passo do transdutor.
    TransducerStep { step: TraceEvent },
    /// **Conclusão**: entidades encontradas e tempo gasto.
    Done {
        entities: Vec<EntitySpan>,
        total_tokens: usize,
        processing_ms: u64,
    },
}

/// O pipeline NER principal: tokenizador + transdutor.
///
/// O transdutor é imutável, então um mesmo pipeline pode ser compartilhado
/// entre threads (ex: via `Arc`) e usado por várias análises simultâneas.
#[derive(Debug, Clone)]
pub struct NerPipeline {
    transducer: Transducer,
}

impl NerPipeline {
    /// Cria o pipeline com o conjunto padrão de definições.
    pub fn new() -> Self {
        let transducer = TransducerBuilder::with_defaults()
            .and_then(TransducerBuilder::build)
            .expect("o conjunto padrão de definições é válido");
        Self { transducer }
    }

    /// Conjunto padrão estendido com definições do chamador.
    /// O conjunto padrão em si não é alterado.
    pub fn with_definitions(extension: &EntityDefinitions) -> Result<Self, ConfigError> {
        let mut builder = TransducerBuilder::with_defaults()?;
        builder.extend(extension)?;
        let transducer = builder.build()?;
        info!(
            states = transducer.table().registry().len(),
            transitions = transducer.table().transition_count(),
            "pipeline configurado com definições estendidas"
        );
        Ok(Self { transducer })
    }

    pub fn from_transducer(transducer: Transducer) -> Self {
        Self { transducer }
    }

    pub fn transducer(&self) -> &Transducer {
        &self.transducer
    }

    /// Definições atualmente em uso (padrão + extensões)
    pub fn definitions(&self) -> EntityDefinitions {
        self.transducer.definitions()
    }

    /// Processa o texto de forma síncrona e retorna as entidades em ordem de ocorrência.
    pub fn analyze(&self, text: &str) -> Vec<EntitySpan> {
        let tokens = tokenize(text);
        let token_texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let matches = self.transducer.run(&token_texts);
        let entities = to_spans(&matches, &tokens, text);
        debug!(tokens = tokens.len(), entities = entities.len(), "texto analisado");
        entities
    }

    /// Apenas os pares `(texto, categoria)`, com o texto formado pelos tokens
    /// unidos por espaço.
    pub fn analyze_pairs(&self, text: &str) -> Vec<(String, String)> {
        let tokens = tokenize(text);
        let token_texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        self.transducer
            .run(&token_texts)
            .into_iter()
            .map(|m| (m.text, m.category))
            .collect()
    }

    /// Analisa vários textos em paralelo sobre o mesmo transdutor.
    pub fn analyze_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Vec<EntitySpan>> {
        texts
            .par_iter()
            .map(|text| self.analyze(text.as_ref()))
            .collect()
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `TokenizationDone`: tokens gerados.
    /// 2. `TransducerStep` (loop): cada passo do autômato.
    /// 3. `Done`: resultado final.
    ///
    /// Se o receptor for descartado no meio do caminho, os eventos restantes são ignorados.
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        let tokens = tokenize(text);
        let total = tokens.len();
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: tokens.clone(),
            total,
        });

        let token_texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let matches = self.transducer.run_traced(&token_texts, |step| {
            let _ = tx.send(PipelineEvent::TransducerStep { step });
        });

        let entities = to_spans(&matches, &tokens, text);
        let _ = tx.send(PipelineEvent::Done {
            entities,
            total_tokens: total,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }
}

impl Default for NerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Converte as entidades do transdutor (índices de token) em spans do texto original.
fn to_spans(matches: &[EntityMatch], tokens: &[Token], original_text: &str) -> Vec<EntitySpan> {
    matches
        .iter()
        .filter_map(|m| {
            let first = tokens.get(m.start_token)?;
            let last = tokens.get(m.end_token)?;
            Some(EntitySpan {
                text: original_text[first.start..last.end].to_string(),
                category: m.category.clone(),
                start_token: m.start_token,
                end_token: m.end_token,
                start: first.start,
                end: last.end,
            })
        })
        .collect()
}
