//! # Motor do Transdutor
//!
//! Percorre a sequência de tokens uma única vez, da esquerda para a direita,
//! mantendo um **estado atual** e um **span pendente** (tokens já consumidos de
//! uma entidade que ainda não foi fechada).
//!
//! ## Algoritmo
//!
//! Para cada token:
//! 1. Testa as transições do estado atual, em ordem de registro.
//! 2. **Casou**: o token entra no span pendente e a máquina vai para o destino.
//!    Se a transição tem rótulo, o span é emitido como entidade e a máquina
//!    volta ao estado inicial.
//! 3. **Não casou** fora do estado inicial: a entidade em construção foi
//!    interrompida. O span pendente é descartado (nunca vira saída parcial), a
//!    máquina volta ao estado inicial e o **mesmo** token é testado de novo, uma
//!    única vez.
//! 4. **Não casou** no estado inicial: o token é texto comum e é ignorado.
//!
//! Ao final da entrada, um span pendente sem rótulo também é descartado.
//!
//! ## Exemplo
//!
//! ```text
//! tokens:  Kovács      János        lakik
//! estado:  q0 → q_person → q_person_last[PERSON] → q0 → (sem transição)
//! saída:   ("Kovács János", PERSON)
//! ```
//!
//! Cada passo pode ser observado via [`TraceEvent`], o que permite que a
//! interface web mostre o caminho percorrido pelo autômato.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::state::StateId;
use crate::transition::{Transition, TransitionTable};

/// Uma entidade reconhecida: o texto (tokens unidos por espaço) e sua categoria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub text: String,
    pub category: String,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice do último token (inclusivo)
    pub end_token: usize,
}

impl EntityMatch {
    /// Par `(texto, categoria)`
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.text, &self.category)
    }
}

/// Passos observáveis de uma execução do transdutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TraceEvent {
    /// Uma transição casou com o token.
    TransitionFired {
        token_index: usize,
        token: String,
        from: StateId,
        to: StateId,
        label: Option<String>,
    },
    /// Uma transição rotulada fechou o span pendente.
    EntityEmitted { entity: EntityMatch },
    /// O span pendente foi descartado sem ser emitido.
    /// `at_end` indica que a entrada acabou antes de a entidade ser fechada.
    SpanDiscarded {
        tokens: Vec<String>,
        state: StateId,
        at_end: bool,
    },
    /// O token será testado novamente a partir do estado inicial.
    Retried { token_index: usize, token: String },
    /// Nenhuma transição do estado inicial casou; o token não faz parte de entidade.
    TokenSkipped { token_index: usize, token: String },
}

/// Contexto transitório de uma execução. Criado por chamada, nunca compartilhado.
struct RunState {
    current: usize,
    index: usize,
    pending: Vec<String>,
    pending_start: usize,
    output: Vec<EntityMatch>,
    match_steps: usize,
}

impl RunState {
    fn new(initial: usize) -> Self {
        Self {
            current: initial,
            index: 0,
            pending: Vec::new(),
            pending_start: 0,
            output: Vec::new(),
            match_steps: 0,
        }
    }
}

/// Transdutor pronto para uso: tabela imutável + estado inicial.
///
/// É `Send + Sync`; várias execuções podem usar o mesmo transdutor ao mesmo
/// tempo, pois todo o estado de execução vive em cada chamada.
#[derive(Debug, Clone)]
pub struct Transducer {
    table: TransitionTable,
    initial: StateId,
    initial_slot: usize,
}

impl Transducer {
    /// Congela a tabela. Falha se o estado inicial não estiver registrado.
    pub fn new(table: TransitionTable, initial: impl Into<StateId>) -> Result<Self, ConfigError> {
        let initial = initial.into();
        let initial_slot = table
            .registry()
            .slot(initial.as_str())
            .ok_or_else(|| ConfigError::UnknownState(initial.to_string()))?;
        Ok(Self {
            table,
            initial,
            initial_slot,
        })
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn initial_state(&self) -> &StateId {
        &self.initial
    }

    /// Devolve a tabela para extensão (copy-on-write: o transdutor atual não muda).
    pub fn to_table(&self) -> TransitionTable {
        self.table.clone()
    }

    /// Reconhece as entidades da sequência de tokens.
    pub fn run<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<EntityMatch> {
        self.run_traced(tokens, |_| {})
    }

    /// Igual a [`Transducer::run`], reportando cada passo ao observador.
    pub fn run_traced<S, F>(&self, tokens: &[S], observe: F) -> Vec<EntityMatch>
    where
        S: AsRef<str>,
        F: FnMut(TraceEvent),
    {
        self.execute(tokens, observe).output
    }

    fn execute<S, F>(&self, tokens: &[S], mut observe: F) -> RunState
    where
        S: AsRef<str>,
        F: FnMut(TraceEvent),
    {
        let mut run = RunState::new(self.initial_slot);

        while run.index < tokens.len() {
            let token = tokens[run.index].as_ref();

            run.match_steps += 1;
            if let Some(transition) = self.first_match(run.current, token) {
                self.fire(&mut run, transition, token, &mut observe);
                continue;
            }

            if run.current != self.initial_slot {
                self.discard_pending(&mut run, false, &mut observe);
                observe(TraceEvent::Retried {
                    token_index: run.index,
                    token: token.to_string(),
                });

                run.match_steps += 1;
                if let Some(transition) = self.first_match(run.current, token) {
                    self.fire(&mut run, transition, token, &mut observe);
                    continue;
                }
            }

            observe(TraceEvent::TokenSkipped {
                token_index: run.index,
                token: token.to_string(),
            });
            run.index += 1;
        }

        if !run.pending.is_empty() {
            self.discard_pending(&mut run, true, &mut observe);
        }

        debug!(
            tokens = tokens.len(),
            match_steps = run.match_steps,
            entities = run.output.len(),
            "execução do transdutor concluída"
        );
        run
    }

    fn first_match(&self, slot: usize, token: &str) -> Option<&Transition> {
        self.table
            .transitions_at(slot)
            .iter()
            .find(|t| t.matches(token))
    }

    fn fire<F: FnMut(TraceEvent)>(
        &self,
        run: &mut RunState,
        transition: &Transition,
        token: &str,
        observe: &mut F,
    ) {
        // O destino foi validado no registro da transição; se não existir, a tabela está corrompida.
        assert!(
            self.table.registry().info(transition.to_slot).is_some(),
            "transição aponta para estado inexistente: {}",
            transition
        );

        if run.pending.is_empty() {
            run.pending_start = run.index;
        }
        run.pending.push(token.to_string());
        run.current = transition.to_slot;

        observe(TraceEvent::TransitionFired {
            token_index: run.index,
            token: token.to_string(),
            from: transition.from.clone(),
            to: transition.to.clone(),
            label: transition.label.clone(),
        });

        if let Some(label) = &transition.label {
            let entity = EntityMatch {
                text: run.pending.join(" "),
                category: label.clone(),
                start_token: run.pending_start,
                end_token: run.index,
            };
            observe(TraceEvent::EntityEmitted {
                entity: entity.clone(),
            });
            run.output.push(entity);
            run.pending.clear();
            run.current = self.initial_slot;
        }

        run.index += 1;
    }

    fn discard_pending<F: FnMut(TraceEvent)>(&self, run: &mut RunState, at_end: bool, observe: &mut F) {
        let state = self
            .table
            .registry()
            .info(run.current)
            .map(|info| info.id.clone())
            .unwrap_or_else(|| self.initial.clone());
        observe(TraceEvent::SpanDiscarded {
            tokens: std::mem::take(&mut run.pending),
            state,
            at_end,
        });
        run.current = self.initial_slot;
    }

    /// Listagem legível de estados e transições
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Transducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Estado inicial: {}", self.initial)?;
        writeln!(f, "Estados ({}):", self.table.registry().len())?;
        for info in self.table.registry().iter() {
            let marker = if info.is_final { " (final)" } else { "" };
            writeln!(f, "  {}{}", info.id, marker)?;
        }
        writeln!(f, "Transições ({}):", self.table.transition_count())?;
        for transition in self.table.iter() {
            writeln!(f, "  {}", transition)?;
        }
        Ok(())
    }
}
