//! Servidor web Axum com WebSocket para visualizar o transdutor NER em tempo real
//!
//! Configuração por variáveis de ambiente:
//! - `NER_FST_ADDR`: endereço de escuta (padrão `0.0.0.0:3000`)
//! - `NER_FST_DEFINITIONS`: arquivo JSON com estados/transições extras
//! - `RUST_LOG`: filtro de logs (padrão `info`)

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use ner_fst::{corpus::demo_texts, EntityDefinitions, EntitySpan, NerPipeline, PipelineEvent};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: NerPipeline,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    entities: Vec<EntitySpan>,
    processing_ms: u64,
    total_tokens: usize,
}

/// Configuração do servidor lida do ambiente
struct ServerConfig {
    addr: String,
    definitions: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            addr: std::env::var("NER_FST_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            definitions: std::env::var("NER_FST_DEFINITIONS").ok(),
        }
    }

    fn build_pipeline(&self) -> anyhow::Result<NerPipeline> {
        match &self.definitions {
            Some(path) => {
                let ext = EntityDefinitions::from_json_file(path)?;
                let pipeline = NerPipeline::with_definitions(&ext)
                    .with_context(|| format!("definições inválidas em {}", path))?;
                info!(path = %path, "definições extras carregadas");
                Ok(pipeline)
            }
            None => Ok(NerPipeline::new()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let pipeline = config.build_pipeline()?;
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .route("/config", get(config_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("não foi possível escutar em {}", config.addr))?;
    info!("🚀 Servidor NER-FST iniciado em http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Análise via HTTP POST (sem streaming)
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Texto vazio"})),
        )
            .into_response();
    }

    let result = tokio::task::spawn_blocking(move || {
        let (tx, rx) = std::sync::mpsc::channel();
        state.pipeline.analyze_streaming(&req.text, tx);
        rx.try_iter().find_map(|event| match event {
            PipelineEvent::Done {
                entities,
                total_tokens,
                processing_ms,
            } => Some(AnalyzeResponse {
                entities,
                processing_ms,
                total_tokens,
            }),
            _ => None,
        })
    })
    .await;

    match result {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) | Err(_) => {
            warn!("análise terminou sem evento Done");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(domain, text)| {
            serde_json::json!({
                "domain": domain,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Definições ativas (padrão + extensões) em JSON
async fn config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.definitions())
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe texto, executa o pipeline e envia os passos do autômato
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // Aceita {"text": "..."} ou texto puro
                let text_str = match serde_json::from_str::<AnalyzeRequest>(&text) {
                    Ok(req) => req.text.trim().to_string(),
                    Err(_) => text.trim().to_string(),
                };

                if text_str.is_empty() {
                    continue;
                }

                info!("Analisando via WebSocket: {} chars", text_str.len());

                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let state_for_thread = Arc::clone(&state);

                // O pipeline é síncrono: roda fora do runtime
                let handle = tokio::task::spawn_blocking(move || {
                    state_for_thread.pipeline.analyze_streaming(&text_str, tx);
                });
                if handle.await.is_err() {
                    warn!("tarefa de análise abortada");
                    continue;
                }

                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para animação visual (passo a passo)
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
