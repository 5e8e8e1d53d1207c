//! End-to-end integration tests for the RelayBot pipeline.
//!
//! These tests exercise the full path from an inbound message to the final
//! reply: real prompt building and response parsing, a real SQLite
//! database, conversation memory, and the HTTP gateway. Only the LLM and
//! the speech service are scripted.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use relaybot_config::AppConfig;
use relaybot_core::channel::{ChannelKind, InboundMessage};
use relaybot_core::error::{ProviderError, SpeechError};
use relaybot_core::intent::Intent;
use relaybot_core::memory::ConversationMemory;
use relaybot_core::message::Message;
use relaybot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use relaybot_core::query::QueryExecutor;
use relaybot_core::speech::{SpeechToText, TextToSpeech};
use relaybot_gateway::{GatewayState, build_router};
use relaybot_memory::InMemoryConversationStore;
use relaybot_pipeline::{LlmClassifier, LlmFormatter, MessagePipeline, PromptSet};
use relaybot_query::SqliteExecutor;
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every prompt it was sent.
struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("ScriptedProvider exhausted");
        }
        let text = responses.remove(0);
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

/// Speech stub: a fixed transcript, and "audio" that is the text's bytes.
struct ScriptedSpeech(&'static str);

#[async_trait::async_trait]
impl SpeechToText for ScriptedSpeech {
    async fn transcribe(&self, _audio: &[u8], _language: &str) -> Result<Option<String>, SpeechError> {
        Ok(Some(self.0.to_string()))
    }
}

#[async_trait::async_trait]
impl TextToSpeech for ScriptedSpeech {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>, SpeechError> {
        Ok(text.as_bytes().to_vec())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

async fn transport_db(dir: &tempfile::TempDir) -> Arc<SqliteExecutor> {
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("transport.db").display());
    let db = Arc::new(SqliteExecutor::connect_lazy(&url, 1).unwrap());
    for sql in [
        "CREATE TABLE routes (route_id INTEGER PRIMARY KEY, source_name TEXT, destination_name TEXT)",
        "CREATE TABLE buses (bus_id INTEGER PRIMARY KEY, bus_number TEXT, route_id INTEGER, status TEXT)",
        "INSERT INTO routes VALUES (1, 'Chandigarh', 'Ludhiana'), (2, 'Amritsar', 'Jalandhar')",
        "INSERT INTO buses VALUES (10, 'PB10-21', 1, 'running'), (11, 'PB02-7', 2, 'maintenance')",
    ] {
        db.execute(sql).await.unwrap();
    }
    db
}

fn pipeline(
    provider: Arc<ScriptedProvider>,
    executor: Arc<dyn QueryExecutor>,
    memory: Arc<dyn ConversationMemory>,
) -> MessagePipeline {
    let prompts = Arc::new(PromptSet::default());
    MessagePipeline::new(
        memory,
        Arc::new(LlmClassifier::new(provider.clone(), "mock", prompts.clone())),
        executor,
        Arc::new(LlmFormatter::new(provider, "mock", prompts)),
    )
}

const BUS_QUERY: &str = "```json\n{\"intent\": \"Query\", \"language\": \"en-IN\", \"reply\": \"SELECT b.bus_number, b.status FROM buses b JOIN routes r ON r.route_id = b.route_id WHERE r.source_name LIKE '%Chandigarh%'\"}\n```";

// ── E2E: Data questions ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_data_question_queries_sqlite_and_narrates() {
    let dir = tempfile::tempdir().unwrap();
    let db = transport_db(&dir).await;
    let provider = Arc::new(ScriptedProvider::new(&[
        BUS_QUERY,
        "**Bus PB10-21** is running on the Chandigarh route.",
    ]));
    let memory = Arc::new(InMemoryConversationStore::default());
    let p = pipeline(provider.clone(), db, memory.clone());

    let turn = p
        .process(&InboundMessage::new(
            "+919876543210",
            "Which bus goes from Chandigarh?",
            ChannelKind::Sms,
        ))
        .await
        .expect("turn should succeed");

    assert_eq!(turn.intent, Intent::Query);
    assert_eq!(turn.reply, "Bus PB10-21 is running on the Chandigarh route.");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Which bus goes from Chandigarh?"));
    assert!(prompts[1].contains(r#"[{"bus_number":"PB10-21","status":"running"}]"#));
    assert!(prompts[1].contains("Language: en-IN"));

    let history = memory.history("+919876543210").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].bot, turn.reply);
}

#[tokio::test]
async fn e2e_clarification_feeds_next_turn() {
    let dir = tempfile::tempdir().unwrap();
    let db = transport_db(&dir).await;
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"intent": "unQuery", "language": "en-IN", "reply": "From which city are you starting?"}"#,
        BUS_QUERY,
        "PB10-21 is on its way.",
    ]));
    let p = pipeline(
        provider.clone(),
        db,
        Arc::new(InMemoryConversationStore::default()),
    );

    let first = p.handle("u1", "next bus?", ChannelKind::Web).await.unwrap();
    assert_eq!(first, "From which city are you starting?");

    let second = p.handle("u1", "Chandigarh", ChannelKind::Web).await.unwrap();
    assert_eq!(second, "PB10-21 is on its way.");

    let prompts = provider.prompts();
    assert!(prompts[1].contains("User: next bus?\nBot: From which city are you starting?"));
}

#[tokio::test]
async fn e2e_bad_sql_gets_apology() {
    let dir = tempfile::tempdir().unwrap();
    let db = transport_db(&dir).await;
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"intent": "Query", "language": "en-IN", "reply": "SELECT * FROM timetable"}"#,
    ]));
    let memory = Arc::new(InMemoryConversationStore::default());
    let p = pipeline(provider.clone(), db, memory.clone());

    let reply = p.handle("u1", "timetable?", ChannelKind::Web).await.unwrap();
    assert!(reply.starts_with("Sorry, I could not find that information"));
    assert_eq!(provider.prompts().len(), 1);
    assert_eq!(memory.history("u1").await.unwrap()[0].bot, reply);
}

#[tokio::test]
async fn e2e_prose_from_classifier_is_reported() {
    let provider = Arc::new(ScriptedProvider::new(&["Sure! The next bus leaves soon."]));
    let p = pipeline(
        provider.clone(),
        Arc::new(relaybot_query::UnconfiguredExecutor),
        Arc::new(InMemoryConversationStore::default()),
    );

    let turn = p
        .process(&InboundMessage::new("u1", "hi", ChannelKind::Web))
        .await
        .unwrap();
    assert_eq!(turn.intent, Intent::Error);
    assert_eq!(turn.language, "en-IN");
    assert!(turn.reply.starts_with("Error: "));
    assert_eq!(provider.prompts().len(), 1);
}

// ── E2E: Gateway ─────────────────────────────────────────────────────────

fn gateway(p: MessagePipeline, transcript: &'static str) -> axum::Router {
    let config = AppConfig::default();
    let speech = Arc::new(ScriptedSpeech(transcript));
    let state = Arc::new(GatewayState::new(&config, Arc::new(p), speech.clone(), speech));
    build_router(state, &config.gateway)
}

#[tokio::test]
async fn e2e_whatsapp_webhook_answers_in_twiml() {
    let dir = tempfile::tempdir().unwrap();
    let db = transport_db(&dir).await;
    let provider = Arc::new(ScriptedProvider::new(&[
        BUS_QUERY,
        "Bus PB10-21 is running.",
    ]));
    let memory = Arc::new(InMemoryConversationStore::default());
    let app = gateway(pipeline(provider, db, memory.clone()), "unused");

    let req = Request::builder()
        .method("POST")
        .uri("/whatsapp")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(
            "From=whatsapp%3A%2B919876543210&Body=bus+from+Chandigarh%3F",
        ))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("<Message>Bus PB10-21 is running.</Message>"));
    assert_eq!(memory.history("+919876543210").await.unwrap().len(), 1);
}

#[tokio::test]
async fn e2e_call_round_trip() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"intent": "other", "language": "pa-IN", "reply": "Sat Sri Akal ji!"}"#,
    ]));
    let memory = Arc::new(InMemoryConversationStore::default());
    let app = gateway(
        pipeline(provider, Arc::new(relaybot_query::UnconfiguredExecutor), memory.clone()),
        "sat sri akal",
    );

    let boundary = "e2e-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"call.wav\"\r\nContent-Type: audio/wav\r\n\r\nRIFF0000WAVE\r\n--{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/call")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    let audio = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&audio[..], b"Sat Sri Akal ji!");

    let history = memory.history("call_user").await.unwrap();
    assert_eq!(history[0].user, "sat sri akal");
}

// ── E2E: Configuration ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_wires_sqlite_memory_and_database() {
    let dir = tempfile::tempdir().unwrap();
    let memory_path = dir.path().join("memory.db");
    let db_path = dir.path().join("transport.db");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
api_key = "test-key"

[memory]
backend = "sqlite"
capacity = 3
path = "{}"

[database]
url = "sqlite:{}?mode=rwc"
read_only = true

[pipeline]
on_failure = "propagate"
"#,
            memory_path.display(),
            db_path.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load_from(&config_path).unwrap();
    let p = relaybot_pipeline::build_from_config(&config).await.unwrap();

    assert_eq!(p.memory().name(), "sqlite");
    assert_eq!(p.memory().capacity(), 3);
    assert_eq!(p.executor().name(), "sqlite");
    assert!(p.executor().execute("DELETE FROM buses").await.is_err());
    assert!(p.executor().health_check().await.unwrap());
}

#[tokio::test]
async fn e2e_sqlite_memory_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.memory.backend = "sqlite".into();
    config.memory.path = Some(dir.path().join("memory.db").display().to_string());

    {
        let memory = relaybot_memory::build_from_config(&config.memory).await.unwrap();
        let provider = Arc::new(ScriptedProvider::new(&[
            r#"{"intent": "other", "language": "en-IN", "reply": "Hello!"}"#,
        ]));
        let p = pipeline(provider, Arc::new(relaybot_query::UnconfiguredExecutor), memory);
        p.handle("u1", "hi", ChannelKind::Web).await.unwrap();
    }

    let memory = relaybot_memory::build_from_config(&config.memory).await.unwrap();
    assert_eq!(memory.context_for("u1").await.unwrap(), "User: hi\nBot: Hello!");
}
