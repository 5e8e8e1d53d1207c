//! HTTP gateway for RelayBot.
//!
//! Hosts one endpoint per channel (`/web`, `/sms`, `/whatsapp`, `/call`)
//! in front of a single shared message pipeline, plus health and
//! history inspection routes.
//!
//! Built on Axum for high performance async HTTP.

pub mod error;
mod handlers;

pub use error::GatewayError;

use axum::extract::{ConnectInfo, DefaultBodyLimit};
use axum::http::{HeaderValue, Method, header};
use axum::response::IntoResponse;
use axum::{
    Router,
    middleware::{self, Next},
    routing::{get, post},
};
use relaybot_channels::{CallChannel, TwilioChannel, WebChannel};
use relaybot_config::{AppConfig, GatewayConfig};
use relaybot_core::speech::{SpeechToText, TextToSpeech};
use relaybot_pipeline::MessagePipeline;
use relaybot_security::AdminToken;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<MessagePipeline>,
    pub web: WebChannel,
    pub sms: TwilioChannel,
    pub whatsapp: TwilioChannel,
    pub call: CallChannel,
    /// Guards `/history`; `None` disables those routes
    pub admin: Option<AdminToken>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire the channel adapters from `config` around `pipeline`.
    pub fn new(
        config: &AppConfig,
        pipeline: Arc<MessagePipeline>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        Self {
            pipeline,
            web: WebChannel::new(config.channel("web")),
            sms: TwilioChannel::sms(config.channel("sms")),
            whatsapp: TwilioChannel::whatsapp(config.channel("whatsapp")),
            call: CallChannel::new(config.channel("call"), &config.speech, stt, tts),
            admin: AdminToken::from_config(config.gateway.admin_token.as_deref()),
        }
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (`[gateway] max_body_bytes`)
/// - In-memory rate limiting per client (`/health` exempt)
/// - CORS for the configured origins
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/web", post(handlers::web))
        .route("/sms", post(handlers::sms))
        .route("/whatsapp", post(handlers::whatsapp))
        .route("/call", post(handlers::call))
        .route(
            "/history/{user_id}",
            get(handlers::history).delete(handlers::forget),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = Arc::new(relaybot_pipeline::build_from_config(&config).await?);
    let speech = Arc::new(relaybot_providers::GoogleSpeechClient::from_config(
        &config.speech,
    ));
    let state = Arc::new(GatewayState::new(
        &config,
        pipeline,
        speech.clone(),
        speech,
    ));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key.
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Evict stale clients once the map grows large
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware.
///
/// Clients are keyed by the first `X-Forwarded-For` address, then
/// `X-Real-IP`, then the peer IP of the connection. Only requests with none
/// of these share the "anonymous" bucket. `/health` is exempt.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let headers = req.headers();
    let client_key = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("X-Real-IP").and_then(|v| v.to_str().ok()))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key, "Rate limit exceeded");
        return GatewayError::rate_limited().into_response();
    }

    next.run(req).await
}
