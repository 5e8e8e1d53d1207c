//! Route handlers.

use crate::SharedState;
use crate::error::GatewayError;
use axum::Json;
use axum::extract::multipart::Multipart;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use relaybot_channels::{TwilioChannel, TwilioRequest, WebReply, WebRequest};
use relaybot_core::error::Error;
use relaybot_core::memory::Exchange;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Transport Bot is running" }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    memory: String,
    database: String,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        memory: state.pipeline.memory().name().to_string(),
        database: state.pipeline.executor().name().to_string(),
    })
}

pub async fn web(
    State(state): State<SharedState>,
    Json(request): Json<WebRequest>,
) -> Result<Json<WebReply>, GatewayError> {
    let reply = state.web.handle(&state.pipeline, request).await?;
    Ok(Json(reply))
}

type Params = Vec<(String, String)>;

pub async fn sms(
    State(state): State<SharedState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<Params>,
    headers: HeaderMap,
    form: Result<Form<Params>, FormRejection>,
) -> Result<Response, GatewayError> {
    let request = twilio_request(raw_query, query, &headers, form);
    twilio_reply(&state.sms, &state, request).await
}

pub async fn whatsapp(
    State(state): State<SharedState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<Params>,
    headers: HeaderMap,
    form: Result<Form<Params>, FormRejection>,
) -> Result<Response, GatewayError> {
    let request = twilio_request(raw_query, query, &headers, form);
    twilio_reply(&state.whatsapp, &state, request).await
}

/// A missing or non-form body is treated as empty; the query string may
/// carry the parameters instead.
fn twilio_request(
    raw_query: Option<String>,
    query: Params,
    headers: &HeaderMap,
    form: Result<Form<Params>, FormRejection>,
) -> TwilioRequest {
    TwilioRequest {
        form: form.map(|Form(f)| f).unwrap_or_default(),
        query,
        raw_query,
        signature: headers
            .get("X-Twilio-Signature")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

async fn twilio_reply(
    channel: &TwilioChannel,
    state: &SharedState,
    request: TwilioRequest,
) -> Result<Response, GatewayError> {
    let reply = channel.handle(&state.pipeline, &request).await?;
    Ok(([(header::CONTENT_TYPE, reply.content_type())], reply.body()).into_response())
}

pub async fn call(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, GatewayError> {
    let mut audio = None;
    let mut caller = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::bad_request(e.body_text()))?
    {
        match field.name() {
            Some("audio") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::bad_request(e.body_text()))?;
                audio = Some(bytes);
            }
            Some("caller") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| GatewayError::bad_request(e.body_text()))?;
                caller = Some(text);
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| GatewayError::bad_request("missing multipart field 'audio'"))?;
    info!(bytes = audio.len(), "Call audio received");

    let reply = state
        .call
        .handle(&state.pipeline, &audio, caller.as_deref())
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, r#"attachment; filename="reply.wav""#),
        ],
        reply.audio,
    )
        .into_response())
}

/// Operator routes need `Authorization: Bearer <gateway.admin_token>` and
/// are refused outright when no token is configured.
fn authorize_operator(state: &SharedState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let Some(admin) = &state.admin else {
        return Err(GatewayError::new(
            StatusCode::FORBIDDEN,
            "admin_disabled",
            "history routes are disabled; set gateway.admin_token",
        ));
    };
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !admin.verify_bearer(authorization) {
        warn!("Rejected operator request with missing or wrong token");
        return Err(GatewayError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ));
    }
    Ok(())
}

pub async fn history(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Exchange>>, GatewayError> {
    authorize_operator(&state, &headers)?;
    let history = state
        .pipeline
        .memory()
        .history(&user_id)
        .await
        .map_err(Error::from)?;
    Ok(Json(history))
}

pub async fn forget(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, GatewayError> {
    authorize_operator(&state, &headers)?;
    let forgotten = state
        .pipeline
        .memory()
        .forget(&user_id)
        .await
        .map_err(Error::from)?;
    info!(user_id = %user_id, forgotten, "History reset");
    Ok(Json(json!({ "forgotten": forgotten })))
}
