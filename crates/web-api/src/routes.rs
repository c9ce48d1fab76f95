use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use application::{EditMessageRequest, MessageDto, ParticipantDto, PostMessageRequest};
use domain::MessageKind;

use crate::{error::ApiError, state::AppState};

/// 携带调用方身份的请求头（名称不区分大小写，客户端通常发送 `User`）
pub const USER_HEADER: &str = "user";

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct JoinPayload {
    #[validate(length(min = 1))]
    name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct MessagePayload {
    #[validate(length(min = 1))]
    to: String,
    #[validate(length(min = 1))]
    text: String,
    #[serde(rename = "type")]
    #[validate(custom(function = "user_authored_kind"))]
    kind: MessageKind,
}

fn user_authored_kind(kind: &MessageKind) -> Result<(), ValidationError> {
    if kind.is_user_authored() {
        Ok(())
    } else {
        Err(ValidationError::new("user_authored_kind")
            .with_message("must be message or private_message".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ParticipantsQuery {
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    limit: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(join).get(list_participants))
        .route("/messages", post(post_message).get(list_messages))
        .route("/messages/{id}", put(edit_message).delete(remove_message))
        .route("/status", post(heartbeat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` 表示允许任意来源。
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "忽略无效的 CORS 来源");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn json_body<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    payload
        .validate()
        .map_err(|errors| ApiError::validation(errors.to_string()))?;
    Ok(payload)
}

fn caller(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(USER_HEADER)
        .ok_or_else(|| ApiError::validation(format!("missing {USER_HEADER} header")))?;
    std::str::from_utf8(value.as_bytes())
        .map_err(|_| ApiError::validation(format!("{USER_HEADER} header is not valid UTF-8")))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

fn message_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation("id: invalid message id"))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ParticipantDto>), ApiError> {
    let payload = json_body(payload)?;
    let participant = state.participant_service.join(&payload.name).await?;

    Ok((StatusCode::CREATED, Json(ParticipantDto::from(&participant))))
}

async fn list_participants(
    State(state): State<AppState>,
    params: Result<Query<ParticipantsQuery>, QueryRejection>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let query = query_params(params)?;
    let participants = if query.active {
        state.presence_tracker.list_active().await?
    } else {
        state.participant_service.list().await?
    };

    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let from = caller(&headers)?.to_owned();
    let payload = json_body(payload)?;

    let message = state
        .message_service
        .post(PostMessageRequest {
            from,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let caller = caller(&headers)?;
    let query = query_params(params)?;
    let limit = match query.limit.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::validation("limit: must be a positive integer"))?,
        ),
    };

    let messages = state.message_service.list(caller, limit).await?;
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn edit_message(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<Json<MessageDto>, ApiError> {
    let id = message_id(path)?;
    let caller = caller(&headers)?.to_owned();
    let payload = json_body(payload)?;

    let message = state
        .message_service
        .edit(EditMessageRequest {
            id,
            caller,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok(Json(MessageDto::from(&message)))
}

async fn remove_message(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let id = message_id(path)?;
    let caller = caller(&headers)?;

    state.message_service.remove(id, caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn heartbeat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let caller = caller(&headers)?;
    state.presence_tracker.touch(caller).await?;
    Ok(StatusCode::OK)
}
