use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::status_for;
use crate::api::state::AppState;
use crate::application::{AgentReply, AnswerSource};
use crate::domain::{AudioClip, AudioInput, MessageRole, SpeechAudio};

/// Upload size limit for spoken questions.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AudioPayload {
    pub mime_type: String,
    /// Base64 encoded.
    pub data: String,
}

impl From<SpeechAudio> for AudioPayload {
    fn from(audio: SpeechAudio) -> Self {
        Self {
            mime_type: audio.format.mime_type().to_string(),
            data: STANDARD.encode(&audio.bytes),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub query: String,
    pub answer: String,
    pub source: AnswerSource,
    pub turn_id: Option<u64>,
    pub audio: Option<AudioPayload>,
}

impl From<AgentReply> for AskResponse {
    fn from(reply: AgentReply) -> Self {
        Self {
            query: reply.query,
            answer: reply.answer,
            source: reply.source,
            turn_id: reply.turn_id,
            audio: reply.audio.map(AudioPayload::from),
        }
    }
}

async fn record_turn(state: &AppState, reply: &AgentReply) {
    let mut transcript = state.transcript.write().await;
    transcript.add_message(MessageRole::User, &reply.query);
    transcript.add_message(MessageRole::Agent, &reply.answer);
}

async fn session_history(state: &AppState) -> String {
    state.transcript.read().await.format_history()
}

pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, StatusCode> {
    let history = session_history(&state).await;
    let reply = state
        .agent
        .answer_with_history(&request.query, &history)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to answer query");
            status_for(&e)
        })?;

    record_turn(&state, &reply).await;
    Ok(Json(AskResponse::from(reply)))
}

/// Accepts a multipart form with the recording in an `audio` field.
pub async fn ask_voice_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AskResponse>, StatusCode> {
    let mut clip = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.wav").to_string();
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        clip = Some(AudioClip {
            bytes: bytes.to_vec(),
            file_name,
        });
    }
    let clip = clip.ok_or(StatusCode::BAD_REQUEST)?;

    let history = session_history(&state).await;
    let reply = state
        .agent
        .answer_audio_with_history(AudioInput::Clip(clip), &history)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to answer spoken query");
            status_for(&e)
        })?;

    record_turn(&state, &reply).await;
    Ok(Json(AskResponse::from(reply)))
}
