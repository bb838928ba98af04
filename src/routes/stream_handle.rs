use axum::extract::ws::{Message, WebSocket};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::app_state::ProjectHandle;

// Points per websocket message
const STREAM_BATCH: usize = 1000;

#[derive(Serialize)]
struct SamplePoint {
    timestamp: Option<NaiveDateTime>,
    value: f64,
}

#[derive(Serialize)]
struct StreamPayload {
    seq: u64,
    points: Vec<SamplePoint>,
    end_flag: bool,
}

/// Stream the project's samples (with timestamps when the project has a
/// timeline) in batches, then an empty message with `end_flag` set.
pub async fn handle_ws_stream(mut socket: WebSocket, project: ProjectHandle, id: Uuid) {
    info!("stream started: {}", id);

    // Copy the series out so the project is not locked while sending
    let (samples, timestamps) = {
        let guard = project.lock().await;
        (guard.samples.clone(), guard.timestamps.clone())
    };

    let mut seq: u64 = 0;

    for (batch_index, batch) in samples.chunks(STREAM_BATCH).enumerate() {
        let offset = batch_index * STREAM_BATCH;
        let points = batch
            .iter()
            .enumerate()
            .map(|(i, &value)| SamplePoint {
                timestamp: timestamps.as_ref().map(|ts| ts[offset + i]),
                value,
            })
            .collect();

        let payload = StreamPayload {
            seq,
            points,
            end_flag: false,
        };

        if !send_json(&mut socket, &payload).await {
            return;
        }
        seq += 1;
    }

    let end_payload = StreamPayload {
        seq,
        points: Vec::new(),
        end_flag: true,
    };
    send_json(&mut socket, &end_payload).await;

    info!("stream finished: {}", id);
}

async fn send_json(socket: &mut WebSocket, payload: &StreamPayload) -> bool {
    let json = match serde_json::to_string(payload) {
        Ok(j) => j,
        Err(e) => {
            error!("json serialize error: {}", e);
            return false;
        }
    };

    if let Err(e) = socket.send(Message::Text(json.into())).await {
        warn!("ws send failed: {}", e);
        return false;
    }
    true
}
