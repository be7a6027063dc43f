//! WebSocket frame transport
//!
//! Each connection is one detection session. Binary messages carry JPEG
//! frames; every decodable frame is answered with the processed JPEG.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use camera_capture::VideoFrame;
use dms::{DmsError, DrowsinessSession};
use metrics::gauge;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::AppState;

/// Upgrade handler for the widget socket
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: Arc<AppState>) {
    let id = Uuid::new_v4();
    stream_frames(socket, state)
        .instrument(info_span!("session", id = %id))
        .await
}

async fn stream_frames(mut socket: WebSocket, state: Arc<AppState>) {
    let _guard = SessionGuard::new(&state.active_sessions);
    info!("Session started");

    let mut session = DrowsinessSession::new(state.locator.clone(), Arc::clone(&state.emitter));
    let quality = state.capture.jpeg_quality;
    let mut sequence: u32 = 0;

    while let Some(message) = socket.recv().await {
        let bytes = match message {
            Ok(Message::Binary(bytes)) => bytes,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Socket receive failed");
                break;
            }
        };

        let frame_sequence = sequence;
        sequence = sequence.wrapping_add(1);

        let processed = tokio::task::spawn_blocking(move || {
            let reply = process_message(&mut session, &bytes, frame_sequence, quality);
            (session, reply)
        })
        .await;

        let reply = match processed {
            Ok((returned, reply)) => {
                session = returned;
                reply
            }
            Err(e) => {
                error!(error = %e, "Frame task failed");
                break;
            }
        };

        match reply {
            Ok(jpeg) => {
                if let Err(e) = socket.send(Message::Binary(jpeg)).await {
                    debug!(error = %e, "Client went away");
                    break;
                }
            }
            Err(e) => warn!(sequence = frame_sequence, error = %e, "Skipping frame"),
        }
    }

    info!(frames = sequence, "Session ended");
}

/// Decode, analyze and re-encode one client frame
pub fn process_message(
    session: &mut DrowsinessSession,
    bytes: &[u8],
    sequence: u32,
    quality: u8,
) -> Result<Vec<u8>, DmsError> {
    let timestamp_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut frame = VideoFrame::decode(bytes, timestamp_ns, sequence)?;
    session.process_frame(&mut frame, Instant::now())?;
    Ok(frame.encode_jpeg(quality)?)
}

/// Counts a session as active for its lifetime
struct SessionGuard<'a> {
    sessions: &'a AtomicUsize,
}

impl<'a> SessionGuard<'a> {
    fn new(sessions: &'a AtomicUsize) -> Self {
        sessions.fetch_add(1, Ordering::Relaxed);
        gauge!("active_sessions").increment(1.0);
        Self { sessions }
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.sessions.fetch_sub(1, Ordering::Relaxed);
        gauge!("active_sessions").decrement(1.0);
    }
}
