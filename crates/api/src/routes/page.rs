//! Demo page hosting the video widget

use std::sync::Arc;

use axum::{extract::State, response::Html};
use camera_capture::CaptureConfig;

use crate::{AppState, WIDGET_KEY};

const PAGE_TEMPLATE: &str = include_str!("../../static/index.html");

/// Fallback when the constraints cannot be serialized
const DEFAULT_CONSTRAINTS_JSON: &str = r#"{"video":true,"audio":false}"#;

/// Fill the page template for the given capture settings
pub fn render_page(capture: &CaptureConfig) -> String {
    let constraints = serde_json::to_string(&capture.constraints)
        .unwrap_or_else(|_| DEFAULT_CONSTRAINTS_JSON.to_string());

    PAGE_TEMPLATE
        .replace("__WIDGET_KEY__", WIDGET_KEY)
        .replace("__MEDIA_CONSTRAINTS__", &constraints)
        .replace("__CAPTURE_WIDTH__", &capture.width.to_string())
        .replace("__CAPTURE_HEIGHT__", &capture.height.to_string())
}

/// Serve the page
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.capture))
}
