use super::error_response::ErrorResponse;
use super::models::{SystemInfo, UpdateResponse};
use crate::application::WebcamRegistry;
use crate::domain::webcam::{WebcamId, WebcamSnapshot};
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

/// Get system information
pub async fn get_system_info(State(registry): State<Arc<WebcamRegistry>>) -> Json<SystemInfo> {
    Json(SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        uptime_seconds: get_system_uptime(),
        webcams: registry.len(),
    })
}

pub async fn list_webcams(
    State(registry): State<Arc<WebcamRegistry>>,
) -> Json<Vec<WebcamSnapshot>> {
    Json(registry.snapshots().await)
}

pub async fn get_webcam(
    State(registry): State<Arc<WebcamRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<WebcamSnapshot>, ErrorResponse> {
    let snapshot = registry.snapshot(&WebcamId::new(id)).await?;
    Ok(Json(snapshot))
}

/// 外部から更新を要求する。同じカメラの定期更新と重なった場合は順番に実行される
pub async fn update_webcam(
    State(registry): State<Arc<WebcamRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResponse>, ErrorResponse> {
    let id = WebcamId::new(id);
    info!(webcam_id = %id, "Update requested over HTTP");
    let report = registry.update(&id).await?;
    let webcam = registry.snapshot(&id).await?;
    Ok(Json(UpdateResponse { report, webcam }))
}

fn get_system_uptime() -> u64 {
    if let Ok(contents) = std::fs::read_to_string("/proc/uptime")
        && let Some(uptime_str) = contents.split_whitespace().next()
        && let Ok(uptime) = uptime_str.parse::<f64>()
    {
        return uptime as u64;
    }
    0
}
