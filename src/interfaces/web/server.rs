use super::{embedded_assets::WebAssets, get_system_info, get_webcam, list_webcams, update_webcam};
use crate::application::WebcamRegistry;
use crate::config::WebcamSettings;
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// スナップショットの `image` / `preview` と同じ URL でタイルを配信するためのパス
///
/// 外部 URL や空の場合はこのサーバーでは配信しない
pub fn tile_route(tile_location: &str) -> Option<String> {
    if tile_location.starts_with("http://") || tile_location.starts_with("https://") {
        return None;
    }
    let trimmed = tile_location.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

pub fn create_router(
    registry: Arc<WebcamRegistry>,
    tile_location: &str,
    tile_directory: PathBuf,
) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/system/info", get(get_system_info))
        .route("/api/webcams", get(list_webcams))
        .route("/api/webcams/{id}", get(get_webcam))
        .route("/api/webcams/{id}/update", post(update_webcam))
        .with_state(registry);

    match tile_route(tile_location) {
        Some(route) => {
            info!(route = %route, directory = %tile_directory.display(), "Serving tiles");
            app = app.nest_service(&route, ServeDir::new(tile_directory));
        }
        None => warn!(tile_location, "Tiles are not served by this server"),
    }

    app.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .fallback(static_handler)
}

pub async fn create_server(
    host: String,
    port: u16,
    registry: Arc<WebcamRegistry>,
    settings: &WebcamSettings,
) -> anyhow::Result<()> {
    info!("Starting webcam tile server...");

    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    // 最初の取得はサーバーの起動を待たせない
    let _initial_update = registry.spawn_initial_update();

    let app = create_router(
        registry,
        &settings.tile_location,
        settings.tile_directory(),
    );

    let listener = TcpListener::bind(&addr).await?;

    println!("🌐 Web server started successfully!");
    println!("   URL: http://{addr}");
    println!("   Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// 埋め込まれた静的ファイルを提供するハンドラ
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // ルートパスの場合はindex.htmlを提供
    let path = if path.is_empty() { "index.html" } else { path };

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}
