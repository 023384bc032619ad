//! Web インターフェース
//!
//! ウェブカメラのメタデータ参照と手動更新の HTTP API、タイル画像の配信、
//! 埋め込みのタイルビューアを提供します。

mod embedded_assets;
mod error_response;
mod handlers;
mod models;

pub mod server;

pub(crate) use handlers::{get_system_info, get_webcam, list_webcams, update_webcam};
