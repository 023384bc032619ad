//! # Webcam Tiler
//!
//! カメラ（Raspberry Pi カメラ、USB カメラ、ネットワークカメラ）から静止画を取得し、
//! ズーム可能なタイルピラミッドとして公開するシステム。
//! 取得に失敗し続けた場合はオフライン画像に切り替える
//!
//! このクレートは Domain-Driven Design (DDD) 原則に基づいて設計されており、
//! 以下の層に分かれています：
//!
//! - **Domain Layer**: 取得、画像処理、タイル生成のモデル
//! - **Application Layer**: 更新ユースケースとウェブカメラの管理
//! - **Infrastructure Layer**: カメラデバイス、HTTP、ファイルシステムとの統合
//! - **Interface Layer**: HTTP API とタイルビューア

pub mod application;
pub mod config;
pub mod debug;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

#[cfg(test)]
pub(crate) mod test_helpers;

// 公開API
pub use config::{AppConfig, WebcamSettings};
pub use domain::*;
