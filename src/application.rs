//! アプリケーション層
//!
//! ウェブカメラの更新ユースケースと、設定済みウェブカメラの管理

pub mod registry;
pub mod use_cases;

pub use registry::WebcamRegistry;
pub use use_cases::{UpdateReport, UpdateWebcamUseCase};
