//! インフラストラクチャ層
//!
//! カメラデバイス、ネットワーク、ファイルシステムとの統合

pub mod capture;
pub mod clock;
pub mod storage;
