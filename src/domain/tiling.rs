//! タイルピラミッド
//!
//! 画像を正方形キャンバスに配置し、ズームレベルごとに固定サイズのタイルへ分割する

pub mod services;
pub mod value_objects;

pub use services::*;
pub use value_objects::*;
