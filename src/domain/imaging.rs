//! 画像処理
//!
//! デコード、エンコード、回転、タイムスタンプの描画、オフライン画像の生成

pub mod annotation;
pub mod codec;
pub mod font;
pub mod placeholder;

pub use annotation::*;
pub use codec::*;
pub use font::*;
pub use placeholder::*;
