//! ドメイン層
//!
//! ビジネスロジックとドメインモデルを含む層

pub mod imaging;
pub mod tiling;
pub mod webcam;
