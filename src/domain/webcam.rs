//! ウェブカメラ集約
//!
//! 取得元の選択、状態遷移、メタデータを扱うモジュール

pub mod acquisition;
pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

pub use acquisition::*;
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use value_objects::*;
