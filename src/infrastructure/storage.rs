//! タイルの保存先

pub mod file_tile_repository;
pub mod in_memory_tile_repository;

pub use file_tile_repository::FileTileRepository;
pub use in_memory_tile_repository::InMemoryTileRepository;
