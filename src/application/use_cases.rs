pub mod update_webcam;

pub use update_webcam::{UpdateReport, UpdateWebcamUseCase};
