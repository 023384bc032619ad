//! テスト用のヘルパー

use crate::domain::imaging::encode_jpeg;
use crate::domain::webcam::{CaptureBackend, CaptureError, Clock, SourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 単色の JPEG
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    solid_jpeg(width, height, Rgb([255, 0, 0]))
}

pub fn solid_jpeg(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    encode_jpeg(&RgbImage::from_pixel(width, height, color), 95).unwrap()
}

/// 決められた結果を順に返すバックエンド。台本が尽きた後は `fallback` を返す
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<Vec<u8>, CaptureError>>>,
    fallback: Result<Vec<u8>, CaptureError>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<Vec<u8>, CaptureError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Err(CaptureError::DeviceUnavailable("script exhausted".into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing(error: CaptureError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(bytes: Vec<u8>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(bytes),
            calls: AtomicUsize::new(0),
        }
    }

    /// 台本の末尾に結果を追加する
    pub fn push(&self, result: Result<Vec<u8>, CaptureError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureBackend for ScriptedBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Network
    }

    async fn capture_once(&self) -> Result<Vec<u8>, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// 手動で進める時計
pub struct ManualClock(Mutex<DateTime<Local>>);

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, seconds: i64) {
        let mut now = self.0.lock().unwrap();
        *now += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.0.lock().unwrap()
    }
}
