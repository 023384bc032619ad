//! ウェブカメラ集約の値オブジェクト
//!
//! 識別子、取得元ロケーション、回転、解像度、状態を定義

use crate::domain::webcam::errors::WebcamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// オンデバイスカメラを示すロケーション文字列
pub const LOCAL_CAMERA_LOCATION: &str = "rpicam";
/// USB/V4L デバイスのロケーション接頭辞
pub const USB_DEVICE_PREFIX: &str = "/dev/video";

/// ウェブカメラID
///
/// 明示的に与えられない場合はロケーション文字列の MD5 から導出する
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebcamId(String);

impl WebcamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// ロケーション文字列から決定的にIDを導出
    pub fn derive(location: &str) -> Self {
        Self(format!("{:x}", md5::compute(location.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebcamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WebcamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// 取得元の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[serde(rename = "rpicam")]
    LocalCamera,
    Usb,
    #[serde(rename = "online")]
    Network,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LocalCamera => "rpicam",
            Self::Usb => "usb",
            Self::Network => "online",
        };
        f.write_str(name)
    }
}

/// ネットワークカメラの認証情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkAuth {
    None,
    Basic { username: String, password: String },
    /// `user:pass@` の形式になっていない認証部分。取得時に失敗として扱う
    Malformed(String),
}

/// 取得元
///
/// ロケーション文字列から設定時に一度だけ選択される
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebcamSource {
    LocalCamera,
    UsbDevice { index: u32 },
    Network { url: String, auth: NetworkAuth },
}

impl WebcamSource {
    /// ロケーション文字列を解析（大文字小文字を区別）
    ///
    /// http(s) の `user:pass@` はホスト部にある場合だけ認証情報として取り出す。
    /// '/' を含む認証情報は認識せず、ロケーションをそのまま URL として使う
    pub fn parse(location: &str) -> Result<Self, WebcamError> {
        if location == LOCAL_CAMERA_LOCATION {
            return Ok(Self::LocalCamera);
        }

        if let Some(suffix) = location.strip_prefix(USB_DEVICE_PREFIX) {
            let index = suffix
                .parse::<u32>()
                .map_err(|_| WebcamError::UnsupportedLocation(location.to_string()))?;
            return Ok(Self::UsbDevice { index });
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Self::parse_network(location));
        }

        Err(WebcamError::UnsupportedLocation(location.to_string()))
    }

    fn parse_network(location: &str) -> Self {
        let Some(scheme_end) = location.find("://").map(|i| i + 3) else {
            return Self::Network {
                url: location.to_string(),
                auth: NetworkAuth::None,
            };
        };

        // 認証部分はホスト部（最初の '/' より前）にのみ存在する
        let authority_end = location[scheme_end..]
            .find('/')
            .map(|i| scheme_end + i)
            .unwrap_or(location.len());
        let Some(at) = location[scheme_end..authority_end].rfind('@') else {
            return Self::Network {
                url: location.to_string(),
                auth: NetworkAuth::None,
            };
        };
        let at = scheme_end + at;

        let userinfo = &location[scheme_end..at];
        let url = format!("{}{}", &location[..scheme_end], &location[at + 1..]);
        let auth = match userinfo.split_once(':') {
            Some((username, password)) if !username.is_empty() => NetworkAuth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => NetworkAuth::Malformed(userinfo.to_string()),
        };

        Self::Network { url, auth }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::LocalCamera => SourceKind::LocalCamera,
            Self::UsbDevice { .. } => SourceKind::Usb,
            Self::Network { .. } => SourceKind::Network,
        }
    }
}

/// 画像の回転
///
/// 角度は反時計回り。`h` は上下反転、`v` は左右反転
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0", alias = "none")]
    None,
    #[serde(rename = "90")]
    Rotate90,
    #[serde(rename = "180")]
    Rotate180,
    #[serde(rename = "270")]
    Rotate270,
    #[serde(rename = "h")]
    FlipHorizontal,
    #[serde(rename = "v")]
    FlipVertical,
}

impl Rotation {
    /// 逆変換
    pub fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// 幅と高さが入れ替わるか
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::None => "0",
            Self::Rotate90 => "90",
            Self::Rotate180 => "180",
            Self::Rotate270 => "270",
            Self::FlipHorizontal => "h",
            Self::FlipVertical => "v",
        };
        f.write_str(value)
    }
}

impl FromStr for Rotation {
    type Err = WebcamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "0" | "none" => Ok(Self::None),
            "90" => Ok(Self::Rotate90),
            "180" => Ok(Self::Rotate180),
            "270" => Ok(Self::Rotate270),
            "h" => Ok(Self::FlipHorizontal),
            "v" => Ok(Self::FlipVertical),
            other => Err(WebcamError::InvalidRotation(other.to_string())),
        }
    }
}

/// 解像度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// ウェブカメラの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WebcamState {
    #[default]
    Uninitialized,
    Online,
    Offline,
}

impl WebcamState {
    pub fn is_online(self) -> bool {
        self == Self::Online
    }

    /// 表示用の値。未初期化はオフラインとして表示する
    pub fn as_display(self) -> &'static str {
        if self.is_online() { "online" } else { "offline" }
    }
}

impl fmt::Display for WebcamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_display())
    }
}

impl Serialize for WebcamState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_display())
    }
}
