//! 外部コマンドによるフレーム取得
//!
//! カメラを開くコマンドを子プロセスとして実行し、標準出力を1フレームとして受け取る。
//! 子プロセスは `kill_on_drop` で起動するので、タイムアウトやキャンセルでも
//! デバイスが開いたまま残らない

use crate::domain::webcam::CaptureError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// ウォームアップ以外にコマンドへ許す時間
pub const CAPTURE_GRACE: Duration = Duration::from_secs(10);

/// デバイスの使用開始と終了をログに残すガード
///
/// デバイスの解放は子プロセスの `kill_on_drop` が行う。このガードはどの経路で戻っても
/// 終了のログが出るようにするだけ
#[derive(Debug)]
struct DeviceUseLog {
    device: String,
}

impl DeviceUseLog {
    fn start(device: &str) -> Self {
        debug!(device, "Opened capture device");
        Self {
            device: device.to_string(),
        }
    }
}

impl Drop for DeviceUseLog {
    fn drop(&mut self) {
        debug!(device = %self.device, "Released capture device");
    }
}

/// コマンドを実行し、成功時の標準出力を返す
pub async fn run_capture(
    program: &str,
    args: &[String],
    device: &str,
    limit: Duration,
) -> Result<Vec<u8>, CaptureError> {
    let _use_log = DeviceUseLog::start(device);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            CaptureError::DeviceUnavailable(format!("Failed to start {program}: {e}"))
        })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| {
            CaptureError::DeviceUnavailable(format!("Failed to read from {program}: {e}"))
        })?,
        Err(_) => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{program} did not finish within {}s",
                limit.as_secs_f32()
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::DeviceUnavailable(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    if output.stdout.is_empty() {
        return Err(CaptureError::DeviceUnavailable(format!(
            "{program} produced no frame"
        )));
    }

    debug!(device, bytes = output.stdout.len(), "Captured frame");
    Ok(output.stdout)
}
