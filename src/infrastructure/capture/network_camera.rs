use crate::domain::webcam::{CaptureBackend, CaptureError, NetworkAuth, SourceKind, WebcamError};
use async_trait::async_trait;
use reqwest::{Client, Request};
use std::time::Duration;
use tracing::{debug, instrument};

/// HTTP(S) で静止画を取得するカメラ
#[derive(Debug, Clone)]
pub struct NetworkCameraBackend {
    client: Client,
    url: String,
    auth: NetworkAuth,
}

impl NetworkCameraBackend {
    pub fn new(url: String, auth: NetworkAuth, timeout: Duration) -> Result<Self, WebcamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebcamError::InvalidConfiguration(format!("HTTP client: {e}")))?;
        Ok(Self { client, url, auth })
    }

    /// 認証情報は URL から外し、Authorization ヘッダーで送る
    pub fn build_request(&self) -> Result<Request, CaptureError> {
        let builder = match &self.auth {
            NetworkAuth::None => self.client.get(&self.url),
            NetworkAuth::Basic { username, password } => {
                self.client.get(&self.url).basic_auth(username, Some(password))
            }
            NetworkAuth::Malformed(_) => {
                return Err(CaptureError::NetworkFailure(
                    "Credentials in location are not in user:password form".to_string(),
                ));
            }
        };
        builder
            .build()
            .map_err(|e| CaptureError::NetworkFailure(e.to_string()))
    }
}

#[async_trait]
impl CaptureBackend for NetworkCameraBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Network
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn capture_once(&self) -> Result<Vec<u8>, CaptureError> {
        let request = self.build_request()?;
        let response = self
            .client
            .execute(request)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CaptureError::NetworkFailure(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CaptureError::NetworkFailure(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CaptureError::NetworkFailure("Empty response body".to_string()));
        }

        debug!(bytes = bytes.len(), "Downloaded image");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webcam::WebcamSource;
    use crate::test_helpers::jpeg_bytes;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use reqwest::header::AUTHORIZATION;

    fn backend(location: &str) -> NetworkCameraBackend {
        let WebcamSource::Network { url, auth } = WebcamSource::parse(location).unwrap() else {
            panic!("not a network location");
        };
        NetworkCameraBackend::new(url, auth, Duration::from_secs(5)).unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{address}")
    }

    #[test]
    fn test_credentials_move_to_header() {
        let request = backend("http://user:pw@cam.local/snap.jpg")
            .build_request()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://cam.local/snap.jpg");
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwdw=="
        );
    }

    #[test]
    fn test_no_credentials_no_header() {
        let request = backend("https://cam.local/snap.jpg").build_request().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_malformed_credentials_fail_at_capture() {
        let err = backend("http://useronly@cam.local/snap.jpg")
            .build_request()
            .unwrap_err();
        assert!(matches!(err, CaptureError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_download_image() {
        let body = jpeg_bytes(32, 32);
        let expected = body.clone();
        let base = serve(Router::new().route("/snap.jpg", get(move || async move { body }))).await;

        let bytes = backend(&format!("{base}/snap.jpg"))
            .capture_once()
            .await
            .unwrap();
        assert_eq!(bytes, expected);
    }

    #[tokio::test]
    async fn test_http_error_is_network_failure() {
        let base = serve(Router::new().route(
            "/snap.jpg",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        let err = backend(&format!("{base}/snap.jpg"))
            .capture_once()
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let err = backend("http://127.0.0.1:9/snap.jpg")
            .capture_once()
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::NetworkFailure(_)));
    }
}
