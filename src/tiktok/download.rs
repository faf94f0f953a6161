use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::utils::http::get_http_client;

#[derive(Debug, thiserror::Error)]
pub enum MediaFetchError {
    #[error("media request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("media endpoint returned status {0}")]
    Status(StatusCode),
}

pub async fn fetch_media(url: &str, timeout: Duration) -> Result<Vec<u8>, MediaFetchError> {
    let client = get_http_client();
    let response = client.get(url).timeout(timeout).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(MediaFetchError::Status(status));
    }

    let bytes = response.bytes().await?;
    debug!("Fetched {} bytes from {url}", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_body_bytes_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let bytes = fetch_media(&format!("{}/video", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(bytes, b"mp4-bytes");
    }

    #[tokio::test]
    async fn rejects_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = fetch_media(&format!("{}/video", server.uri()), Duration::from_secs(5)).await;
        assert!(matches!(
            result,
            Err(MediaFetchError::Status(StatusCode::FORBIDDEN))
        ));
    }
}
