//! HTTP 처리량 프로브.
//!
//! `ThroughputProbe` 포트 구현. 지정 크기만큼 다운로드/업로드하고
//! 전송 시간으로 bit/s를 계산한다.

use async_trait::async_trait;
use linkwatch_core::config::HttpThroughputConfig;
use linkwatch_core::error::ProbeError;
use linkwatch_core::models::sample::Throughput;
use linkwatch_core::ports::probe::ThroughputProbe;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 다운로드 URL의 바이트 수 자리 표시자
const BYTES_PLACEHOLDER: &str = "{bytes}";

/// 0초 나눗셈 방지용 최소 경과 시간 (초)
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// HTTP 전송 기반 처리량 프로브 — `ThroughputProbe` 포트 구현
pub struct HttpThroughputProbe {
    client: reqwest::Client,
    download_url: String,
    upload_url: String,
    download_bytes: u64,
    upload_bytes: u64,
}

impl HttpThroughputProbe {
    /// 설정과 요청 타임아웃으로 생성
    pub fn new(config: &HttpThroughputConfig, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            download_url: config.download_url.clone(),
            upload_url: config.upload_url.clone(),
            download_bytes: config.download_bytes,
            upload_bytes: config.upload_bytes,
        })
    }

    /// 요청 바이트 수를 채운 다운로드 URL
    fn resolved_download_url(&self) -> String {
        self.download_url
            .replace(BYTES_PLACEHOLDER, &self.download_bytes.to_string())
    }

    /// 다운로드 측정 (bit/s)
    async fn measure_download(&self) -> Result<f64, ProbeError> {
        let url = self.resolved_download_url();
        let started = Instant::now();

        let mut resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Network(format!("다운로드 요청 실패: {e}")))?;
        check_status(&resp, "다운로드")?;

        let mut received: u64 = 0;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ProbeError::Network(format!("다운로드 본문 읽기 실패: {e}")))?
        {
            received += chunk.len() as u64;
        }

        if received == 0 {
            return Err(ProbeError::InvalidOutput(
                "다운로드 응답 본문이 비어 있음".to_string(),
            ));
        }

        let bps = bits_per_second(received, started.elapsed());
        debug!("다운로드 {received} bytes, {bps:.0} bit/s");
        Ok(bps)
    }

    /// 업로드 측정 (bit/s)
    async fn measure_upload(&self) -> Result<f64, ProbeError> {
        let payload = vec![0u8; self.upload_bytes as usize];
        let started = Instant::now();

        let resp = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(|e| ProbeError::Network(format!("업로드 요청 실패: {e}")))?;
        check_status(&resp, "업로드")?;

        // 서버가 본문을 모두 받은 뒤의 응답까지 포함해 측정
        resp.bytes()
            .await
            .map_err(|e| ProbeError::Network(format!("업로드 응답 읽기 실패: {e}")))?;

        let bps = bits_per_second(self.upload_bytes, started.elapsed());
        debug!("업로드 {} bytes, {bps:.0} bit/s", self.upload_bytes);
        Ok(bps)
    }
}

#[async_trait]
impl ThroughputProbe for HttpThroughputProbe {
    async fn measure_throughput(&self) -> Result<Throughput, ProbeError> {
        let download_bps = self.measure_download().await?;
        let upload_bps = self.measure_upload().await?;
        let throughput = Throughput::from_bits_per_second(download_bps, upload_bps);
        info!(
            "처리량 측정: 다운로드 {:.2} Mbps, 업로드 {:.2} Mbps",
            throughput.download_mbps, throughput.upload_mbps
        );
        Ok(throughput)
    }
}

/// 성공 상태 코드 확인
fn check_status(resp: &reqwest::Response, direction: &str) -> Result<(), ProbeError> {
    let status = resp.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ProbeError::Network(format!("{direction} 응답 상태 {status}")))
    }
}

/// 전송량과 경과 시간으로 bit/s 계산
fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    (bytes as f64 * 8.0) / elapsed.as_secs_f64().max(MIN_ELAPSED_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn probe_for(server: &mockito::ServerGuard, download_bytes: u64) -> HttpThroughputProbe {
        let config = HttpThroughputConfig {
            download_url: format!("{}/down", server.url()),
            upload_url: format!("{}/up", server.url()),
            download_bytes,
            upload_bytes: 4_096,
            request_timeout_secs: 5,
        };
        HttpThroughputProbe::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn bits_per_second_math() {
        assert_eq!(bits_per_second(1_000_000, Duration::from_secs(8)), 1_000_000.0);
        assert!(bits_per_second(10, Duration::ZERO).is_finite());
    }

    #[test]
    fn download_url_placeholder_is_filled() {
        let config = HttpThroughputConfig::default();
        let probe = HttpThroughputProbe::new(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(
            probe.resolved_download_url(),
            "https://speed.cloudflare.com/__down?bytes=25000000"
        );
    }

    #[tokio::test]
    async fn measures_both_directions() {
        let mut server = mockito::Server::new_async().await;
        let down = server
            .mock("GET", "/down")
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(vec![7u8; 8_192])
            .create_async()
            .await;
        let up = server
            .mock("POST", "/up")
            .with_status(200)
            .create_async()
            .await;

        let probe = probe_for(&server, 8_192);
        let t = probe.measure_throughput().await.unwrap();

        assert!(t.download_mbps > 0.0);
        assert!(t.upload_mbps > 0.0);
        down.assert_async().await;
        up.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_network_failure() {
        let mut server = mockito::Server::new_async().await;
        let _down = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let probe = probe_for(&server, 1_024);
        assert_matches!(
            probe.measure_throughput().await,
            Err(ProbeError::Network(_))
        );
    }

    #[tokio::test]
    async fn empty_download_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _down = server
            .mock("GET", "/down")
            .with_status(200)
            .create_async()
            .await;

        let probe = probe_for(&server, 1_024);
        assert_matches!(
            probe.measure_throughput().await,
            Err(ProbeError::InvalidOutput(_))
        );
    }

    #[tokio::test]
    async fn upload_rejection_fails_whole_measurement() {
        let mut server = mockito::Server::new_async().await;
        let _down = server
            .mock("GET", "/down")
            .with_status(200)
            .with_body(vec![1u8; 512])
            .create_async()
            .await;
        let _up = server
            .mock("POST", "/up")
            .with_status(413)
            .create_async()
            .await;

        let probe = probe_for(&server, 512);
        assert_matches!(
            probe.measure_throughput().await,
            Err(ProbeError::Network(_))
        );
    }
}
