use crate::error::ProbeError;
use crate::monitor::probe::{Probe, ProbeFuture, ProbeReading};
use crate::monitor::snapshot::ENDPOINT_RUNNING;
use std::time::Duration;

/// External health endpoint. Any HTTP response counts as reachable; a JSON
/// body with a string `status` field supplies the reported status.
pub struct HttpProbe {
    name: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

fn status_from_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(String::from))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| ENDPOINT_RUNNING.to_string())
}

impl Probe for HttpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            let transport = |e: reqwest::Error| ProbeError::Transport {
                probe: self.name.clone(),
                message: e.to_string(),
            };
            let response = self
                .client
                .get(&self.url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(transport)?;
            let body = response.text().await.map_err(transport)?;
            Ok(ProbeReading::Status(status_from_body(&body)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::probe::run_probe;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn status_field_is_used_when_present() {
        assert_eq!(status_from_body(r#"{"status":"degraded"}"#), "degraded");
        assert_eq!(status_from_body(r#"{"status":42}"#), "running");
        assert_eq!(status_from_body("OK"), "running");
        assert_eq!(status_from_body(""), "running");
    }

    #[tokio::test]
    async fn structured_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "uptime": 120
            })))
            .mount(&server)
            .await;

        let probe = HttpProbe::new("endpoint", format!("{}/health", server.uri()), Duration::from_secs(5));
        assert_eq!(
            run_probe(&probe).await.unwrap(),
            ProbeReading::Status("healthy".into())
        );
    }

    #[tokio::test]
    async fn unstructured_body_is_running() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let probe = HttpProbe::new("endpoint", server.uri(), Duration::from_secs(5));
        assert_eq!(
            run_probe(&probe).await.unwrap(),
            ProbeReading::Status("running".into())
        );
    }

    #[tokio::test]
    async fn slow_endpoint_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let probe = HttpProbe::new("endpoint", server.uri(), Duration::from_millis(200));
        assert!(run_probe(&probe).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let probe = HttpProbe::new("endpoint", "http://127.0.0.1:1/health", Duration::from_secs(2));
        assert!(matches!(
            run_probe(&probe).await,
            Err(ProbeError::Transport { .. } | ProbeError::Timeout { .. })
        ));
    }
}
