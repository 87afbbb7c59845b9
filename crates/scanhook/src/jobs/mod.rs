use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    adapters::{ScanRequest, ToolAdapter},
    callback::CallbackClient,
    message,
};

pub async fn run_scan_job(
    scanner: Arc<dyn ToolAdapter>,
    callback: CallbackClient,
    request: ScanRequest,
    response_url: String,
    scan_id: Uuid,
) {
    let target = request.target.clone();
    info!(%scan_id, tool = scanner.name(), host = %target, "scan started");

    let outcome = match scanner.run(request).await {
        Ok(report) => {
            info!(
                %scan_id,
                host = %target,
                hosts = report.hosts.len(),
                "scan completed"
            );
            message::scan_results(&target, &report)
        }
        Err(e) => {
            error!(error = %e, %scan_id, host = %target, "scan failed");
            message::scan_failed(&e)
        }
    };

    debug!(%scan_id, message = ?outcome, "scan message");
    if let Err(e) = callback.post(&response_url, &outcome).await {
        error!(error = %e, %scan_id, "post to response_url failed");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use axum::http::StatusCode;
    use tokio::time::timeout;
    use uuid::Uuid;

    use super::run_scan_job;
    use crate::{
        adapters::{ScanError, ScanRequest, ToolAdapter},
        callback::{tests::spawn_sink, CallbackClient},
        config::AppConfig,
        models::{ResponseType, ScanReport},
        parser::parse_nmap_xml,
    };

    pub(crate) struct FakeScanner {
        pub(crate) xml: Option<&'static str>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeScanner {
        pub(crate) fn succeeding(xml: &'static str) -> Self {
            Self {
                xml: Some(xml),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                xml: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ToolAdapter for FakeScanner {
        fn name(&self) -> &'static str {
            "fake-nmap"
        }

        async fn run(&self, _req: ScanRequest) -> Result<ScanReport, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.xml {
                Some(xml) => parse_nmap_xml(xml),
                None => Err(ScanError::Timeout {
                    tool: "nmap".into(),
                    secs: 900,
                }),
            }
        }
    }

    fn request(target: &str) -> ScanRequest {
        ScanRequest::from_config(target, &AppConfig::default())
    }

    #[tokio::test]
    async fn success_posts_formatted_results() {
        let mut sink = spawn_sink(StatusCode::OK).await;
        let scanner = Arc::new(FakeScanner::succeeding(include_str!(
            "../../fixtures/nmap_sample.xml"
        )));

        run_scan_job(
            scanner.clone(),
            CallbackClient::new(5).unwrap(),
            request("192.168.1.10"),
            sink.url.clone(),
            Uuid::new_v4(),
        )
        .await;

        let msg = sink.received.recv().await.expect("results posted");
        assert_eq!(msg.response_type, ResponseType::InChannel);
        assert_eq!(msg.attachments[0].title, "nmap scan results for 192.168.1.10");
        assert_eq!(msg.attachments[0].fields.len(), 5);
        assert_eq!(scanner.calls(), 1);
        assert!(sink.received.try_recv().is_err());
    }

    #[tokio::test]
    async fn failure_posts_exactly_one_error_message() {
        let mut sink = spawn_sink(StatusCode::OK).await;

        run_scan_job(
            Arc::new(FakeScanner::failing()),
            CallbackClient::new(5).unwrap(),
            request("10.0.0.1"),
            sink.url.clone(),
            Uuid::new_v4(),
        )
        .await;

        let msg = sink.received.recv().await.expect("error posted");
        assert_eq!(
            msg.text.as_deref(),
            Some("nmap encountered an error! nmap timed out after 900 seconds")
        );
        assert!(msg.attachments.is_empty());

        let extra = timeout(Duration::from_millis(200), sink.received.recv()).await;
        assert!(extra.is_err(), "no second post expected");
    }

    #[tokio::test]
    async fn rejected_callback_does_not_panic() {
        let mut sink = spawn_sink(StatusCode::INTERNAL_SERVER_ERROR).await;

        run_scan_job(
            Arc::new(FakeScanner::failing()),
            CallbackClient::new(5).unwrap(),
            request("10.0.0.1"),
            sink.url.clone(),
            Uuid::new_v4(),
        )
        .await;

        assert!(sink.received.recv().await.is_some());
    }
}
