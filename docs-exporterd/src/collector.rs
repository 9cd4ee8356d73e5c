use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use futures::stream::{FuturesUnordered, StreamExt};
use anyhow::{Context, Result};
use shared::protocol::ABOUT_PATH;
use shared::types::{About, Service};
use crate::config::{CollectorConfig, ServiceTarget};

/// Fetches each registered service's own about document and feeds the
/// results into the export channels. With no refresh interval configured a
/// single pass runs and the senders drop, closing both streams; otherwise
/// passes repeat until cancelled.
pub async fn run(
    targets: Vec<ServiceTarget>,
    about_tx: mpsc::Sender<About>,
    error_tx: mpsc::Sender<anyhow::Error>,
    config: CollectorConfig,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!("Starting collector for {} services", targets.len());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    collect_pass(&client, &targets, &about_tx, &error_tx).await;

    if config.refresh_interval_secs == 0 {
        tracing::info!("Collection pass complete");
        return Ok(());
    }

    let mut refresh_interval =
        tokio::time::interval(Duration::from_secs(config.refresh_interval_secs));
    // the first tick fires immediately; the pass above already covered it
    refresh_interval.tick().await;

    loop {
        tokio::select! {
            _ = refresh_interval.tick() => {
                collect_pass(&client, &targets, &about_tx, &error_tx).await;
            }
            _ = cancel.cancelled() => {
                tracing::info!("Collector shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// One pass over every registered service, all fetches in flight at once.
/// A failed fetch is reported on the error stream; the service is still
/// announced, with an absent payload.
async fn collect_pass(
    client: &reqwest::Client,
    targets: &[ServiceTarget],
    about_tx: &mpsc::Sender<About>,
    error_tx: &mpsc::Sender<anyhow::Error>,
) {
    let mut fetches: FuturesUnordered<_> = targets
        .iter()
        .map(|target| {
            let service = target.service();
            let url = about_url(&service);
            async move {
                let doc = fetch_doc(client, &url).await;
                (service, url, doc)
            }
        })
        .collect();

    while let Some((service, url, doc)) = fetches.next().await {
        let about = match doc {
            Ok(doc) => {
                tracing::debug!("Fetched about document from {}", url);
                About {
                    service,
                    doc: Some(doc),
                }
            }
            Err(e) => {
                let e = e.context(format!("Failed to fetch about document from {}", url));
                if error_tx.send(e).await.is_err() {
                    tracing::warn!("Error channel closed");
                }
                About { service, doc: None }
            }
        };

        if about_tx.send(about).await.is_err() {
            tracing::warn!("About channel closed, stopping pass");
            break;
        }
    }
}

async fn fetch_doc(client: &reqwest::Client, url: &str) -> Result<serde_json::Value> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?;

    let doc = response.json().await?;
    Ok(doc)
}

/// URL of a service's own about endpoint: the configured base URL when one
/// is set, the cluster address derived from name and namespace otherwise.
fn about_url(service: &Service) -> String {
    if service.base_url.is_empty() {
        format!("http://{}.{}{}", service.name, service.namespace, ABOUT_PATH)
    } else {
        format!("{}{}", service.base_url.trim_end_matches('/'), ABOUT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> Service {
        Service {
            name: "uw-service-refdata".to_string(),
            namespace: "billing".to_string(),
            base_url: base_url.to_string(),
        }
    }

    #[test]
    fn test_about_url_defaults_to_cluster_address() {
        assert_eq!(
            about_url(&service("")),
            "http://uw-service-refdata.billing/__/about"
        );
    }

    #[test]
    fn test_about_url_uses_base_url_override() {
        assert_eq!(
            about_url(&service("http://localhost:9001")),
            "http://localhost:9001/__/about"
        );
        assert_eq!(
            about_url(&service("http://localhost:9001/")),
            "http://localhost:9001/__/about"
        );
    }
}
