pub mod http;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use shared::types::About;

/// Capability implemented by anything that can ingest About records.
/// Implementations must tolerate calls from many concurrent tasks and from
/// multiple export engines sharing the same instance.
pub trait Exporter: Send + Sync {
    /// Ingest one record. Never fails.
    fn handle(&self, about: About);

    /// Number of records accumulated so far.
    fn count(&self) -> usize;
}

/// Delivers every record from an About stream to every registered exporter,
/// draining a parallel error stream without letting either block the other.
pub struct ExporterService {
    exporters: Vec<Arc<dyn Exporter>>,
}

/// Handle over the tasks spawned by [`ExporterService::export`]. Awaiting
/// [`join`](ExportHandle::join) observes that every exporter has drained the
/// About stream and the error stream is exhausted; dropping the handle
/// leaves the tasks running detached.
pub struct ExportHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ExportHandle {
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Export task failed: {}", e);
            }
        }
    }
}

impl ExporterService {
    /// The exporter list is fixed for the service's lifetime.
    pub fn new(exporters: Vec<Arc<dyn Exporter>>) -> Self {
        Self { exporters }
    }

    pub fn exporters(&self) -> &[Arc<dyn Exporter>] {
        &self.exporters
    }

    /// Fan the About stream out to every exporter and drain the error
    /// stream. Runs until both input streams are closed by the producer;
    /// closure is the only termination signal.
    pub fn export(
        &self,
        mut abouts: mpsc::Receiver<About>,
        mut errors: mpsc::Receiver<anyhow::Error>,
    ) -> ExportHandle {
        let mut tasks = Vec::with_capacity(self.exporters.len() + 2);
        let mut queues = Vec::with_capacity(self.exporters.len());

        // One consumer task per exporter, each draining its own unbounded
        // queue. A slow exporter buffers; it cannot hold up its peers.
        for exporter in &self.exporters {
            let (tx, mut rx) = mpsc::unbounded_channel::<About>();
            let exporter = Arc::clone(exporter);
            tasks.push(tokio::spawn(async move {
                while let Some(about) = rx.recv().await {
                    exporter.handle(about);
                }
            }));
            queues.push(tx);
        }

        // Distributor: every record goes to every queue, in arrival order.
        tasks.push(tokio::spawn(async move {
            while let Some(about) = abouts.recv().await {
                for queue in &queues {
                    if queue.send(about.clone()).is_err() {
                        tracing::warn!("Exporter queue closed, dropping record");
                    }
                }
            }
        }));

        // Errors are reported here and go no further; exporters never see
        // them and About delivery is unaffected.
        tasks.push(tokio::spawn(async move {
            while let Some(e) = errors.recv().await {
                tracing::error!("Discovery error: {:#}", e);
            }
        }));

        ExportHandle { tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::http::HttpExporter;
    use anyhow::anyhow;
    use shared::types::Service;

    fn about(name: &str) -> About {
        About {
            service: Service {
                name: name.to_string(),
                namespace: "billing".to_string(),
                base_url: String::new(),
            },
            doc: None,
        }
    }

    #[tokio::test]
    async fn test_fan_out_delivers_to_every_exporter() {
        let (about_tx, about_rx) = mpsc::channel(10);
        let (error_tx, error_rx) = mpsc::channel(10);

        let exporters: Vec<Arc<dyn Exporter>> =
            vec![Arc::new(HttpExporter::new()), Arc::new(HttpExporter::new())];
        let service = ExporterService::new(exporters);

        about_tx.send(About::default()).await.unwrap();
        drop(about_tx);
        drop(error_tx);

        service.export(about_rx, error_rx).join().await;

        for exporter in service.exporters() {
            assert_eq!(exporter.count(), 1);
        }
    }

    #[tokio::test]
    async fn test_errors_never_reach_exporters() {
        let (about_tx, about_rx) = mpsc::channel(10);
        let (error_tx, error_rx) = mpsc::channel(10);

        let exporters: Vec<Arc<dyn Exporter>> = vec![Arc::new(HttpExporter::new())];
        let service = ExporterService::new(exporters);

        error_tx.send(anyhow!("doc fetch failed")).await.unwrap();
        error_tx.send(anyhow!("service unreachable")).await.unwrap();
        drop(about_tx);
        drop(error_tx);

        service.export(about_rx, error_rx).join().await;

        assert_eq!(service.exporters()[0].count(), 0);
    }

    #[tokio::test]
    async fn test_errors_do_not_stop_about_delivery() {
        let (about_tx, about_rx) = mpsc::channel(10);
        let (error_tx, error_rx) = mpsc::channel(10);

        let exporters: Vec<Arc<dyn Exporter>> = vec![Arc::new(HttpExporter::new())];
        let service = ExporterService::new(exporters);

        error_tx.send(anyhow!("doc fetch failed")).await.unwrap();
        about_tx.send(about("uw-service-refdata")).await.unwrap();
        error_tx.send(anyhow!("another failure")).await.unwrap();
        about_tx.send(about("uw-service-billing")).await.unwrap();
        drop(about_tx);
        drop(error_tx);

        service.export(about_rx, error_rx).join().await;

        assert_eq!(service.exporters()[0].count(), 2);
    }

    #[tokio::test]
    async fn test_arrival_order_preserved_per_exporter() {
        let (about_tx, about_rx) = mpsc::channel(10);
        let (error_tx, error_rx) = mpsc::channel(10);

        let http = Arc::new(HttpExporter::new());
        let exporters: Vec<Arc<dyn Exporter>> = vec![http.clone()];
        let service = ExporterService::new(exporters);

        for name in ["first", "second", "third"] {
            about_tx.send(about(name)).await.unwrap();
        }
        drop(about_tx);
        drop(error_tx);

        service.export(about_rx, error_rx).join().await;

        let names: Vec<String> = http
            .snapshot()
            .into_iter()
            .map(|a| a.service.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }
}
