use crate::core::Pipeline;
use crate::domain::model::TrackingResult;
use crate::utils::error::{Result, TrackerError};
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub results: Vec<TrackingResult>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("[1/3] Loading input");
        let comment_urls = self.pipeline.extract().await?;
        tracing::info!("✓ Loaded {} comment URLs", comment_urls.len());
        self.monitor.log_stats("Extract");

        if comment_urls.is_empty() {
            return Err(TrackerError::input("No valid comment URLs found in input"));
        }

        tracing::info!("[2/3] Processing comments");
        let results = self.pipeline.transform(comment_urls).await?;
        tracing::info!("✓ Processed {} comments", results.len());
        self.monitor.log_stats("Transform");

        tracing::info!("[3/3] Writing output");
        let output_path = self.pipeline.load(&results).await?;
        tracing::info!("✓ Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunReport {
            output_path,
            results,
        })
    }
}
