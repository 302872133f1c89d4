use crate::adapters::input::InputLoader;
use crate::adapters::output::{OutputFormat, OutputWriter};
use crate::core::processor::CommentProcessor;
use crate::core::{CommentSource, ConfigProvider, Pipeline, Storage, TrackingStore};
use crate::domain::model::TrackingResult;
use crate::utils::error::Result;

/// Batch run: load comment URLs, track them, write the result sheet.
pub struct TrackerPipeline<S, C, R, T>
where
    S: Storage,
    C: ConfigProvider,
    R: CommentSource + ?Sized,
    T: TrackingStore + ?Sized,
{
    storage: S,
    config: C,
    loader: InputLoader,
    processor: CommentProcessor<R, T>,
}

impl<S, C, R, T> TrackerPipeline<S, C, R, T>
where
    S: Storage,
    C: ConfigProvider,
    R: CommentSource + ?Sized,
    T: TrackingStore + ?Sized,
{
    pub fn new(
        storage: S,
        config: C,
        loader: InputLoader,
        processor: CommentProcessor<R, T>,
    ) -> Self {
        let workers = config.workers();
        Self {
            storage,
            config,
            loader,
            processor: processor.with_max_workers(workers),
        }
    }

    fn output_format(&self) -> OutputFormat {
        if self.config.csv_output() {
            OutputFormat::Csv
        } else {
            OutputFormat::Xlsx
        }
    }
}

#[async_trait::async_trait]
impl<S, C, R, T> Pipeline for TrackerPipeline<S, C, R, T>
where
    S: Storage,
    C: ConfigProvider,
    R: CommentSource + ?Sized + 'static,
    T: TrackingStore + ?Sized,
{
    async fn extract(&self) -> Result<Vec<String>> {
        tracing::info!("Loading input from: {}", self.config.input_source());
        self.loader.load(self.config.input_source()).await
    }

    async fn transform(&self, comment_urls: Vec<String>) -> Result<Vec<TrackingResult>> {
        let results = if self.config.parallel() {
            tracing::info!(
                "→ Using parallel processing with {} workers",
                self.config.workers()
            );
            self.processor.process_batch_parallel(&comment_urls).await
        } else {
            tracing::info!("→ Using sequential processing");
            self.processor.process_batch(&comment_urls).await
        };
        Ok(results)
    }

    async fn load(&self, results: &[TrackingResult]) -> Result<String> {
        OutputWriter::new(&self.storage)
            .write(results, self.output_format(), self.config.output_path())
            .await
    }
}
