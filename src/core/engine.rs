use crate::core::processor::ProfileProcessor;
use crate::domain::model::Outcome;
use crate::domain::ports::{CompletionBackend, PageFetcher, Publisher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reviewers: usize,
    pub manual_interventions: usize,
    pub dead_lettered: usize,
    /// dead-letter 發送也失敗的訊息
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.reviewers + self.manual_interventions + self.dead_lettered + self.failed
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Reviewer => self.reviewers += 1,
            Outcome::ManualIntervention => self.manual_interventions += 1,
            Outcome::DeadLettered { .. } => self.dead_lettered += 1,
        }
    }
}

/// 批次執行器；訊息之間沒有共享狀態，可以平行處理
pub struct ScraperEngine<F, B, P>
where
    F: PageFetcher + 'static,
    B: CompletionBackend + 'static,
    P: Publisher + 'static,
{
    processor: Arc<ProfileProcessor<F, B, P>>,
    concurrency: usize,
}

impl<F, B, P> ScraperEngine<F, B, P>
where
    F: PageFetcher + 'static,
    B: CompletionBackend + 'static,
    P: Publisher + 'static,
{
    pub fn new(processor: ProfileProcessor<F, B, P>, concurrency: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            concurrency: concurrency.max(1),
        }
    }

    pub fn processor(&self) -> &ProfileProcessor<F, B, P> {
        &self.processor
    }

    pub async fn run(&self, messages: Vec<String>) -> RunSummary {
        let started = Instant::now();
        tracing::info!(
            "🚀 Processing {} message(s) with concurrency {}",
            messages.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for raw in messages {
            let processor = Arc::clone(&self.processor);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                processor.handle(&raw).await
            });
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => summary.record(&outcome),
                Ok(Err(e)) => {
                    tracing::error!("❌ Message lost, dead-letter publish failed: {}", e);
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Worker task aborted: {}", e);
                    summary.failed += 1;
                }
            }
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            "📊 Done in {:?}: {} reviewer(s), {} manual intervention(s), {} dead-lettered, {} failed",
            summary.elapsed,
            summary.reviewers,
            summary.manual_interventions,
            summary.dead_lettered,
            summary.failed
        );
        summary
    }
}
