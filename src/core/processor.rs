use crate::core::extractor::ProfileExtractor;
use crate::core::retry::{Attempted, RetryPolicy};
use crate::core::router::classify_and_route;
use crate::core::selector::ContentSelector;
use crate::domain::model::{IncomingProfile, Outcome, RouteDecision};
use crate::domain::ports::{CompletionBackend, FetchOutcome, PageFetcher, Publisher};
use crate::utils::error::{Result, ScraperError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkNames {
    pub reviewers: String,
    pub manual_intervention: String,
    pub dead_letter: String,
}

impl Default for SinkNames {
    fn default() -> Self {
        Self {
            reviewers: "reviewers-data".to_string(),
            manual_intervention: "manual-intervention".to_string(),
            dead_letter: "profiles.DLT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessorSettings {
    pub retry: RetryPolicy,
    pub sinks: SinkNames,
}

/// 單一訊息的完整處理：抓取、選取內容、擷取、分類、發送，失敗時送往 dead-letter
pub struct ProfileProcessor<F: PageFetcher, B: CompletionBackend, P: Publisher> {
    fetcher: F,
    extractor: ProfileExtractor<B>,
    publisher: P,
    selector: ContentSelector,
    settings: ProcessorSettings,
}

impl<F: PageFetcher, B: CompletionBackend, P: Publisher> ProfileProcessor<F, B, P> {
    pub fn new(
        fetcher: F,
        extractor: ProfileExtractor<B>,
        publisher: P,
        settings: ProcessorSettings,
    ) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor,
            publisher,
            selector: ContentSelector::new()?,
            settings,
        })
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// 處理一則原始訊息；只有 dead-letter 本身發送失敗時才回傳錯誤
    pub async fn handle(&self, raw: &str) -> Result<Outcome> {
        let profile: IncomingProfile = match serde_json::from_str(raw) {
            Ok(profile) => profile,
            Err(e) => {
                let error = ScraperError::Serialization(e);
                return self.dead_letter(raw, &error, 0).await;
            }
        };

        if !profile.has_source() {
            return self.dead_letter(raw, &ScraperError::NoProfileData, 0).await;
        }

        tracing::info!(
            "📥 Processing profile from {} ({})",
            profile.institution.display_name(),
            profile.profile_url().unwrap_or("embedded html")
        );

        match self
            .settings
            .retry
            .run(|attempt| self.process_once(&profile, attempt))
            .await
        {
            Attempted::Succeeded { value, attempts } => {
                tracing::info!("✅ Routed profile as {:?} after {} attempt(s)", value, attempts);
                Ok(value)
            }
            Attempted::Failed { error, attempts } => self.dead_letter(raw, &error, attempts).await,
        }
    }

    async fn process_once(&self, profile: &IncomingProfile, attempt: u32) -> Result<Outcome> {
        tracing::debug!("Attempt {} for {}", attempt, profile.department);

        let decision = self
            .select_and_extract(profile)
            .await
            .map_err(ScraperError::into_processing)?;

        self.route(decision).await
    }

    async fn select_and_extract(&self, profile: &IncomingProfile) -> Result<RouteDecision> {
        let html = self.resolve_page(profile).await?;
        let region = self.selector.select_html(&html)?;
        tracing::debug!(
            "Content region {:?} selected ({} chars)",
            region.source,
            region.text.len()
        );

        let info = self
            .extractor
            .extract(&region.text, profile.embedded_html())
            .await?;
        Ok(classify_and_route(profile, info))
    }

    /// 優先使用抓取到的頁面；抓取失敗或內容為空時改用訊息內嵌的 HTML
    async fn resolve_page(&self, profile: &IncomingProfile) -> Result<String> {
        let mut failure = None;

        if let Some(url) = profile.profile_url() {
            let unusable = |reason: String| ScraperError::PageUnavailable {
                url: url.to_string(),
                reason,
            };
            match self.fetcher.fetch(url).await {
                Ok(FetchOutcome::Page(html)) if !html.trim().is_empty() => return Ok(html),
                Ok(FetchOutcome::Page(_)) | Ok(FetchOutcome::Empty) => {
                    tracing::warn!("Fetched page is empty: {}", url);
                    failure = Some(unusable("empty response body".to_string()));
                }
                Ok(FetchOutcome::Unavailable { status }) => {
                    tracing::warn!("Fetching {} returned HTTP {}", url, status);
                    failure = Some(unusable(format!("HTTP {}", status)));
                }
                Err(e) => {
                    tracing::warn!("Fetching {} failed: {}", url, e);
                    failure = Some(e);
                }
            }
        }

        if let Some(html) = profile.embedded_html() {
            tracing::debug!("Falling back to embedded html content");
            return Ok(html.to_string());
        }

        Err(failure.unwrap_or(ScraperError::NoProfileData))
    }

    async fn route(&self, decision: RouteDecision) -> Result<Outcome> {
        let sinks = &self.settings.sinks;
        match decision {
            RouteDecision::Reviewer(reviewer) => {
                let payload = serde_json::to_string(&reviewer)?;
                self.publisher.publish(&sinks.reviewers, &payload).await?;
                Ok(Outcome::Reviewer)
            }
            RouteDecision::ManualIntervention(incomplete) => {
                tracing::info!("📝 Profile missing {:?}, sending to manual intervention", incomplete.flags);
                let payload = serde_json::to_string(&incomplete)?;
                self.publisher
                    .publish(&sinks.manual_intervention, &payload)
                    .await?;
                Ok(Outcome::ManualIntervention)
            }
        }
    }

    async fn dead_letter(&self, raw: &str, error: &ScraperError, attempts: u32) -> Result<Outcome> {
        tracing::error!(
            "❌ Dead-lettering message after {} attempt(s): {} (kind: {:?})",
            attempts,
            error,
            error.kind()
        );

        self.publisher
            .publish(&self.settings.sinks.dead_letter, raw)
            .await?;

        Ok(Outcome::DeadLettered {
            reason: error.to_string(),
            attempts,
        })
    }
}
