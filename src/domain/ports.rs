use crate::utils::error::Result;
use async_trait::async_trait;

/// 頁面抓取結果；傳輸層錯誤以 `Err` 回傳
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Page(String),
    Unavailable { status: u16 },
    Empty,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutcome>;
}

/// 文字補全服務，輸入完整 prompt，回傳第一個 choice 的內容
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        sink: &str,
        payload: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
