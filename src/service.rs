use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::NaiveDate;
use tower::Service;
use tracing::info;

use crate::config::{ScraperConfig, DEFAULT_BASE_URL};
use crate::error::ScraperError;
use crate::export::{file_name, save_csv, to_csv_bytes};
use crate::probate::{ProbateScraper, ResultTable, RunSummary};
use crate::traits::{LogProgress, ProgressSink, Scraper};

/// スクレイピングリクエスト（日付1つ）
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub date: NaiveDate,
    pub base_url: String,
    pub output_dir: PathBuf,
    pub headless: bool,
    pub keep_case_number: bool,
}

impl ScrapeRequest {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("./downloads"),
            headless: true,
            keep_case_number: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_keep_case_number(mut self, keep: bool) -> Self {
        self.keep_case_number = keep;
        self
    }
}

impl From<ScrapeRequest> for ScraperConfig {
    fn from(req: ScrapeRequest) -> Self {
        ScraperConfig::default()
            .with_base_url(req.base_url)
            .with_output_dir(req.output_dir)
            .with_headless(req.headless)
            .with_keep_case_number(req.keep_case_number)
    }
}

/// スクレイピング結果（一部スキップがあってもテーブルは返す）
#[derive(Debug)]
pub struct ScrapeResult {
    pub table: ResultTable,
    pub summary: RunSummary,
    pub csv_content: Vec<u8>,
    pub file_name: String,
    /// 保存先（データが無ければ保存しない）
    pub csv_path: Option<PathBuf>,
}

impl ScrapeResult {
    pub fn new(
        table: ResultTable,
        summary: RunSummary,
        prefix: &str,
    ) -> Result<Self, ScraperError> {
        let csv_content = to_csv_bytes(&table)?;
        let file_name = file_name(prefix, summary.date);
        Ok(Self {
            table,
            summary,
            csv_content,
            file_name,
            csv_path: None,
        })
    }

    /// データがあればディレクトリに保存する
    pub fn save(&mut self, dir: &Path) -> Result<Option<&Path>, ScraperError> {
        if !self.has_data() {
            return Ok(None);
        }
        self.csv_path = Some(save_csv(&self.csv_content, dir, &self.file_name)?);
        Ok(self.csv_path.as_deref())
    }

    pub fn has_data(&self) -> bool {
        !self.table.is_empty()
    }
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Clone)]
pub struct ProbateService {
    progress: Arc<dyn ProgressSink>,
}

impl Default for ProbateService {
    fn default() -> Self {
        Self {
            progress: Arc::new(LogProgress),
        }
    }
}

impl ProbateService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }
}

impl Service<ScrapeRequest> for ProbateService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!("スクレイピング要求受信: date={}", req.date);
        let progress = self.progress.clone();

        Box::pin(async move {
            let date = req.date;
            let config: ScraperConfig = req.into();
            let output_dir = config.output_dir.clone();
            let prefix = config.file_prefix.clone();
            let mut scraper = ProbateScraper::new(config, date).with_progress(progress);

            // 失敗時も execute 内でブラウザは閉じる
            let output = scraper.execute().await?;
            let mut result = ScrapeResult::new(output.table, output.summary, &prefix)?;
            result.save(&output_dir)?;

            info!(
                "スクレイピング完了: file={}, rows={}, size={}bytes",
                result.file_name,
                result.table.len(),
                result.csv_content.len()
            );

            Ok(result)
        })
    }
}
