use async_trait::async_trait;
use tracing::info;

use crate::error::ScraperError;
use crate::probate::RunSummary;

#[async_trait]
pub trait Scraper: Send {
    type Output: Send;

    /// ブラウザ初期化（一覧ページの表示まで）
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// データ取得
    async fn scrape(&mut self) -> Result<Self::Output, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → scrape → close）
    ///
    /// 途中で失敗しても close は必ず呼ぶ。
    async fn execute(&mut self) -> Result<Self::Output, ScraperError> {
        let result = match self.initialize().await {
            Ok(()) => self.scrape().await,
            Err(e) => Err(e),
        };
        let closed = self.close().await;
        let output = result?;
        closed?;
        Ok(output)
    }
}

/// ブラウザページの操作窓口
///
/// 要素ハンドルはナビゲーションをまたいで保持しない。行のクリックも毎回セレクタで
/// 取り直してから index で参照する。
#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// セレクタに一致する要素が現在のDOMにあるか
    async fn exists(&self, selector: &str) -> Result<bool, ScraperError>;

    /// `row_selector` の index 番目の要素内にある `link_selector` をクリック
    async fn click_nth(
        &self,
        row_selector: &str,
        index: usize,
        link_selector: &str,
    ) -> Result<(), ScraperError>;

    /// 現在のDOMをHTML文字列で取得
    async fn content(&self) -> Result<String, ScraperError>;

    /// デバッグ用スクリーンショット（base64 PNG）
    async fn screenshot_base64(&self) -> Option<String> {
        None
    }
}

/// 進捗通知の受け口（件数と現在行のみ、制御は戻さない）
pub trait ProgressSink: Send + Sync {
    fn begin(&self, _total: usize) {}

    fn row_done(&self, _current: usize, _total: usize) {}

    fn finish(&self, _summary: &RunSummary) {}
}

pub struct NullProgress;

impl ProgressSink for NullProgress {}

/// tracing に流すだけの進捗
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn begin(&self, total: usize) {
        info!("対象 {} 行を処理開始", total);
    }

    fn row_done(&self, current: usize, total: usize) {
        info!("進捗: {}/{}", current, total);
    }

    fn finish(&self, summary: &RunSummary) {
        info!("{}", summary.status_line());
    }
}
