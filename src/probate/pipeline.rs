//! Probate スクレイパー実装
//!
//! 一覧を開き、ESTATE 行ごとに 詳細 → 補助ページ → マージ を行い、最後に出力テーブルを作る。
//! ページは1枚を順番に使い回すので並行取得はしない。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{LogProgress, PortalPage, ProgressSink, Scraper};

use super::aggregate::finalize;
use super::cross_ref::fetch_all;
use super::detail::fetch_primary_detail;
use super::listing::list_cases;
use super::pages::{EdgeFailure, OnFailure, PageKind};
use super::reconcile::merge;
use super::session::{open_listing, Session};
use super::types::{CanonicalRecord, CaseRow, ResultTable, RunSummary, SkipReason};

/// 一覧へ戻れない状態がこの回数続いたら打ち切る
const MAX_RESTORE_FAILURES: usize = 3;

/// 1回の実行結果
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    pub table: ResultTable,
    pub summary: RunSummary,
}

pub struct ProbateScraper {
    config: ScraperConfig,
    date: NaiveDate,
    progress: Arc<dyn ProgressSink>,
    session: Option<Session>,
}

impl ProbateScraper {
    pub fn new(config: ScraperConfig, date: NaiveDate) -> Self {
        Self {
            config,
            date,
            progress: Arc::new(LogProgress),
            session: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[async_trait]
impl Scraper for ProbateScraper {
    type Output = ScrapeOutput;

    async fn initialize(&mut self) -> Result<(), ScraperError> {
        let session = Session::open(&self.config, self.date).await?;
        self.session = Some(session);
        Ok(())
    }

    async fn scrape(&mut self) -> Result<ScrapeOutput, ScraperError> {
        let page = self
            .session
            .as_ref()
            .map(Session::page)
            .ok_or_else(|| ScraperError::BrowserInit("Browser not initialized".to_string()))?;
        collect_cases(page, &self.config, self.date, self.progress.as_ref()).await
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

/// 一覧を開くところから実行する（ページはブラウザでも差し替えでもよい）
pub async fn run_on_page<P: PortalPage + ?Sized>(
    page: &P,
    config: &ScraperConfig,
    date: NaiveDate,
    progress: &dyn ProgressSink,
) -> Result<ScrapeOutput, ScraperError> {
    open_listing(page, config, date).await?;
    collect_cases(page, config, date, progress).await
}

/// 一覧が表示済みのページから全事件を処理する
pub async fn collect_cases<P: PortalPage + ?Sized>(
    page: &P,
    config: &ScraperConfig,
    date: NaiveDate,
    progress: &dyn ProgressSink,
) -> Result<ScrapeOutput, ScraperError> {
    let mut summary = RunSummary::new(date);

    let (rows, listed) = list_cases(page).await?;
    summary.listed_rows = listed;
    summary.qualifying_rows = rows.len();

    if rows.is_empty() {
        warn!("ESTATE 行がありません: {}", date.format("%Y%m%d"));
        progress.finish(&summary);
        return Ok(ScrapeOutput {
            table: ResultTable::default(),
            summary,
        });
    }

    let total = rows.len();
    progress.begin(total);

    let mut records = Vec::with_capacity(total);
    let mut restore_failures = 0;
    for (i, row) in rows.iter().enumerate() {
        // 前の事件で一覧から離れているので戻してから行を取り直す
        let restored = if i > 0 {
            restore_listing(page, config, date, &mut restore_failures).await
        } else {
            Ok(())
        };
        let outcome = match restored {
            Ok(()) => process_case(page, row, config).await,
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok((record, warnings)) => {
                records.push(record);
                summary.page_warnings.extend(warnings);
            }
            Err(failure) if failure.on_failure == OnFailure::AbortRun => {
                warn!(
                    "行 {} で処理を打ち切り（未処理 {} 行）: {}",
                    row.position + 1,
                    total - i,
                    failure.error
                );
                let reason = skip_reason(&failure.error);
                summary
                    .skipped
                    .extend(rows[i..].iter().map(|r| (r.position + 1, reason.clone())));
                summary.aborted_early = true;
                break;
            }
            Err(failure) => {
                warn!("行 {} の処理に失敗: {}", row.position + 1, failure.error);
                summary
                    .skipped
                    .push((row.position + 1, skip_reason(&failure.error)));
            }
        }

        progress.row_done(i + 1, total);
    }

    summary.processed = records.len();
    let finalized = finalize(records, config.keep_case_number);
    summary.missing_columns = finalized.missing_columns;

    info!("{}", summary.status_line());
    progress.finish(&summary);

    Ok(ScrapeOutput {
        table: finalized.table,
        summary,
    })
}

/// 次の行の前に一覧へ戻る
///
/// 戻れなければその行を飛ばす。連続して失敗したら実行を打ち切る。
async fn restore_listing<P: PortalPage + ?Sized>(
    page: &P,
    config: &ScraperConfig,
    date: NaiveDate,
    failures: &mut usize,
) -> Result<(), EdgeFailure> {
    match open_listing(page, config, date).await {
        Ok(()) => {
            *failures = 0;
            Ok(())
        }
        Err(error) => {
            *failures += 1;
            let mut failure = EdgeFailure::new(PageKind::PrimaryDetail, PageKind::Listing, error);
            if *failures >= MAX_RESTORE_FAILURES {
                failure.on_failure = OnFailure::AbortRun;
            }
            Err(failure)
        }
    }
}

/// 1事件分: 詳細 → 補助ページ → マージ
async fn process_case<P: PortalPage + ?Sized>(
    page: &P,
    row: &CaseRow,
    config: &ScraperConfig,
) -> Result<(CanonicalRecord, Vec<String>), EdgeFailure> {
    let primary = fetch_primary_detail(page, row, config)
        .await
        .map_err(|e| EdgeFailure::new(PageKind::Listing, PageKind::PrimaryDetail, e))?;
    info!(
        "行 {}: 事件番号 {}",
        row.position + 1,
        primary.case_number
    );

    let aux = fetch_all(page, &primary.case_number, config).await?;
    let record = merge(primary.fields, aux.additional, aux.attorney, aux.roster);
    Ok((record, aux.warnings))
}

fn skip_reason(err: &ScraperError) -> SkipReason {
    match err {
        ScraperError::MissingJoinKey(_) => SkipReason::MissingJoinKey,
        ScraperError::Timeout { page, .. } => SkipReason::Timeout(page.clone()),
        other => SkipReason::Failed(other.to_string()),
    }
}
