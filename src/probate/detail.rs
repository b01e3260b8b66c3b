//! 事件詳細ページ（一覧の行リンクをクリックして開く）

use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::PortalPage;

use super::html::parse_header_value_table;
use super::listing::resolve_row;
use super::pages::{PageKind, CASE_NUMBER_FIELD, ROW_LINK_SELECTOR, ROW_MARKER_SELECTOR};
use super::session::wait_for_page;
use super::types::{CaseRow, FieldMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryDetail {
    pub fields: FieldMap,
    /// trim済み、空でない
    pub case_number: String,
}

/// 行をクリックして詳細テーブルを読む
///
/// 事件番号が無い・空なら `MissingJoinKey`（呼び出し側でその事件を飛ばす）。
pub async fn fetch_primary_detail<P: PortalPage + ?Sized>(
    page: &P,
    row: &CaseRow,
    config: &ScraperConfig,
) -> Result<PrimaryDetail, ScraperError> {
    let row = resolve_row(page, row).await?;
    debug!(
        "行 {} を開く ({})",
        row.position + 1,
        row.link.as_deref().unwrap_or("no href")
    );

    page.click_nth(ROW_MARKER_SELECTOR, row.position, ROW_LINK_SELECTOR)
        .await?;
    wait_for_page(page, PageKind::PrimaryDetail, config.page_timeout, config).await?;

    let html = page.content().await?;
    let fields = parse_header_value_table(&html)?;
    debug!("行 {}: 詳細項目 {} 件", row.position + 1, fields.len());

    let case_number = extract_case_number(&fields)
        .ok_or_else(|| ScraperError::MissingJoinKey(format!("row {}", row.position + 1)))?;

    Ok(PrimaryDetail {
        fields,
        case_number,
    })
}

pub fn extract_case_number(fields: &FieldMap) -> Option<String> {
    fields
        .get(CASE_NUMBER_FIELD)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
