//! 日付別一覧ページ

use tracing::{debug, info};

use crate::error::ScraperError;
use crate::traits::PortalPage;

use super::html::parse_listing;
use super::types::CaseRow;

/// 現在の一覧DOMから ESTATE 行だけを返す
///
/// 戻り値の2つ目は行マーカー付きの全行数。
pub async fn list_cases<P: PortalPage + ?Sized>(
    page: &P,
) -> Result<(Vec<CaseRow>, usize), ScraperError> {
    let html = page.content().await?;
    let rows = parse_listing(&html)?;
    let listed = rows.len();

    let qualifying: Vec<CaseRow> = rows
        .into_iter()
        .filter(|row| {
            let keep = row.is_estate();
            if !keep {
                debug!(
                    "行 {} をスキップ (種別 '{}')",
                    row.position + 1,
                    row.case_type
                );
            }
            keep
        })
        .collect();

    info!(
        "一覧 {} 行、うち ESTATE {} 行",
        listed,
        qualifying.len()
    );
    Ok((qualifying, listed))
}

/// 一覧に戻った後、同じ位置の行を取り直す
///
/// 一覧の中身が変わっていたら（行が無い・種別が違う）エラーにする。
pub async fn resolve_row<P: PortalPage + ?Sized>(
    page: &P,
    expected: &CaseRow,
) -> Result<CaseRow, ScraperError> {
    let html = page.content().await?;
    let current = parse_listing(&html)?
        .into_iter()
        .nth(expected.position)
        .ok_or_else(|| {
            ScraperError::ElementNotFound(format!("listing row {}", expected.position + 1))
        })?;

    if current.case_type != expected.case_type || !current.is_estate() {
        return Err(ScraperError::ElementNotFound(format!(
            "listing row {} changed type: '{}' -> '{}'",
            expected.position + 1,
            expected.case_type,
            current.case_type
        )));
    }
    Ok(current)
}
