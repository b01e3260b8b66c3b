//! 取得したHTMLからテーブルを読み取る
//!
//! ブラウザから `content()` で取ったDOMをここで解析する。ページ操作は一切しない。

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::ScraperError;

use super::pages::{DETAIL_TABLE_SELECTOR, ROW_MARKER_SELECTOR};
use super::types::{CaseRow, FieldMap};

/// 一覧の種別列（3列目）
const CASE_TYPE_COLUMN: usize = 2;

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css)
        .map_err(|e| ScraperError::ElementNotFound(format!("invalid selector '{}': {:?}", css, e)))
}

/// 要素内テキストを連結してtrim（&nbsp; も落ちる）
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn cells(row: ElementRef<'_>, cell: &Selector) -> Vec<String> {
    row.select(cell).map(element_text).collect()
}

/// 行マーカー付きの行を一覧の行として読む
pub fn parse_listing(html: &str) -> Result<Vec<CaseRow>, ScraperError> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_MARKER_SELECTOR)?;
    let td_sel = selector("td")?;
    let link_sel = selector("a")?;

    let rows = document
        .select(&row_sel)
        .enumerate()
        .map(|(position, row)| {
            let case_type = row
                .select(&td_sel)
                .nth(CASE_TYPE_COLUMN)
                .map(element_text)
                .unwrap_or_default();
            let link = row
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            CaseRow {
                position,
                case_type,
                link,
            }
        })
        .collect();

    Ok(rows)
}

/// 見出し(th)/値(td) 形式のテーブルを読む
///
/// どちらかのセルが欠けた行はその項目だけ捨てる。
pub fn parse_header_value_table(html: &str) -> Result<FieldMap, ScraperError> {
    let document = Html::parse_document(html);
    let table_sel = selector(DETAIL_TABLE_SELECTOR)?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;

    let mut fields = FieldMap::new();
    for table in document.select(&table_sel) {
        for (i, row) in table_rows(table).enumerate() {
            let key = row.select(&th_sel).next().map(element_text);
            let value = row.select(&td_sel).next().map(element_text);
            match (key, value) {
                (Some(key), Some(value)) if !key.is_empty() => {
                    fields.insert(key, value);
                }
                _ => {
                    let err = ScraperError::MalformedRow(format!("detail table row {}", i + 1));
                    debug!("{}", err);
                }
            }
        }
    }

    Ok(fields)
}

/// テーブル直下の行だけを返す（入れ子テーブルの行は含めない）
fn table_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| -> Vec<ElementRef<'a>> {
            match child.value().name() {
                "tbody" | "thead" | "tfoot" => child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|r| r.value().name() == "tr")
                    .collect(),
                "tr" => vec![child],
                _ => Vec::new(),
            }
        })
}

/// 行マーカー付きの行をセル列として読む（受託者一覧用）
pub fn parse_marker_grid(html: &str) -> Result<Vec<Vec<String>>, ScraperError> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_MARKER_SELECTOR)?;
    let td_sel = selector("td")?;

    Ok(document
        .select(&row_sel)
        .map(|row| cells(row, &td_sel))
        .collect())
}
