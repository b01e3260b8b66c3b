//! 事件番号から辿る補助ページ（受託者詳細・弁護士詳細・受託者一覧）

use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::PortalPage;

use super::html::{parse_header_value_table, parse_marker_grid};
use super::pages::{edges_from, EdgeFailure, OnFailure, PageKind};
use super::session::wait_for_page;
use super::types::FieldMap;

/// 弁護士ページに紛れ込む画面操作用のリンク文言
const ATTORNEY_BOILERPLATE: [&str; 4] = ["Back", "View", "New Search", "Homepage"];

/// 受託者一覧の列（固定9列、列順が変わると黙ってずれる）
pub const ROSTER_FIELDS: [&str; 9] = [
    "Number",
    "Name",
    "Title",
    "Title_Description",
    "Appointment_Date",
    "Termination_Date",
    "Case_Closed_Date",
    "Attorney_Number",
    "Attorney_Name",
];

/// 1事件分の補助ページ取得結果（取れなかったページは None）
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryPages {
    pub additional: Option<FieldMap>,
    pub attorney: Option<FieldMap>,
    pub roster: Option<FieldMap>,
    pub warnings: Vec<String>,
}

/// 補助ページを1つ取得して FieldMap にする
pub async fn fetch_auxiliary<P: PortalPage + ?Sized>(
    page: &P,
    case_number: &str,
    kind: PageKind,
    config: &ScraperConfig,
) -> Result<FieldMap, ScraperError> {
    let url = kind.auxiliary_url(&config.base_url, case_number).ok_or_else(|| {
        ScraperError::Navigation(format!("{} is not reachable by case number", kind.label()))
    })?;

    debug!("{} を取得中 (事件 {}): {}", kind.label(), case_number, url);
    page.goto(&url).await?;
    wait_for_page(page, kind, config.page_timeout, config).await?;
    let html = page.content().await?;

    match kind {
        PageKind::Attorney => Ok(strip_boilerplate(parse_header_value_table(&html)?)),
        PageKind::FiduciaryRoster => Ok(flatten_roster(parse_marker_grid(&html)?)),
        _ => parse_header_value_table(&html),
    }
}

/// 詳細ページから補助ページへの辺をすべて辿る
///
/// `SkipPage` の辺は警告にしてそのページだけ欠落させる。それ以外の辺の失敗は呼び出し側へ返す。
pub async fn fetch_all<P: PortalPage + ?Sized>(
    page: &P,
    case_number: &str,
    config: &ScraperConfig,
) -> Result<AuxiliaryPages, EdgeFailure> {
    let mut pages = AuxiliaryPages::default();

    for edge in edges_from(PageKind::PrimaryDetail).filter(|e| e.to.is_auxiliary()) {
        let fields = match fetch_auxiliary(page, case_number, edge.to, config).await {
            Ok(fields) => Some(fields),
            Err(error) if edge.on_failure == OnFailure::SkipPage => {
                let msg = format!("事件 {}: {} を取得できず: {}", case_number, edge.to.label(), error);
                warn!("{}", msg);
                pages.warnings.push(msg);
                None
            }
            Err(error) => return Err(EdgeFailure::new(edge.from, edge.to, error)),
        };

        match edge.to {
            PageKind::AdditionalDetail => pages.additional = fields,
            PageKind::Attorney => pages.attorney = fields,
            PageKind::FiduciaryRoster => pages.roster = fields,
            PageKind::Listing | PageKind::PrimaryDetail => {}
        }
    }

    Ok(pages)
}

/// 値セルが画面操作リンクの文言だけでできている行を捨てる
///
/// 文言を含むだけの値（"PLAIN View RD" など）は残す。
pub fn strip_boilerplate(fields: FieldMap) -> FieldMap {
    fields
        .into_iter()
        .filter(|(key, value)| {
            let boilerplate = is_navigation_only(value);
            if boilerplate {
                debug!("弁護士ページのリンク行を除外: '{}' = '{}'", key, value);
            }
            !boilerplate
        })
        .collect()
}

fn is_navigation_only(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    let rest = ATTORNEY_BOILERPLATE
        .iter()
        .fold(value.to_string(), |rest, link| rest.replace(link, " "));
    rest.chars().all(|c| c.is_whitespace() || c == '|')
}

/// 受託者一覧の行を `Fiduciary_<i>_<Field>` に平坦化（i は1始まり）
pub fn flatten_roster(rows: Vec<Vec<String>>) -> FieldMap {
    let mut fields = FieldMap::new();
    let valid = rows.into_iter().filter(|cells| {
        let ok = cells.len() >= ROSTER_FIELDS.len();
        if !ok {
            let err = ScraperError::MalformedRow(format!("roster row with {} cells", cells.len()));
            debug!("{}", err);
        }
        ok
    });

    for (i, cells) in valid.enumerate() {
        for (name, value) in ROSTER_FIELDS.iter().zip(cells) {
            fields.insert(format!("Fiduciary_{}_{}", i + 1, name), value);
        }
    }
    fields
}
