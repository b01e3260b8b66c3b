//! ページ種別と遷移グラフ
//!
//! 一覧 → 詳細（クリック）→ {追加詳細, 弁護士, 受託者一覧}（事件番号から組み立てたURL）→ 一覧

use chrono::NaiveDate;

use crate::error::ScraperError;

/// 一覧・受託者一覧のデータ行マーカー（ヘッダ/フッタ行には付かない）
pub const ROW_MARKER_SELECTOR: &str = "tr[bgcolor='lightblue'], tr[bgcolor='White']";
/// 詳細系ページの見出し/値テーブル
pub const DETAIL_TABLE_SELECTOR: &str = "table[bgcolor='lightblue']";
pub const ROW_LINK_SELECTOR: &str = "a";
/// 以降の補助ページ取得のキー
pub const CASE_NUMBER_FIELD: &str = "Case Number / Suffix";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Listing,
    PrimaryDetail,
    AdditionalDetail,
    Attorney,
    FiduciaryRoster,
}

impl PageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::PrimaryDetail => "case detail",
            Self::AdditionalDetail => "fiduciary detail",
            Self::Attorney => "attorney detail",
            Self::FiduciaryRoster => "fiduciary roster",
        }
    }

    /// 表示完了の判定に使うセレクタ
    pub fn ready_selector(self) -> &'static str {
        match self {
            Self::Listing | Self::FiduciaryRoster => ROW_MARKER_SELECTOR,
            Self::PrimaryDetail | Self::AdditionalDetail | Self::Attorney => DETAIL_TABLE_SELECTOR,
        }
    }

    /// 事件番号から組み立てるURL（補助ページのみ）
    pub fn auxiliary_url(self, base_url: &str, case_number: &str) -> Option<String> {
        let caseno = encode_case_number(case_number);
        match self {
            Self::AdditionalDetail => Some(format!(
                "{}/PBFidDetail.ndm/FID_DETAIL?caseno={};;01",
                base_url, caseno
            )),
            Self::Attorney => Some(format!(
                "{}/PBAttyDetail.ndm/ATTY_DETAIL?caseno={};;01",
                base_url, caseno
            )),
            Self::FiduciaryRoster => Some(format!("{}/PBFidy.ndm/input?caseno={};;", base_url, caseno)),
            Self::Listing | Self::PrimaryDetail => None,
        }
    }

    /// 事件番号のURLで開くページか
    pub fn is_auxiliary(self) -> bool {
        matches!(
            self,
            Self::AdditionalDetail | Self::Attorney | Self::FiduciaryRoster
        )
    }
}

pub fn listing_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/PBODateInx.ndm/input?string={}",
        base_url,
        date.format("%Y%m%d")
    )
}

/// 取得済みの文字列をそのまま使う（空白だけはURLに載らないので置換）
fn encode_case_number(case_number: &str) -> String {
    case_number.trim().replace(' ', "%20")
}

/// 辺ごとの失敗時の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// 実行全体を中断（集めた分は残す）
    AbortRun,
    /// その事件を飛ばして次の行へ
    SkipCase,
    /// そのページだけ欠落させてマージは続ける
    SkipPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchEdge {
    pub from: PageKind,
    pub to: PageKind,
    pub on_failure: OnFailure,
}

/// 実行中の遷移
///
/// 実行開始時の一覧読み込みはここに含まれず、失敗すれば常に実行失敗。
/// 詳細 → 一覧 は次の行に進む前の戻り。
pub const FETCH_GRAPH: &[FetchEdge] = &[
    FetchEdge {
        from: PageKind::Listing,
        to: PageKind::PrimaryDetail,
        on_failure: OnFailure::SkipCase,
    },
    FetchEdge {
        from: PageKind::PrimaryDetail,
        to: PageKind::AdditionalDetail,
        on_failure: OnFailure::SkipPage,
    },
    FetchEdge {
        from: PageKind::PrimaryDetail,
        to: PageKind::Attorney,
        on_failure: OnFailure::SkipPage,
    },
    FetchEdge {
        from: PageKind::PrimaryDetail,
        to: PageKind::FiduciaryRoster,
        on_failure: OnFailure::SkipPage,
    },
    FetchEdge {
        from: PageKind::PrimaryDetail,
        to: PageKind::Listing,
        on_failure: OnFailure::SkipCase,
    },
];

pub fn edges_from(kind: PageKind) -> impl Iterator<Item = &'static FetchEdge> {
    FETCH_GRAPH.iter().filter(move |e| e.from == kind)
}

/// 辺の失敗時の扱い（グラフに無い遷移は中断扱い）
pub fn on_failure(from: PageKind, to: PageKind) -> OnFailure {
    FETCH_GRAPH
        .iter()
        .find(|e| e.from == from && e.to == to)
        .map(|e| e.on_failure)
        .unwrap_or(OnFailure::AbortRun)
}

/// 辺の上で起きた失敗と、その辺の扱い
#[derive(Debug)]
pub struct EdgeFailure {
    pub on_failure: OnFailure,
    pub error: ScraperError,
}

impl EdgeFailure {
    pub fn new(from: PageKind, to: PageKind, error: ScraperError) -> Self {
        Self {
            on_failure: on_failure(from, to),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://probatesearch.franklincountyohio.gov/netdata";

    #[test]
    fn test_listing_url() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(
            listing_url(BASE, date),
            "https://probatesearch.franklincountyohio.gov/netdata/PBODateInx.ndm/input?string=20240109"
        );
    }

    #[test]
    fn test_auxiliary_urls() {
        assert_eq!(
            PageKind::AdditionalDetail.auxiliary_url(BASE, " 612345 ").as_deref(),
            Some("https://probatesearch.franklincountyohio.gov/netdata/PBFidDetail.ndm/FID_DETAIL?caseno=612345;;01")
        );
        assert_eq!(
            PageKind::Attorney.auxiliary_url(BASE, "612345").as_deref(),
            Some("https://probatesearch.franklincountyohio.gov/netdata/PBAttyDetail.ndm/ATTY_DETAIL?caseno=612345;;01")
        );
        assert_eq!(
            PageKind::FiduciaryRoster.auxiliary_url(BASE, "612345").as_deref(),
            Some("https://probatesearch.franklincountyohio.gov/netdata/PBFidy.ndm/input?caseno=612345;;")
        );
        assert_eq!(PageKind::PrimaryDetail.auxiliary_url(BASE, "612345"), None);
    }

    #[test]
    fn test_fetch_graph_shape() {
        let aux: Vec<PageKind> = edges_from(PageKind::PrimaryDetail)
            .filter(|e| e.to.is_auxiliary())
            .map(|e| e.to)
            .collect();
        assert_eq!(
            aux,
            vec![
                PageKind::AdditionalDetail,
                PageKind::Attorney,
                PageKind::FiduciaryRoster
            ]
        );
        assert_eq!(
            on_failure(PageKind::PrimaryDetail, PageKind::Attorney),
            OnFailure::SkipPage
        );
        assert_eq!(
            on_failure(PageKind::Listing, PageKind::PrimaryDetail),
            OnFailure::SkipCase
        );
        assert_eq!(
            on_failure(PageKind::PrimaryDetail, PageKind::Listing),
            OnFailure::SkipCase
        );
        assert_eq!(
            on_failure(PageKind::Attorney, PageKind::Listing),
            OnFailure::AbortRun
        );
    }
}
