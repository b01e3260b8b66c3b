#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use probate_scraper::probate::RunSummary;
use probate_scraper::{PortalPage, ProgressSink, ScraperConfig, ScraperError};
use scraper::{Html, Selector};

pub const BASE: &str = "http://portal.test/netdata";

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()
}

pub fn listing_url() -> String {
    format!("{}/PBODateInx.ndm/input?string=20240109", BASE)
}

pub fn detail_url(case: &str) -> String {
    format!("{}/PBCaseDetail/{}", BASE, case)
}

pub fn additional_url(case: &str) -> String {
    format!("{}/PBFidDetail.ndm/FID_DETAIL?caseno={};;01", BASE, case)
}

pub fn attorney_url(case: &str) -> String {
    format!("{}/PBAttyDetail.ndm/ATTY_DETAIL?caseno={};;01", BASE, case)
}

pub fn roster_url(case: &str) -> String {
    format!("{}/PBFidy.ndm/input?caseno={};;", BASE, case)
}

pub fn config() -> ScraperConfig {
    ScraperConfig::new()
        .with_base_url(BASE)
        .with_listing_timeout(Duration::from_millis(60))
        .with_page_timeout(Duration::from_millis(60))
        .with_poll_interval(Duration::from_millis(5))
}

/// (case, type) の行を持つ一覧ページ
pub fn listing_html(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, (case, kind))| {
            let color = if i % 2 == 0 { "lightblue" } else { "White" };
            format!(
                r#"<tr bgcolor="{}"><td><a href="{}">{}</a></td><td>DECEDENT {}</td><td>{}</td></tr>"#,
                color,
                detail_url(case),
                case,
                i + 1,
                kind
            )
        })
        .collect();
    format!(
        r#"<html><body><table>
             <tr><th>Case</th><th>Name</th><th>Type</th></tr>
             {}
             <tr><td colspan="3">Back | New Search</td></tr>
           </table></body></html>"#,
        body
    )
}

pub fn header_value_html(pairs: &[(&str, &str)]) -> String {
    let rows: String = pairs
        .iter()
        .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>", k, v))
        .collect();
    format!(
        r#"<html><body><table bgcolor="lightblue">{}</table></body></html>"#,
        rows
    )
}

pub fn primary_html(case: &str, street: &str) -> String {
    header_value_html(&[
        ("Case Number / Suffix", case),
        ("Decedent Street", street),
        ("City", "COLUMBUS"),
        ("State", "OH"),
        ("Zip", "43215"),
        ("Date Opened", "01/09/2024"),
    ])
}

pub fn additional_html(name: &str) -> String {
    header_value_html(&[
        ("Estate Fiduciaries Name", name),
        ("Street", "9 OAK AVE"),
        ("City", "DAYTON"),
        ("State", "OH"),
        ("Zip", "45402"),
        ("Phone Number", "614-555-0100"),
    ])
}

pub fn attorney_html(name: &str) -> String {
    header_value_html(&[
        ("Name", name),
        ("Bar Number", "0042"),
        ("Return", "<a href='/'>Back</a>"),
        ("Links", "<a href='/'>New Search</a> <a href='/'>Homepage</a>"),
    ])
}

pub fn roster_html(rows: &[[&str; 9]]) -> String {
    let body: String = rows
        .iter()
        .map(|cells| {
            let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
            format!(r#"<tr bgcolor="White">{}</tr>"#, tds)
        })
        .collect();
    format!(
        r#"<html><body><table><tr><th>No</th><th>Name</th></tr>{}</table></body></html>"#,
        body
    )
}

/// URL → HTML の固定ページを返すだけのページ
#[derive(Default)]
pub struct FakePortal {
    pages: HashMap<String, String>,
    never_ready: HashSet<String>,
    failing_visits: HashSet<(String, usize)>,
    goto_counts: Mutex<HashMap<String, usize>>,
    current: Mutex<Option<String>>,
    clicked: Mutex<Vec<String>>,
    visited: Mutex<Vec<String>>,
}

impl FakePortal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// 読み込みは成功するが待機対象が現れない
    pub fn never_ready(mut self, url: impl Into<String>) -> Self {
        self.never_ready.insert(url.into());
        self
    }

    /// その URL への `visit` 回目（1始まり）の goto を失敗させる
    pub fn fail_goto(mut self, url: impl Into<String>, visit: usize) -> Self {
        self.failing_visits.insert((url.into(), visit));
        self
    }

    /// 事件1件分の詳細・補助ページを登録
    pub fn case(self, case: &str, street: &str, fiduciary: &str, attorney: &str) -> Self {
        self.page(detail_url(case), primary_html(case, street))
            .page(additional_url(case), additional_html(fiduciary))
            .page(attorney_url(case), attorney_html(attorney))
            .page(
                roster_url(case),
                roster_html(&[[
                    "1",
                    fiduciary,
                    "EX",
                    "EXECUTOR",
                    "01/09/2024",
                    "",
                    "",
                    "0042",
                    attorney,
                ]]),
            )
    }

    pub fn clicked(&self) -> Vec<String> {
        self.clicked.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    fn current_url(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    fn current_html(&self) -> Result<String, ScraperError> {
        let url = self
            .current_url()
            .ok_or_else(|| ScraperError::Navigation("no page loaded".into()))?;
        self.pages
            .get(&url)
            .cloned()
            .ok_or_else(|| ScraperError::Navigation(format!("404: {}", url)))
    }

    fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        if !self.pages.contains_key(url) {
            return Err(ScraperError::Navigation(format!("404: {}", url)));
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl PortalPage for FakePortal {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        let visit = {
            let mut counts = self.goto_counts.lock().unwrap();
            let count = counts.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if self.failing_visits.contains(&(url.to_string(), visit)) {
            return Err(ScraperError::Navigation(format!("connection reset: {}", url)));
        }
        self.navigate(url)
    }

    async fn exists(&self, selector: &str) -> Result<bool, ScraperError> {
        if let Some(url) = self.current_url() {
            if self.never_ready.contains(&url) {
                return Ok(false);
            }
        }
        let html = self.current_html()?;
        let sel = Selector::parse(selector)
            .map_err(|e| ScraperError::ElementNotFound(format!("{:?}", e)))?;
        let found = Html::parse_document(&html).select(&sel).next().is_some();
        Ok(found)
    }

    async fn click_nth(
        &self,
        row_selector: &str,
        index: usize,
        link_selector: &str,
    ) -> Result<(), ScraperError> {
        let html = self.current_html()?;
        let href = {
            let document = Html::parse_document(&html);
            let row_sel = Selector::parse(row_selector).unwrap();
            let link_sel = Selector::parse(link_selector).unwrap();
            document
                .select(&row_sel)
                .nth(index)
                .and_then(|row| row.select(&link_sel).next())
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
                .ok_or_else(|| ScraperError::ElementNotFound(format!("row {}", index + 1)))?
        };
        self.clicked.lock().unwrap().push(href.clone());
        self.navigate(&href)
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.current_html()
    }
}

/// 進捗通知を記録する
#[derive(Default)]
pub struct RecordingProgress {
    pub totals: Mutex<Vec<usize>>,
    pub rows: Mutex<Vec<(usize, usize)>>,
    pub finished: Mutex<usize>,
}

impl ProgressSink for RecordingProgress {
    fn begin(&self, total: usize) {
        self.totals.lock().unwrap().push(total);
    }

    fn row_done(&self, current: usize, total: usize) {
        self.rows.lock().unwrap().push((current, total));
    }

    fn finish(&self, _summary: &RunSummary) {
        *self.finished.lock().unwrap() += 1;
    }
}
