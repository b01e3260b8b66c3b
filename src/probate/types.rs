//! Probate スクレイパーの型定義

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ページ単位の 見出し → 値
pub type FieldMap = HashMap<String, String>;

/// 一覧ページの1行
///
/// `position` は同じ一覧DOM内でしか意味を持たない。ナビゲーション後は一覧を
/// 取り直してから使うこと。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRow {
    /// 行マーカーで選んだ行の中での位置（0始まり）
    pub position: usize,
    pub case_type: String,
    /// リンク先（ログ用、クリックは position で行う）
    pub link: Option<String>,
}

impl CaseRow {
    pub fn is_estate(&self) -> bool {
        self.case_type.contains("ESTATE")
    }
}

/// 1事件分のマージ済みレコード（正規フィールド名 → 値）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(HashMap<String, String>);

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<FieldMap> for CanonicalRecord {
    fn from(map: FieldMap) -> Self {
        Self(map)
    }
}

/// 出力テーブル（列は確定済み、作成後は変更しない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 行・列名で値を取得
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// 事件をスキップした理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// 詳細に `Case Number / Suffix` が無い
    MissingJoinKey,
    /// 詳細テーブルが表示されなかった
    Timeout(String),
    /// クリック失敗など
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingJoinKey => write!(f, "missing case number"),
            Self::Timeout(page) => write!(f, "timed out waiting for {}", page),
            Self::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// 1回の実行結果のまとめ
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    /// 行マーカー付きの全行数
    pub listed_rows: usize,
    /// ESTATE 行数
    pub qualifying_rows: usize,
    pub processed: usize,
    /// (一覧上の行番号 1始まり, 理由)
    pub skipped: Vec<(usize, SkipReason)>,
    /// 補助ページのスキップなど
    pub page_warnings: Vec<String>,
    /// 出力列のうち今回の結果に存在しなかったもの
    pub missing_columns: Vec<String>,
    /// 一覧への復帰に失敗して途中で打ち切った
    pub aborted_early: bool,
}

impl RunSummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            listed_rows: 0,
            qualifying_rows: 0,
            processed: 0,
            skipped: Vec::new(),
            page_warnings: Vec::new(),
            missing_columns: Vec::new(),
            aborted_early: false,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty() || !self.page_warnings.is_empty() || self.aborted_early
    }

    pub fn status_line(&self) -> String {
        if self.processed == 0 {
            return format!("No data available for {}", self.date.format("%Y-%m-%d"));
        }
        if self.is_partial() {
            format!(
                "Scraping completed with warnings: {} entries ({} skipped rows, {} page warnings)",
                self.processed,
                self.skipped.len(),
                self.page_warnings.len()
            )
        } else {
            format!("Scraping completed! Total entries: {}", self.processed)
        }
    }
}
