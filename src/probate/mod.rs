//! Probate スクレイパーモジュール
//!
//! 日付別一覧から ESTATE 事件を辿り、詳細・受託者・弁護士ページをまとめてCSV用のテーブルにする

pub mod aggregate;
pub mod cross_ref;
pub mod detail;
pub mod html;
pub mod listing;
pub mod pages;
pub mod reconcile;
mod pipeline;
pub mod session;
mod types;

pub use pipeline::{collect_cases, run_on_page, ProbateScraper, ScrapeOutput};
pub use session::{ChromePage, Session};
pub use types::{CanonicalRecord, CaseRow, FieldMap, ResultTable, RunSummary, SkipReason};
