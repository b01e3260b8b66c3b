//! Probate スクレイパーライブラリ
//!
//! - 指定日の Probate 事件一覧から ESTATE 事件を取得
//! - 事件詳細・受託者詳細・弁護士詳細・受託者一覧をマージしてCSVに出力
//!
//! # 使用例
//!
//! ```rust,ignore
//! use chrono::NaiveDate;
//! use probate_scraper::{ProbateService, ScrapeRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ProbateService::new();
//!
//!     let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
//!     let request = ScrapeRequest::new(date).with_headless(true);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("{}: {}", result.file_name, result.summary.status_line());
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod probate;
pub mod service;
pub mod traits;

// 主要な型をリエクスポート
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use probate::{ProbateScraper, ResultTable, RunSummary, ScrapeOutput};
pub use service::{ProbateService, ScrapeRequest, ScrapeResult};
pub use traits::{LogProgress, NullProgress, PortalPage, ProgressSink, Scraper};
