use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("タイムアウト: {page} ({waited:?}以内に表示されませんでした)")]
    Timeout { page: String, waited: Duration },

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("事件番号が取得できません: {0}")]
    MissingJoinKey(String),

    #[error("不正なテーブル行: {0}")]
    MalformedRow(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("CSV出力エラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ScraperError {
    pub fn timeout(page: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            page: page.into(),
            waited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_page() {
        let err = ScraperError::timeout("listing", Duration::from_secs(20));
        assert!(matches!(&err, ScraperError::Timeout { page, .. } if page == "listing"));
        assert!(err.to_string().contains("listing"));
    }
}
