use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://probatesearch.franklincountyohio.gov/netdata";
pub const DEFAULT_FILE_PREFIX: &str = "ProbateDetails";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// `.../netdata` までのURL（末尾スラッシュなし）
    pub base_url: String,
    pub headless: bool,
    /// タイムアウト時のスクリーンショット出力など
    pub debug: bool,
    /// 未指定なら chromiumoxide の自動検出に任せる
    pub chrome_executable: Option<PathBuf>,
    /// 一覧ページの行マーカー待機上限
    pub listing_timeout: Duration,
    /// 詳細・補助ページの待機上限
    pub page_timeout: Duration,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// `Case Number / Suffix` を出力列に残すか
    pub keep_case_number: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        let chrome_executable = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok()
            .map(PathBuf::from);

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            debug: false,
            chrome_executable,
            listing_timeout: Duration::from_secs(20),
            page_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            output_dir: PathBuf::from("./downloads"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            keep_case_number: true,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_keep_case_number(mut self, keep: bool) -> Self {
        self.keep_case_number = keep;
        self
    }
}
