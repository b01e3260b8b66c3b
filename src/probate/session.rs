//! ブラウザセッション（1回の実行で1つ）

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::NaiveDate;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::PortalPage;

use super::pages::{listing_url, PageKind};

/// セレクタが現れるまで待機
///
/// 上限を超えたら `Timeout`。デバッグ時はスクリーンショットをログに残す。
pub async fn wait_for_page<P: PortalPage + ?Sized>(
    page: &P,
    kind: PageKind,
    timeout: Duration,
    config: &ScraperConfig,
) -> Result<(), ScraperError> {
    let selector = kind.ready_selector();
    let start = Instant::now();

    loop {
        match page.exists(selector).await {
            Ok(true) => {
                debug!("{} 表示完了 ({:?})", kind.label(), start.elapsed());
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => debug!("{} のセレクタ確認エラー: {}", kind.label(), e),
        }

        if start.elapsed() >= timeout {
            if config.debug {
                if let Some(png) = page.screenshot_base64().await {
                    debug!("{} タイムアウト時のスクリーンショット: data:image/png;base64,{}", kind.label(), png);
                }
            }
            return Err(ScraperError::timeout(kind.label(), timeout));
        }

        sleep(config.poll_interval).await;
    }
}

/// 一覧ページを開いて行マーカーの表示を待つ
///
/// ここでの失敗は実行全体の失敗。
pub async fn open_listing<P: PortalPage + ?Sized>(
    page: &P,
    config: &ScraperConfig,
    date: NaiveDate,
) -> Result<(), ScraperError> {
    let url = listing_url(&config.base_url, date);
    debug!("一覧ページへ移動: {}", url);
    page.goto(&url).await?;
    wait_for_page(page, PageKind::Listing, config.listing_timeout, config).await
}

/// chromiumoxide の Page を `PortalPage` として扱う
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl PortalPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn exists(&self, selector: &str) -> Result<bool, ScraperError> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        let script = format!("document.querySelector({}) !== null", quoted);
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    async fn click_nth(
        &self,
        row_selector: &str,
        index: usize,
        link_selector: &str,
    ) -> Result<(), ScraperError> {
        let rows = self
            .page
            .find_elements(row_selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", row_selector, e)))?;
        let row = rows.get(index).ok_or_else(|| {
            ScraperError::ElementNotFound(format!(
                "row {} of {} ({} rows)",
                index + 1,
                row_selector,
                rows.len()
            ))
        })?;

        row.find_element(link_selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("row {} link: {}", index + 1, e)))?
            .click()
            .await
            .map_err(|e| ScraperError::Navigation(format!("row {} click: {}", index + 1, e)))?;

        if let Err(e) = self.page.wait_for_navigation().await {
            debug!("クリック後の遷移待ちに失敗: {}", e);
        }
        Ok(())
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.page
            .content()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))
    }

    async fn screenshot_base64(&self) -> Option<String> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .ok()
            .map(|png| base64::engine::general_purpose::STANDARD.encode(png))
    }
}

/// ブラウザ・コンテキスト・ページをまとめて所有する
pub struct Session {
    browser: Browser,
    context_id: Option<BrowserContextId>,
    page: ChromePage,
    handler: JoinHandle<()>,
}

impl Session {
    /// ブラウザを起動し、独立したコンテキストに一覧ページを開く
    pub async fn open(config: &ScraperConfig, date: NaiveDate) -> Result<Self, ScraperError> {
        let session = Self::launch(config).await?;

        let opened = open_listing(session.page(), config, date).await;
        if let Err(e) = opened {
            warn!("一覧ページの読み込みに失敗: {}", e);
            if let Err(close_err) = session.close().await {
                debug!("一覧失敗後のブラウザ終了に失敗: {}", close_err);
            }
            return Err(e);
        }

        info!("一覧ページ読み込み完了: {}", date.format("%Y%m%d"));
        Ok(session)
    }

    async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("ブラウザを初期化中...");

        let mut builder = BrowserConfig::builder();
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(config.page_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        });

        let context_id = match browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("独立コンテキストを作成できないため既定を使用: {}", e);
                None
            }
        };

        let mut target = CreateTargetParams::builder().url("about:blank");
        if let Some(id) = &context_id {
            target = target.browser_context_id(id.clone());
        }
        let page = match target.build() {
            Ok(target) => browser.new_page(target).await.map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    debug!("ページ作成失敗後のブラウザ終了に失敗: {}", close_err);
                }
                if let Err(wait_err) = browser.wait().await {
                    debug!("ブラウザプロセスの回収に失敗: {}", wait_err);
                }
                handler.abort();
                return Err(ScraperError::BrowserInit(e));
            }
        };

        info!("ブラウザ初期化完了");
        Ok(Self {
            browser,
            context_id,
            page: ChromePage::new(page),
            handler,
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// ブラウザを終了してプロセスを回収する
    pub async fn close(mut self) -> Result<(), ScraperError> {
        info!("ブラウザを終了中...");

        if let Some(id) = self.context_id.take() {
            if let Err(e) = self.browser.dispose_browser_context(id).await {
                debug!("ブラウザコンテキストの破棄に失敗: {}", e);
            }
        }

        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::BrowserInit(format!("browser close: {}", e)));
        if let Err(e) = self.browser.wait().await {
            debug!("ブラウザプロセスの回収に失敗: {}", e);
        }
        self.handler.abort();

        info!("ブラウザ終了");
        closed
    }
}
