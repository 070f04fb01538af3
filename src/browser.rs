use std::time::Duration;

use attendance::{RawLesson, RawRow};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use log::{info, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

pub const PORTAL_URL: &str = "https://myportal.osakac.ac.jp/";
pub const LIST_URL: &str = "https://myportal.osakac.ac.jp/m/mycontent/list.xhtml";

pub const SUBJECT_TABLE: &str = "table.main_table";
pub const LESSON_CONTAINER: &str = "div.contents_state";

/// Wait budget for page transitions.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(8);
/// Wait budget for an element or a new tab to show up.
pub const SELECTOR_TIMEOUT: Duration = Duration::from_secs(5);
/// Fixed delay letting the page settle before querying it.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to configure browser: {0}")]
    Config(String),
    #[error("browser call failed: {0}")]
    Cdp(#[from] CdpError),
    #[error("page query returned an unexpected shape: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Snapshot query over the subject listing table. Presence of the semester
/// cell, the subject cell and the navigation button is required; semester
/// filtering and slot parsing happen on the typed rows afterwards.
const SUBJECT_ROWS_QUERY: &str = "\
() => {
    const results = [];
    const rows = document.querySelectorAll('table.main_table tbody tr');
    rows.forEach((row, index) => {
        const semesterCell = row.querySelector('td.hide_xs');
        const subjectCell = row.querySelector('td.mb_disp');
        const button = row.querySelector(\"button[id*='form-list-']\");
        if (!semesterCell || !subjectCell || !button) return;
        results.push({
            semester: semesterCell.textContent.trim(),
            subject: subjectCell.textContent.trim(),
            buttonId: button.id,
            cells: Array.from(row.querySelectorAll('td'), td => td.textContent.trim()),
            index: index,
        });
    });
    return results;
}";

/// Snapshot query over the attendance containers of a detail page. The
/// status is the icon title when present; otherwise the ― glyph somewhere
/// in the container marks the lesson as not held.
const LESSON_QUERY: &str = "\
() => {
    const results = [];
    document.querySelectorAll('div.contents_state').forEach(el => {
        const label = el.querySelector('div.contents_name');
        if (!label) return;
        const img = el.querySelector('img');
        let status = '―';
        if (img && img.getAttribute('title')) {
            status = img.getAttribute('title');
        } else {
            for (const div of el.querySelectorAll('div')) {
                if (div.textContent && div.textContent.includes('―')) {
                    status = '―';
                    break;
                }
            }
        }
        results.push({ lesson: label.textContent.trim(), status: status });
    });
    return results;
}";

/// Sequential driver of the single browsing session. Every wait is bounded
/// and degrades to a warning; the subsequent query runs against whatever
/// state the page reached.
pub struct Portal {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Portal {
    /// Launches a visible browser; the login step needs an operator.
    pub async fn launch() -> Result<Self, Error> {
        let config = BrowserConfig::builder()
            .with_head()
            .build()
            .map_err(Error::Config)?;
        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        let page = browser.new_page("about:blank").await?;
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Navigates and waits for the page to go idle.
    pub async fn goto(&self, url: &str) -> Result<(), Error> {
        self.page.goto(url).await?;
        self.wait_for_navigation().await;
        Ok(())
    }

    pub async fn wait_for_navigation(&self) {
        match timeout(NAVIGATION_TIMEOUT, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("⚠️ ページ遷移の待機に失敗しました: {e}。続行します..."),
            Err(_) => warn!("⚠️ ページ遷移でタイムアウトしました。続行します..."),
        }
    }

    /// Polls until the selector resolves or the budget runs out. A missing
    /// element is a warning, never fatal.
    pub async fn wait_for_selector(&self, selector: &str, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                warn!("⚠️ 要素 {selector} の読み込みでタイムアウトしました。続行します...");
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn settle(&self) {
        sleep(SETTLE_DELAY).await;
    }

    async fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T, Error> {
        let value = self.page.evaluate_function(expression).await?.into_value()?;
        Ok(value)
    }

    pub async fn subject_rows(&self) -> Result<Vec<RawRow>, Error> {
        self.evaluate(SUBJECT_ROWS_QUERY).await
    }

    pub async fn lesson_snapshots(&self) -> Result<Vec<RawLesson>, Error> {
        self.evaluate(LESSON_QUERY).await
    }

    /// Clicks the element with the given id, reporting whether it existed.
    pub async fn click_by_id(&self, id: &str) -> Result<bool, Error> {
        let expression = format!(
            "() => {{
                const el = document.getElementById('{id}');
                if (!el) return false;
                el.click();
                return true;
            }}"
        );
        self.evaluate(&expression).await
    }

    /// Switches to a newly opened tab if one shows up within the budget,
    /// otherwise keeps driving the newest existing page.
    pub async fn adopt_latest_page(&mut self) -> Result<(), Error> {
        let known = self.browser.pages().await?.len();
        let deadline = Instant::now() + SELECTOR_TIMEOUT;
        loop {
            let pages = self.browser.pages().await?;
            let appeared = pages.len() > known;
            if appeared {
                info!("🔄 新しいタブを検出しました。");
            } else if Instant::now() < deadline {
                sleep(POLL_INTERVAL).await;
                continue;
            } else {
                info!("🔄 新しいタブは検出されませんでした。現在のページを使用します。");
            }
            if let Some(page) = pages.into_iter().next_back() {
                self.page = page;
            }
            if appeared {
                self.wait_for_navigation().await;
            }
            return Ok(());
        }
    }

    /// Cookies of the current browsing context, for session persistence.
    pub async fn cookies(&self) -> Result<Vec<Cookie>, Error> {
        Ok(self.page.get_cookies().await?)
    }

    pub async fn restore_cookies(&self, cookies: Vec<CookieParam>) -> Result<(), Error> {
        self.page.set_cookies(cookies).await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), Error> {
        self.browser.close().await?;
        let _ = self.handler.await;
        Ok(())
    }
}
