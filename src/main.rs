#![warn(clippy::pedantic)]

mod browser;
mod session;

use std::io::{Write, stdin, stdout};
use std::process::ExitCode;

use anyhow::{Context, Result};
use attendance::aggregate::sort_for_report;
use attendance::extract::{self, SubjectAttendance};
use attendance::report::Report;
use attendance::semester::Semester;
use attendance::{Counts, Subject, catalog};
use chrono::{Datelike, Local};
use log::{error, info, warn};

use browser::{LESSON_CONTAINER, LIST_URL, PORTAL_URL, Portal, SELECTOR_TIMEOUT, SUBJECT_TABLE};
use session::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match run().await {
        Ok(()) => {
            info!("✅ 処理完了!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    info!("🚀 出席情報取得スクリプトを開始しました");
    let today = Local::now().date_naive();
    let semester = Semester::from_date(today);

    let mut portal = Portal::launch().await?;
    // The browser is released even when the scrape bails out early.
    let result = scrape(&mut portal, semester, today.month()).await;
    portal.close().await?;
    result
}

async fn scrape(portal: &mut Portal, semester: Semester, month: u32) -> Result<()> {
    let store = SessionStore::new(session::SESSION_FILE);
    match store.load() {
        Some(cookies) => {
            info!("✅ セッションを復元しました: {}", session::SESSION_FILE);
            portal.restore_cookies(cookies).await?;
            info!("📄 授業一覧ページに移動中...");
            portal.goto(LIST_URL).await?;
            portal
                .wait_for_selector(SUBJECT_TABLE, SELECTOR_TIMEOUT)
                .await;
        }
        None => {
            info!("📄 ログインページに移動中...");
            portal.goto(PORTAL_URL).await?;
            info!("🔐 Googleログインをブラウザで完了してください。");
            info!("👉 トップページ ({LIST_URL}) に移動したら Enter を押してください。");
            wait_for_operator()?;
            store.save(&portal.cookies().await?)?;
            info!("✅ セッションを保存しました: {}", session::SESSION_FILE);
            portal.wait_for_navigation().await;
        }
    }

    portal.adopt_latest_page().await?;

    info!("🎓 対象学期: {semester}");
    let subjects = match portal.subject_rows().await {
        Ok(rows) => catalog::subjects(rows, &semester.label()),
        Err(e) => {
            warn!("❌ 授業一覧の取得中にエラーが発生しました: {e}");
            Vec::new()
        }
    };

    if subjects.is_empty() {
        warn!("❌ 授業一覧が取得できませんでした");
        return Ok(());
    }

    info!("📚 {semester}の授業を{}件見つけました:", subjects.len());
    for (i, subject) in subjects.iter().enumerate() {
        match subject.slot {
            Some(slot) => info!("  {}. {slot} {}", i + 1, subject.name),
            None => info!("  {}. {}", i + 1, subject.name),
        }
    }

    let total = subjects.len();
    info!("🚀 {total}件の授業の出席情報を取得中...");

    let mut results = Vec::new();
    for (i, subject) in subjects.iter().enumerate() {
        info!("🔄 [{}/{total}] {} を処理中...", i + 1, subject.name);
        match fetch_subject(portal, subject, semester).await {
            Some(attendance) => {
                results.push(attendance);
                info!("✅ [{}/{total}] 完了", i + 1);
            }
            None => warn!("❌ [{}/{total}] 失敗", i + 1),
        }
        if i + 1 < total {
            return_to_listing(portal, &subject.name).await;
        }
    }

    if results.is_empty() {
        warn!("❌ 出席情報を取得できませんでした");
        return Ok(());
    }

    sort_for_report(&mut results, month);
    let report = Report::new(&results, total);
    write!(stdout(), "{report}").context("failed to write report")?;
    Ok(())
}

/// One subject: click into its detail page, snapshot the attendance
/// containers and fold them into counts. Every failure here stays local to
/// the subject; the loop moves on.
async fn fetch_subject(
    portal: &Portal,
    subject: &Subject,
    semester: Semester,
) -> Option<SubjectAttendance> {
    match portal.click_by_id(&subject.handle).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("❌ ボタンが見つかりませんでした: {}", subject.handle);
            return None;
        }
        Err(e) => {
            warn!("❌ エラー: {e}");
            return None;
        }
    }
    portal.wait_for_navigation().await;
    portal
        .wait_for_selector(LESSON_CONTAINER, SELECTOR_TIMEOUT)
        .await;
    portal.settle().await;

    let raw = match portal.lesson_snapshots().await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("❌ エラー: {e}");
            return None;
        }
    };
    info!("✅ {}件取得", raw.len());

    let lessons = extract::lessons(&raw);
    if lessons.is_empty() {
        warn!("⚠️ 出席情報が見つかりませんでした");
        return None;
    }

    let attendance = SubjectAttendance::collect(subject, lessons, semester)?;
    let Counts {
        attended,
        absent,
        implemented,
        ..
    } = attendance.counts;
    info!("📈 出席{attended}, 欠席{absent}, 実施{implemented}");
    Some(attendance)
}

async fn return_to_listing(portal: &Portal, subject: &str) {
    info!("🔄 授業一覧に戻り中...");
    if let Err(e) = portal.goto(LIST_URL).await {
        warn!("⚠️ [{subject}] 授業一覧ページに戻る際にエラーが発生しました: {e}。続行します...");
        return;
    }
    portal
        .wait_for_selector(SUBJECT_TABLE, SELECTOR_TIMEOUT)
        .await;
    portal.settle().await;
}

/// The login itself is the operator's job; the run blocks here until they
/// confirm the portal reached its top page.
fn wait_for_operator() -> Result<()> {
    let mut line = String::new();
    stdin()
        .read_line(&mut line)
        .context("failed to read operator confirmation")?;
    Ok(())
}
