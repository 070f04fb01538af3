use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam};
use log::warn;
use serde::{Deserialize, Serialize};

pub const SESSION_FILE: &str = "session.json";

/// One persisted browser cookie. Restored cookies live for the browser run
/// only, so the expiry is not carried over.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
}

impl From<&Cookie> for SessionCookie {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            http_only: cookie.http_only,
            secure: cookie.secure,
        }
    }
}

impl SessionCookie {
    fn into_param(self) -> Option<CookieParam> {
        CookieParam::builder()
            .name(self.name)
            .value(self.value)
            .domain(self.domain)
            .path(self.path)
            .http_only(self.http_only)
            .secure(self.secure)
            .build()
            .ok()
    }
}

/// Whole-file persistence of the authenticated session. No locking and no
/// staleness checks; a session the portal has invalidated only surfaces as
/// an empty catalog on the next run.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Overwrites the session file with the current cookie set.
    pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
        let cookies: Vec<SessionCookie> = cookies.iter().map(SessionCookie::from).collect();
        let json = serde_json::to_string_pretty(&cookies)?;
        fs_err::write(&self.path, json)
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        Ok(())
    }

    /// Loads the stored cookies. A missing, unreadable or corrupt file just
    /// means there is no session and the operator has to log in again.
    pub fn load(&self) -> Option<Vec<CookieParam>> {
        let data = match fs_err::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("⚠️ セッションファイルを読み込めませんでした: {e}");
                return None;
            }
        };
        let cookies: Vec<SessionCookie> = match serde_json::from_str(&data) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("⚠️ セッションファイルが壊れています: {e}");
                return None;
            }
        };
        Some(
            cookies
                .into_iter()
                .filter_map(SessionCookie::into_param)
                .collect(),
        )
    }
}
