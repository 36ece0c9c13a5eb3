use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Serialize;

use crate::api::session::{clear_cookie, read_cookie};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl NoticeLevel {
    fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Danger => "danger",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(NoticeLevel::Success),
            "info" => Some(NoticeLevel::Info),
            "warning" => Some(NoticeLevel::Warning),
            "danger" => Some(NoticeLevel::Danger),
            _ => None,
        }
    }
}

/// One-shot message shown on the page a redirect lands on.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Danger, message)
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.level.as_str(), urlencoding::encode(&self.message))
    }

    fn decode(value: &str) -> Option<Self> {
        let (level, message) = value.split_once(':')?;
        let level = NoticeLevel::parse(level)?;
        let message = urlencoding::decode(message).ok()?.into_owned();
        Some(Self { level, message })
    }
}

/// Serializes a view that carries the pending notice, clearing the notice
/// so it shows once.
pub fn view_with_notice<T, F>(headers: &HeaderMap, view: F) -> Response
where
    T: Serialize,
    F: FnOnce(Option<Notice>) -> T,
{
    let pending = read_cookie(headers, FLASH_COOKIE);
    let notice = pending.as_deref().and_then(Notice::decode);

    let mut response = Json(view(notice)).into_response();
    if pending.is_some() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_cookie(FLASH_COOKIE));
    }
    response
}

pub fn redirect_with_notice(to: &str, notice: Notice) -> Response {
    let mut response = Redirect::to(to).into_response();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        notice.encode()
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
