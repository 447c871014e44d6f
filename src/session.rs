use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Redirect, Response};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";

/// Per-client state carried between requests. Two keys drive the flow:
/// `pending_email` (set at registration, read at OTP verification) and
/// `authenticated_email` (set at login, read at the protected page).
/// `flash` holds a one-shot message consumed by the next page render.
#[derive(Debug, Default, Clone)]
pub struct SessionData {
    pub pending_email: Option<String>,
    pub authenticated_email: Option<String>,
    pub flash: Option<String>,
}

/// Server-side session store keyed by an opaque token.
///
/// No expiry or logout: sessions live as long as the store does.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: Uuid) -> Option<SessionData>;
    async fn save(&self, token: Uuid, data: SessionData);
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<Uuid, SessionData>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: Uuid) -> Option<SessionData> {
        self.inner.read().await.get(&token).cloned()
    }

    async fn save(&self, token: Uuid, data: SessionData) {
        self.inner.write().await.insert(token, data);
    }
}

/// A client session resolved from the `sid` cookie, or freshly minted when
/// the cookie is absent or unknown. Responses built through this handle
/// persist the (possibly mutated) data back to the store and set the cookie
/// on fresh sessions.
pub struct Session {
    token: Uuid,
    fresh: bool,
    pub data: SessionData,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn take_flash(&mut self) -> Option<String> {
        self.data.flash.take()
    }

    pub async fn redirect(self, target: &str) -> Response {
        self.store.save(self.token, self.data.clone()).await;
        self.finish(Redirect::to(target).into_response())
    }

    pub async fn redirect_with_flash(mut self, message: &str, target: &str) -> Response {
        self.data.flash = Some(message.to_string());
        self.redirect(target).await
    }

    pub async fn render(self, html: String) -> Response {
        self.store.save(self.token, self.data.clone()).await;
        self.finish(Html(html).into_response())
    }

    fn finish(&self, mut res: Response) -> Response {
        if self.fresh {
            let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.token);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                res.headers_mut().append(SET_COOKIE, value);
            }
        }
        res
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, SESSION_COOKIE)
            .and_then(|v| Uuid::parse_str(&v).ok());

        if let Some(token) = token {
            if let Some(data) = state.sessions.load(token).await {
                return Ok(Session {
                    token,
                    fresh: false,
                    data,
                    store: state.sessions.clone(),
                });
            }
        }

        Ok(Session {
            token: Uuid::new_v4(),
            fresh: true,
            data: SessionData::default(),
            store: state.sessions.clone(),
        })
    }
}

/// Read a cookie value out of request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
