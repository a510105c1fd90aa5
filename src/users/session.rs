//! Cookie sessions carried as signed JWTs.
//!
//! The token carries the session; nothing is stored server side. Pages behind
//! [`RequireUser`] still check the account is present and active.

use axum::{
	async_trait,
	extract::FromRequestParts,
	http::{header, request::Parts, HeaderMap},
	response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, state::AppState, users::users::User};

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_URL: &str = "/login/";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	pub sub: String,
	pub username: String,
	pub iat: i64,
	pub exp: i64,
	pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
	pub id: i32,
	pub username: String,
}

pub fn issue_token(user: &User, config: &Config) -> Result<String, jsonwebtoken::errors::Error> {
	let now = Utc::now().timestamp();
	let claims = Claims {
		sub: user.id.to_string(),
		username: user.username.clone(),
		iat: now,
		exp: now + config.session_ttl_secs,
		jti: Uuid::new_v4().to_string(),
	};
	encode(&Header::default(), &claims, &EncodingKey::from_secret(config.session_secret.as_bytes()))
}

/// Invalid, tampered and expired tokens all read as "no session".
pub fn read_token(token: &str, secret: &str) -> Option<SessionUser> {
	let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
		.map_err(|e| log::debug!("rejected session token: {}", e))
		.ok()?;
	let id = data.claims.sub.parse().ok()?;
	Some(SessionUser {
		id,
		username: data.claims.username,
	})
}

pub fn session_cookie(token: &str, ttl_secs: i64) -> String {
	format!("{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}", SESSION_COOKIE, token, ttl_secs)
}

pub fn clear_session_cookie() -> String {
	format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value)
}

/// Only same-site absolute paths are followed after login.
pub fn is_safe_redirect(target: &str) -> bool {
	target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

pub fn redirect_target(next: Option<&str>) -> &str {
	next.filter(|target| is_safe_redirect(target)).unwrap_or("/")
}

/// Login URL that sends the user back to `path` afterwards.
pub fn login_redirect(path: &str) -> String {
	format!("{}?next={}", LOGIN_URL, percent_encode(path))
}

/// Percent-encodes everything outside the unreserved set, keeping `/` so paths stay readable.
pub fn percent_encode(value: &str) -> String {
	let mut encoded = String::with_capacity(value.len());
	for byte in value.bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => encoded.push(byte as char),
			_ => encoded.push_str(&format!("%{:02X}", byte)),
		}
	}
	encoded
}

/// The session user, if the request carries a valid session cookie.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl CurrentUser {
	pub fn is_authenticated(&self) -> bool {
		self.0.is_some()
	}

	pub fn username(&self) -> Option<&str> {
		self.0.as_ref().map(|user| user.username.as_str())
	}
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
	type Rejection = std::convert::Infallible;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let user = cookie_value(&parts.headers, SESSION_COOKIE).and_then(|token| read_token(token, &state.config.session_secret));
		Ok(CurrentUser(user))
	}
}

/// Extractor for pages behind a login. The account is re-read on every request,
/// so a session for a deleted or deactivated user is treated as anonymous.
#[derive(Debug, Clone)]
pub struct RequireUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
	type Rejection = Response;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await.unwrap_or_default();
		let active = match &user {
			Some(session) => match state.store.find_user_by_id(session.id).await {
				Ok(account) => account.filter(|account| account.is_active),
				Err(e) => return Err(e.into_response()),
			},
			None => None,
		};
		match (user, active) {
			(Some(user), Some(_)) => Ok(RequireUser(user)),
			(user, _) => {
				let path = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
				match user {
					Some(user) => log::info!("session for inactive user {} refused at {}", user.id, path),
					None => log::debug!("anonymous request to {}, redirecting to login", path),
				}
				Err(Redirect::to(&login_redirect(path)).into_response())
			}
		}
	}
}
