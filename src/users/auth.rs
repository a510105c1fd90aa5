use axum::{
	extract::{Form, Query, State},
	http::header,
	response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
	encryption_engine::verify_password,
	error::AppError,
	state::AppState,
	templates,
	users::session::{clear_session_cookie, issue_token, redirect_target, session_cookie, CurrentUser, RequireUser},
};

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(serde::Deserialize, Debug, Default)]
pub struct NextQuery {
	next: Option<String>,
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(default)]
pub struct LoginForm {
	username: String,
	password: String,
	next: Option<String>,
}

pub async fn login_form(user: CurrentUser, Query(query): Query<NextQuery>) -> Response {
	if user.is_authenticated() {
		return Redirect::to(redirect_target(query.next.as_deref())).into_response();
	}
	Html(templates::login_page("", query.next.as_deref(), None)).into_response()
}

pub async fn login(State(state): State<AppState>, user: CurrentUser, Form(form): Form<LoginForm>) -> Result<Response, AppError> {
	if user.is_authenticated() {
		return Ok(Redirect::to(redirect_target(form.next.as_deref())).into_response());
	}

	let username = form.username.trim();
	let account = if username.is_empty() || form.password.is_empty() {
		None
	} else {
		state.store.find_user(username).await?
	};

	match account.filter(|account| account.is_active && verify_password(&form.password, &account.password)) {
		Some(account) => {
			let token = issue_token(&account, &state.config)?;
			log::info!("user {} logged in", account.id);
			Ok((
				[(header::SET_COOKIE, session_cookie(&token, state.config.session_ttl_secs))],
				Redirect::to(redirect_target(form.next.as_deref())),
			)
				.into_response())
		}
		None => {
			log::info!("failed login for `{}`", username);
			Ok(Html(templates::login_page(username, form.next.as_deref(), Some(INVALID_LOGIN))).into_response())
		}
	}
}

pub async fn logout(RequireUser(user): RequireUser) -> Response {
	log::info!("user {} logged out", user.id);
	([(header::SET_COOKIE, clear_session_cookie())], Html(templates::logout_page())).into_response()
}
