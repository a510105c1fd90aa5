use std::collections::BTreeMap;

use axum::{
	extract::{Form, State},
	response::{Html, IntoResponse, Redirect, Response},
};
use postgres_from_row::FromRow;
use tokio_postgres::error::SqlState;

use crate::{
	db_client::DbClient,
	encryption_engine::hash_password,
	error::AppError,
	state::AppState,
	templates,
	users::session::CurrentUser,
};

pub const REGISTER_DONE_URL: &str = "/register/done/";

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

const USER_COLUMNS: &str = "id, username, email, password, is_active";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
	pub id: i32,
	pub username: String,
	pub email: String,
	/// Argon2id PHC string, see [`crate::encryption_engine::hash_password`].
	pub password: String,
	pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub email: String,
	pub password: String,
}

pub async fn find_user(db: &DbClient, username: &str) -> Result<Option<User>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM users WHERE username=$1", USER_COLUMNS);
	let row = db.query_opt(q.as_str(), &[&username]).await?;
	row.as_ref().map(User::try_from_row).transpose()
}

pub async fn user_by_id(db: &DbClient, id: i32) -> Result<Option<User>, tokio_postgres::Error> {
	let q = format!("SELECT {} FROM users WHERE id=$1", USER_COLUMNS);
	let row = db.query_opt(q.as_str(), &[&id]).await?;
	row.as_ref().map(User::try_from_row).transpose()
}

pub async fn username_taken(db: &DbClient, username: &str) -> Result<bool, tokio_postgres::Error> {
	let row = db
		.query_one("SELECT EXISTS(SELECT 1 FROM users WHERE lower(username)=lower($1))", &[&username])
		.await?;
	row.try_get(0)
}

/// `Ok(None)` when the unique constraint on `username` rejects the row.
pub async fn insert_user(db: &DbClient, new_user: &NewUser) -> Result<Option<User>, tokio_postgres::Error> {
	let statement = format!(
		"INSERT INTO users (username,email,password,is_active) VALUES ($1,$2,$3,TRUE) RETURNING {}",
		USER_COLUMNS
	);
	match db.query_one(statement.as_str(), &[&new_user.username, &new_user.email, &new_user.password]).await {
		Ok(row) => User::try_from_row(&row).map(Some),
		Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Ok(None),
		Err(e) => Err(e),
	}
}

/// Field name to error messages, in field order of the form.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

#[derive(serde::Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct RegisterForm {
	pub username: String,
	pub email: String,
	pub password1: String,
	pub password2: String,
}

impl RegisterForm {
	/// Checks everything that does not need the store.
	pub fn validate(&self) -> FieldErrors {
		let mut errors = FieldErrors::new();
		let mut add = |field: &'static str, message: &str| errors.entry(field).or_default().push(message.to_owned());

		let username = self.username.trim();
		if username.is_empty() {
			add("username", "This field is required.");
		} else if username.chars().count() > USERNAME_MAX_LEN {
			add("username", "Ensure this value has at most 150 characters.");
		} else if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
			add("username", "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.");
		}

		let email = self.email.trim();
		if !email.is_empty() && !is_valid_email(email) {
			add("email", "Enter a valid email address.");
		}

		if self.password1.is_empty() {
			add("password1", "This field is required.");
		}
		if self.password2.is_empty() {
			add("password2", "This field is required.");
		} else if !self.password1.is_empty() && self.password1 != self.password2 {
			add("password2", "The two password fields didn't match.");
		} else if !self.password1.is_empty() {
			let password = self.password2.as_str();
			if password.chars().count() < PASSWORD_MIN_LEN {
				add("password2", "This password is too short. It must contain at least 8 characters.");
			}
			if password.chars().all(|c| c.is_ascii_digit()) {
				add("password2", "This password is entirely numeric.");
			}
			if password.eq_ignore_ascii_case(username) {
				add("password2", "The password is too similar to the username.");
			}
		}

		errors
	}

	fn into_new_user(self) -> anyhow::Result<NewUser> {
		let password = hash_password(&self.password1).map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;
		Ok(NewUser {
			username: self.username.trim().to_owned(),
			email: self.email.trim().to_owned(),
			password,
		})
	}
}

fn is_valid_email(email: &str) -> bool {
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& !email.chars().any(char::is_whitespace)
		&& domain.split('.').count() > 1
		&& domain.split('.').all(|label| !label.is_empty())
}

pub async fn register_form(user: CurrentUser) -> Html<String> {
	Html(templates::register_page(user.username(), &RegisterForm::default(), &FieldErrors::new()))
}

pub async fn register(State(state): State<AppState>, user: CurrentUser, Form(form): Form<RegisterForm>) -> Result<Response, AppError> {
	let mut errors = form.validate();
	if !errors.contains_key("username") && state.store.username_taken(form.username.trim()).await? {
		errors.entry("username").or_default().push(DUPLICATE_USERNAME.to_owned());
	}
	if !errors.is_empty() {
		log::info!("registration rejected for `{}`: {:?}", form.username, errors.keys().collect::<Vec<_>>());
		return Ok(Html(templates::register_page(user.username(), &form, &errors)).into_response());
	}

	let shown = form.clone();
	match state.store.create_user(form.into_new_user()?).await? {
		Some(account) => {
			log::info!("registered user {} (`{}`)", account.id, account.username);
			Ok(Redirect::to(REGISTER_DONE_URL).into_response())
		}
		None => {
			errors.entry("username").or_default().push(DUPLICATE_USERNAME.to_owned());
			Ok(Html(templates::register_page(user.username(), &shown, &errors)).into_response())
		}
	}
}

pub async fn register_done(user: CurrentUser) -> Html<String> {
	Html(templates::register_done_page(user.username()))
}
