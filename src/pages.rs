use axum::response::Html;

use crate::{
	templates,
	users::session::{CurrentUser, RequireUser},
};

pub async fn about(user: CurrentUser) -> Html<String> {
	Html(templates::about_page(user.username()))
}

pub async fn services(user: CurrentUser) -> Html<String> {
	Html(templates::services_page(user.username()))
}

/// Contact details are only shown to signed-in visitors.
pub async fn contact(RequireUser(user): RequireUser) -> Html<String> {
	Html(templates::contact_page(&user.username))
}
