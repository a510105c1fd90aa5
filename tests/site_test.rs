use std::sync::Arc;

use axum::{
	body::{to_bytes, Body},
	http::{header, Request, StatusCode},
	response::Response,
	Router,
};
use car_showroom::{
	app,
	cars::cars::Car,
	config::{Config, DbBackend},
	encryption_engine::hash_password,
	state::AppState,
	store::{MemoryStore, Store},
	users::users::User,
};
use serde_json::Value;
use tower::ServiceExt;

fn car(id: i32, is_main: bool) -> Car {
	Car {
		id,
		name: format!("Model {}", (b'A' + id as u8 - 1) as char),
		description: format!("Description of car {}", id),
		price: 10_000.0 + id as f64,
		image: None,
		is_main,
	}
}

fn user(id: i32, username: &str, password: &str, is_active: bool) -> User {
	User {
		id,
		username: username.to_owned(),
		email: String::new(),
		password: hash_password(password).unwrap(),
		is_active,
	}
}

fn test_config() -> Config {
	Config {
		db_backend: DbBackend::Memory,
		session_secret: "integration-secret".to_owned(),
		cars_per_page: 4,
		media_dir: std::env::temp_dir().join(format!("car-showroom-media-{}", uuid::Uuid::new_v4())),
		..Config::default()
	}
}

fn create_test_app(cars: Vec<Car>, users: Vec<User>) -> (Router, Arc<MemoryStore>, Config) {
	let memory = Arc::new(MemoryStore::new(cars).with_users(users));
	let config = test_config();
	let router = app(AppState::new(Store::Memory(memory.clone()), config.clone()));
	(router, memory, config)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
	Request::builder().uri(uri).header(header::COOKIE, cookie).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
	if let Some(cookie) = cookie {
		builder = builder.header(header::COOKIE, cookie);
	}
	builder.body(Body::from(form.to_owned())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
	app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
	response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

fn set_cookie(response: &Response) -> Option<String> {
	response
		.headers()
		.get(header::SET_COOKIE)
		.map(|value| value.to_str().unwrap().to_owned())
}

async fn login_cookie(app: &Router) -> String {
	let response = send(app, post_form("/login/", "username=alice&password=s3cret-pass", None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	let cookie = set_cookie(&response).expect("login sets a session cookie");
	cookie.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn homepage_shows_three_cars_and_the_main_car() {
	let cars = (1..=5).map(|id| car(id, id == 4)).collect();
	let (app, _, _) = create_test_app(cars, Vec::new());

	let response = send(&app, get("/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	let html = body_text(response).await;

	for name in ["Model A", "Model B", "Model C"] {
		assert!(html.contains(name), "missing {}", name);
	}
	assert!(!html.contains("Model E"));
	assert!(html.contains("<section class=\"main-car\">\n<h1>Model D</h1>"));
}

#[tokio::test]
async fn homepage_without_main_car_still_renders() {
	let (app, _, _) = create_test_app(vec![car(1, false)], Vec::new());

	let response = send(&app, get("/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	let html = body_text(response).await;
	assert!(html.contains("Welcome to our showroom"));
	assert!(html.contains("Model A"));
}

#[tokio::test]
async fn homepage_with_empty_showroom_renders() {
	let (app, _, _) = create_test_app(Vec::new(), Vec::new());

	let response = send(&app, get("/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("No cars in the showroom yet."));
}

#[tokio::test]
async fn catalog_clamps_out_of_range_page_to_last() {
	let cars = (1..=10).map(|id| car(id, false)).collect();
	let (app, _, _) = create_test_app(cars, Vec::new());

	// 10 cars, 4 per page: 3 pages
	let response = send(&app, get("/cars/?page=8")).await;
	assert_eq!(response.status(), StatusCode::OK);
	let html = body_text(response).await;
	assert!(html.contains("Page 3 of 3"));
	assert!(html.contains("Model I"));
	assert!(html.contains("Model J"));
	assert!(!html.contains("Model A"));
}

#[tokio::test]
async fn catalog_non_numeric_page_shows_first_page() {
	let cars = (1..=10).map(|id| car(id, false)).collect();
	let (app, _, _) = create_test_app(cars, Vec::new());

	for uri in ["/cars/?page=abc", "/cars/", "/cars/?page="] {
		let html = body_text(send(&app, get(uri)).await).await;
		assert!(html.contains("Page 1 of 3"), "{}", uri);
		assert!(html.contains("Model D"), "{}", uri);
		assert!(!html.contains("Model E"), "{}", uri);
	}
}

#[tokio::test]
async fn api_catalog_reports_page_metadata() {
	let cars = (1..=10).map(|id| car(id, false)).collect();
	let (app, _, _) = create_test_app(cars, Vec::new());

	let response = send(&app, get("/api/cars/?page=99")).await;
	assert_eq!(response.status(), StatusCode::OK);
	let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
	assert_eq!(json["page"], 3);
	assert_eq!(json["num_pages"], 3);
	assert_eq!(json["count"], 10);
	assert_eq!(json["has_next"], false);
	assert_eq!(json["has_previous"], true);
	assert_eq!(json["cars"].as_array().unwrap().len(), 2);
	assert_eq!(json["cars"][0]["id"], 9);

	let json: Value = serde_json::from_str(&body_text(send(&app, get("/api/cars/?page=99999999999999999999")).await).await).unwrap();
	assert_eq!(json["page"], 3);
	assert_eq!(json["cars"][0]["id"], 9);

	let json: Value = serde_json::from_str(&body_text(send(&app, get("/api/cars/?page=x")).await).await).unwrap();
	assert_eq!(json["page"], 1);
	assert_eq!(json["cars"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn car_detail_renders_or_404s() {
	let (app, _, _) = create_test_app(vec![car(1, false), car(2, true)], Vec::new());

	let response = send(&app, get("/cars/2/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("Description of car 2"));

	assert_eq!(send(&app, get("/cars/42/")).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(send(&app, get("/cars/abc/")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_pages_render_for_everyone() {
	let (app, _, _) = create_test_app(Vec::new(), Vec::new());

	for uri in ["/about/", "/services/", "/register/done/"] {
		assert_eq!(send(&app, get(uri)).await.status(), StatusCode::OK, "{}", uri);
	}
	assert_eq!(send(&app, get("/no-such-page/")).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_requires_login() {
	let (app, _, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);

	let response = send(&app, get("/contact/")).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/login/?next=/contact/");

	let cookie = login_cookie(&app).await;
	let response = send(&app, get_with_cookie("/contact/", &cookie)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("Hi alice"));
}

#[tokio::test]
async fn deactivated_account_loses_its_session() {
	let (app, memory, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);
	let cookie = login_cookie(&app).await;
	assert_eq!(send(&app, get_with_cookie("/contact/", &cookie)).await.status(), StatusCode::OK);

	assert!(memory.set_active(1, false).await);
	let response = send(&app, get_with_cookie("/contact/", &cookie)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/login/?next=/contact/");

	let response = send(&app, post_form("/logout/", "", Some(&cookie))).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn forged_session_cookie_is_anonymous() {
	let (app, _, _) = create_test_app(Vec::new(), Vec::new());

	let response = send(&app, get_with_cookie("/contact/", "sessionid=not-a-token")).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_redirects_to_safe_next_target() {
	let (app, _, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);

	let response = send(&app, post_form("/login/", "username=alice&password=s3cret-pass&next=%2Fcontact%2F", None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/contact/");
	let cookie = set_cookie(&response).unwrap();
	assert!(cookie.starts_with("sessionid="));
	assert!(cookie.contains("HttpOnly"));

	let response = send(&app, post_form("/login/", "username=alice&password=s3cret-pass&next=%2F%2Fevil.example", None)).await;
	assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn login_with_bad_credentials_rerenders_form() {
	let (app, _, _) = create_test_app(
		Vec::new(),
		vec![user(1, "alice", "s3cret-pass", true), user(2, "bob", "s3cret-pass", false)],
	);

	for form in ["username=alice&password=wrong-pass", "username=nobody&password=s3cret-pass", "username=bob&password=s3cret-pass", ""] {
		let response = send(&app, post_form("/login/", form, None)).await;
		assert_eq!(response.status(), StatusCode::OK, "{}", form);
		assert!(set_cookie(&response).is_none(), "{}", form);
		assert!(body_text(response).await.contains("Please enter a correct username and password."), "{}", form);
	}
}

#[tokio::test]
async fn authenticated_user_is_redirected_away_from_login() {
	let (app, _, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);
	let cookie = login_cookie(&app).await;

	let response = send(&app, get_with_cookie("/login/", &cookie)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/");

	let response = send(&app, get_with_cookie("/login/?next=/cars/", &cookie)).await;
	assert_eq!(location(&response), "/cars/");

	let response = send(&app, get("/login/")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("<form method=\"post\" action=\"/login/\">"));
}

#[tokio::test]
async fn logout_clears_session() {
	let (app, _, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);

	let response = send(&app, get("/logout/")).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/login/?next=/logout/");

	let cookie = login_cookie(&app).await;
	let response = send(&app, post_form("/logout/", "", Some(&cookie))).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
	assert!(body_text(response).await.contains("You have been logged out"));
}

#[tokio::test]
async fn registration_creates_account_and_redirects() {
	let (app, memory, _) = create_test_app(Vec::new(), Vec::new());

	let response = send(&app, get("/register/")).await;
	assert_eq!(response.status(), StatusCode::OK);

	let form = "username=carol&email=carol%40example.com&password1=s3cret-pass&password2=s3cret-pass";
	let response = send(&app, post_form("/register/", form, None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/register/done/");
	assert_eq!(memory.user_count().await, 1);

	let response = send(&app, post_form("/login/", "username=carol&password=s3cret-pass", None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_ignores_surrounding_whitespace_in_username() {
	let (app, _, _) = create_test_app(Vec::new(), Vec::new());

	let form = "username=+carol+&password1=s3cret-pass&password2=s3cret-pass";
	let response = send(&app, post_form("/register/", form, None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);

	let response = send(&app, post_form("/login/", "username=+carol+&password=s3cret-pass", None)).await;
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert!(set_cookie(&response).unwrap().starts_with("sessionid="));
}

#[tokio::test]
async fn registration_with_mismatched_passwords_creates_nothing() {
	let (app, memory, _) = create_test_app(Vec::new(), Vec::new());

	let form = "username=carol&password1=s3cret-pass&password2=different-pass";
	let response = send(&app, post_form("/register/", form, None)).await;
	assert_eq!(response.status(), StatusCode::OK);
	let html = body_text(response).await;
	assert!(html.contains("The two password fields didn&#x27;t match."));
	assert!(html.contains("value=\"carol\""));
	assert_eq!(memory.user_count().await, 0);
}

#[tokio::test]
async fn registration_rejects_taken_username() {
	let (app, memory, _) = create_test_app(Vec::new(), vec![user(1, "alice", "s3cret-pass", true)]);

	let form = "username=Alice&password1=an0ther-pass&password2=an0ther-pass";
	let response = send(&app, post_form("/register/", form, None)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("A user with that username already exists."));
	assert_eq!(memory.user_count().await, 1);
}

#[tokio::test]
async fn media_files_are_served_from_media_dir() {
	let (app, _, config) = create_test_app(Vec::new(), Vec::new());
	tokio::fs::create_dir_all(config.media_dir.join("cars")).await.unwrap();
	tokio::fs::write(config.media_dir.join("cars/golf.png"), b"not really a png").await.unwrap();

	let response = send(&app, get("/media/cars/golf.png")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
	assert_eq!(body_text(response).await, "not really a png");

	assert_eq!(send(&app, get("/media/cars/missing.png")).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(send(&app, get("/media/cars/../../etc/passwd")).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(send(&app, get("/media/cars")).await.status(), StatusCode::NOT_FOUND);

	tokio::fs::remove_dir_all(&config.media_dir).await.unwrap();
}
