//! HTML rendering for every page of the site.
//!
//! Each page function returns a complete document built on [`layout`].
//! Every value that comes from the store or the request goes through
//! [`escape`].

use std::fmt::Write;

use hyper::StatusCode;

use crate::{
	cars::cars::Car,
	pagination::Page,
	users::{
		session::percent_encode,
		users::{FieldErrors, RegisterForm},
	},
};

const SITE_NAME: &str = "Car Showroom";

pub fn escape(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

fn layout(title: &str, user: Option<&str>, body: &str) -> String {
	let account = match user {
		Some(username) => format!(
			r#"<span class="greeting">Hello, {}</span> <a href="/logout/">Log out</a>"#,
			escape(username)
		),
		None => r#"<a href="/login/">Log in</a> <a href="/register/">Register</a>"#.to_owned(),
	};
	format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {site}</title>
</head>
<body>
<header>
<nav>
<a href="/">Home</a>
<a href="/cars/">Cars</a>
<a href="/about/">About</a>
<a href="/services/">Services</a>
<a href="/contact/">Contact</a>
</nav>
<div class="account">{account}</div>
</header>
<main>
{body}
</main>
<footer>&copy; {site}</footer>
</body>
</html>
"#,
		title = escape(title),
		site = SITE_NAME,
		account = account,
		body = body,
	)
}

fn car_image(car: &Car) -> String {
	match &car.image {
		Some(image) if !image.is_empty() => format!(r#"<img src="/media/{}" alt="{}">"#, escape(&percent_encode(image)), escape(&car.name)),
		_ => r#"<div class="no-image">No photo yet</div>"#.to_owned(),
	}
}

fn car_card(car: &Car) -> String {
	format!(
		r#"<article class="car">
{image}
<h3><a href="/cars/{id}/">{name}</a></h3>
<p class="price">${price:.2}</p>
</article>
"#,
		image = car_image(car),
		id = car.id,
		name = escape(&car.name),
		price = car.price,
	)
}

pub fn index_page(user: Option<&str>, cars: &[Car], main_car: Option<&Car>) -> String {
	let mut body = String::new();
	match main_car {
		Some(car) => {
			let _ = write!(
				body,
				r#"<section class="main-car">
<h1>{name}</h1>
{image}
<p>{description}</p>
<p class="price">${price:.2}</p>
<a href="/cars/{id}/">See details</a>
</section>
"#,
				name = escape(&car.name),
				image = car_image(car),
				description = escape(&car.description),
				price = car.price,
				id = car.id,
			);
		}
		None => body.push_str("<section class=\"main-car empty\"><h1>Welcome to our showroom</h1></section>\n"),
	}

	body.push_str("<section class=\"recent\">\n<h2>Latest arrivals</h2>\n");
	if cars.is_empty() {
		body.push_str("<p>No cars in the showroom yet.</p>\n");
	}
	for car in cars {
		body.push_str(&car_card(car));
	}
	body.push_str("<a href=\"/cars/\">Browse all cars</a>\n</section>");

	layout("Home", user, &body)
}

fn page_link(number: usize, label: &str) -> String {
	format!(r#"<a href="/cars/?page={}">{}</a>"#, number, label)
}

pub fn cars_page(user: Option<&str>, page: &Page<Car>) -> String {
	let mut body = String::from("<h1>Our cars</h1>\n");
	if page.items.is_empty() {
		body.push_str("<p>No cars in the showroom yet.</p>\n");
	}
	body.push_str("<section class=\"catalog\">\n");
	for car in &page.items {
		body.push_str(&car_card(car));
	}
	body.push_str("</section>\n");

	if page.has_other_pages() {
		body.push_str("<nav class=\"pagination\">\n");
		if let Some(previous) = page.previous_page_number() {
			body.push_str(&page_link(1, "&laquo; first"));
			body.push_str(&page_link(previous, "previous"));
		}
		let _ = write!(body, "<span class=\"current\">Page {} of {}</span>", page.number, page.num_pages);
		if let Some(next) = page.next_page_number() {
			body.push_str(&page_link(next, "next"));
			body.push_str(&page_link(page.num_pages, "last &raquo;"));
		}
		body.push_str("\n</nav>");
	}

	layout("Cars", user, &body)
}

pub fn car_detail_page(user: Option<&str>, car: &Car) -> String {
	let body = format!(
		r#"<article class="car-detail">
<h1>{name}</h1>
{image}
<p>{description}</p>
<p class="price">${price:.2}</p>
</article>
<a href="/cars/">Back to all cars</a>"#,
		name = escape(&car.name),
		image = car_image(car),
		description = escape(&car.description),
		price = car.price,
	);
	layout(&car.name, user, &body)
}

pub fn about_page(user: Option<&str>) -> String {
	layout(
		"About",
		user,
		"<h1>About us</h1>\n<p>A family-run dealership selling hand-picked new and used cars. Every car on our lot is inspected before it is listed.</p>",
	)
}

pub fn services_page(user: Option<&str>) -> String {
	layout(
		"Services",
		user,
		"<h1>Services</h1>\n<ul>\n<li>Sales of new and used cars</li>\n<li>Trade-in valuation</li>\n<li>Financing and leasing</li>\n<li>Servicing and maintenance</li>\n</ul>",
	)
}

pub fn contact_page(user: &str) -> String {
	let body = format!(
		"<h1>Contact us</h1>\n<p>Hi {}, reach our sales team at sales@carshowroom.example or visit us Monday to Saturday, 9:00 to 18:00.</p>",
		escape(user)
	);
	layout("Contact", Some(user), &body)
}

fn next_field(next: Option<&str>) -> String {
	next.map(|next| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(next)))
		.unwrap_or_default()
}

pub fn login_page(username: &str, next: Option<&str>, error: Option<&str>) -> String {
	let error = error.map(|error| format!("<p class=\"error\">{}</p>\n", escape(error))).unwrap_or_default();
	let body = format!(
		r#"<h1>Log in</h1>
{error}<form method="post" action="/login/">
<label>Username <input type="text" name="username" value="{username}" maxlength="150" required></label>
<label>Password <input type="password" name="password" required></label>
{next}
<button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register/">Register</a></p>"#,
		error = error,
		username = escape(username),
		next = next_field(next),
	);
	layout("Log in", None, &body)
}

pub fn logout_page() -> String {
	layout(
		"Logged out",
		None,
		"<h1>You have been logged out</h1>\n<p><a href=\"/login/\">Log in again</a></p>",
	)
}

fn field_errors(errors: &FieldErrors, field: &str) -> String {
	errors
		.get(field)
		.map(|messages| {
			let items: String = messages.iter().map(|message| format!("<li>{}</li>", escape(message))).collect();
			format!("<ul class=\"errorlist\">{}</ul>", items)
		})
		.unwrap_or_default()
}

pub fn register_page(user: Option<&str>, form: &RegisterForm, errors: &FieldErrors) -> String {
	let body = format!(
		r#"<h1>Create an account</h1>
<form method="post" action="/register/">
{username_errors}<label>Username <input type="text" name="username" value="{username}" maxlength="150" required></label>
{email_errors}<label>Email <input type="email" name="email" value="{email}"></label>
{password1_errors}<label>Password <input type="password" name="password1" required></label>
{password2_errors}<label>Password confirmation <input type="password" name="password2" required></label>
<button type="submit">Register</button>
</form>"#,
		username_errors = field_errors(errors, "username"),
		username = escape(&form.username),
		email_errors = field_errors(errors, "email"),
		email = escape(&form.email),
		password1_errors = field_errors(errors, "password1"),
		password2_errors = field_errors(errors, "password2"),
	);
	layout("Register", user, &body)
}

pub fn register_done_page(user: Option<&str>) -> String {
	layout(
		"Registered",
		user,
		"<h1>Registration complete</h1>\n<p>Your account is ready. <a href=\"/login/\">Log in</a> to continue.</p>",
	)
}

pub fn error_page(status: StatusCode) -> String {
	let title = status.canonical_reason().unwrap_or("Error");
	let body = format!("<h1>{} {}</h1>\n<p><a href=\"/\">Back to the homepage</a></p>", status.as_u16(), title);
	layout(title, None, &body)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pagination::Paginator;

	fn car(id: i32, name: &str) -> Car {
		Car {
			id,
			name: name.to_owned(),
			description: "Low mileage".to_owned(),
			price: 12500.0,
			image: Some(format!("cars/{}.jpg", id)),
			is_main: false,
		}
	}

	#[test]
	fn escapes_markup() {
		assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;");
	}

	#[test]
	fn image_paths_are_url_encoded() {
		let mut odd = car(1, "Golf");
		odd.image = Some("cars/red car#1\"x.jpg".to_owned());
		let html = car_detail_page(None, &odd);
		assert!(html.contains(r#"src="/media/cars/red%20car%231%22x.jpg""#));
	}

	#[test]
	fn car_names_are_escaped() {
		let html = index_page(None, &[car(1, "<script>alert(1)</script>")], None);
		assert!(!html.contains("<script>"));
		assert!(html.contains("&lt;script&gt;"));
	}

	#[test]
	fn homepage_without_main_car_renders_placeholder() {
		let html = index_page(None, &[], None);
		assert!(html.contains("Welcome to our showroom"));
		assert!(html.contains("No cars in the showroom yet."));
	}

	#[test]
	fn catalog_renders_navigation_only_when_needed() {
		let single = Paginator::new(vec![car(1, "Golf")], 4).get_page(None);
		assert!(!cars_page(None, &single).contains("class=\"pagination\""));

		let cars: Vec<Car> = (1..=9).map(|id| car(id, "Polo")).collect();
		let middle = Paginator::new(cars, 4).get_page(Some("2"));
		let html = cars_page(None, &middle);
		assert!(html.contains("Page 2 of 3"));
		assert!(html.contains(r#"href="/cars/?page=1""#));
		assert!(html.contains(r#"href="/cars/?page=3""#));
	}

	#[test]
	fn register_page_lists_field_errors() {
		let mut errors = FieldErrors::new();
		errors.insert("password2", vec!["The two password fields didn't match.".to_owned()]);
		let html = register_page(None, &RegisterForm::default(), &errors);
		assert!(html.contains("The two password fields didn&#x27;t match."));
	}

	#[test]
	fn layout_shows_account_links() {
		assert!(about_page(Some("alice")).contains("Hello, alice"));
		assert!(about_page(None).contains(r#"href="/login/""#));
	}
}
