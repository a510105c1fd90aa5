//! Splitting a result set into fixed-size pages.
//!
//! `Paginator::get_page` never fails: a missing or non-integer page number
//! selects the first page and an out-of-range number selects the nearest
//! valid page. `Paginator::page` is the strict variant.

use std::ops::RangeInclusive;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
	#[error("that page number is not an integer")]
	NotAnInteger,

	#[error("that page number is less than 1")]
	LessThanOne,

	#[error("that page contains no results")]
	NoResults,
}

#[derive(Debug, Clone)]
pub struct Paginator<T> {
	items: Vec<T>,
	per_page: usize,
	orphans: usize,
	allow_empty_first_page: bool,
}

impl<T> Paginator<T> {
	/// `per_page` is raised to 1 when given as 0.
	pub fn new(items: Vec<T>, per_page: usize) -> Self {
		Paginator {
			items,
			per_page: per_page.max(1),
			orphans: 0,
			allow_empty_first_page: true,
		}
	}

	/// A trailing page holding `orphans` items or fewer is folded into the page before it.
	pub fn orphans(mut self, orphans: usize) -> Self {
		self.orphans = orphans;
		self
	}

	pub fn allow_empty_first_page(mut self, allow: bool) -> Self {
		self.allow_empty_first_page = allow;
		self
	}

	pub fn count(&self) -> usize {
		self.items.len()
	}

	pub fn num_pages(&self) -> usize {
		let count = self.count();
		if count == 0 && !self.allow_empty_first_page {
			return 0;
		}
		let hits = count.saturating_sub(self.orphans).max(1);
		hits.div_ceil(self.per_page)
	}

	pub fn page_range(&self) -> RangeInclusive<usize> {
		1..=self.num_pages()
	}

	pub fn validate_number(&self, raw: &str) -> Result<usize, PageError> {
		let raw = raw.trim();
		let number: i64 = match raw.parse() {
			Ok(number) => number,
			Err(_) if is_integer_literal(raw) && raw.starts_with('-') => return Err(PageError::LessThanOne),
			Err(_) if is_integer_literal(raw) => return Err(PageError::NoResults),
			Err(_) => return Err(PageError::NotAnInteger),
		};
		if number < 1 {
			return Err(PageError::LessThanOne);
		}
		let number = usize::try_from(number).map_err(|_| PageError::NoResults)?;
		if number > self.num_pages() && !(number == 1 && self.allow_empty_first_page) {
			return Err(PageError::NoResults);
		}
		Ok(number)
	}

	/// Strict page lookup.
	pub fn page(self, number: usize) -> Result<Page<T>, PageError> {
		let number = self.validate_number(&number.to_string())?;
		Ok(self.slice(number))
	}

	pub fn get_page(self, raw: Option<&str>) -> Page<T> {
		let number = match raw.map(|raw| self.validate_number(raw)) {
			Some(Ok(number)) => number,
			None | Some(Err(PageError::NotAnInteger)) | Some(Err(PageError::LessThanOne)) => 1,
			Some(Err(PageError::NoResults)) => self.num_pages().max(1),
		};
		self.slice(number)
	}

	fn slice(self, number: usize) -> Page<T> {
		let count = self.count();
		let num_pages = self.num_pages();
		let bottom = ((number - 1) * self.per_page).min(count);
		let mut top = bottom + self.per_page;
		if top + self.orphans >= count {
			top = count;
		}
		let items: Vec<T> = self.items.into_iter().skip(bottom).take(top - bottom).collect();

		Page {
			items,
			number,
			num_pages,
			count,
			per_page: self.per_page,
		}
	}
}

/// Optional sign followed by digits only, whatever its magnitude.
fn is_integer_literal(raw: &str) -> bool {
	let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
	!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub number: usize,
	pub num_pages: usize,
	pub count: usize,
	per_page: usize,
}

impl<T> Page<T> {
	pub fn has_next(&self) -> bool {
		self.number < self.num_pages
	}

	pub fn has_previous(&self) -> bool {
		self.number > 1
	}

	pub fn has_other_pages(&self) -> bool {
		self.has_next() || self.has_previous()
	}

	pub fn next_page_number(&self) -> Option<usize> {
		self.has_next().then(|| self.number + 1)
	}

	pub fn previous_page_number(&self) -> Option<usize> {
		self.has_previous().then(|| self.number - 1)
	}

	/// 1-based index of the first item on this page, 0 for an empty result set.
	pub fn start_index(&self) -> usize {
		if self.count == 0 {
			return 0;
		}
		self.per_page * (self.number - 1) + 1
	}

	pub fn end_index(&self) -> usize {
		if self.count == 0 {
			return 0;
		}
		self.start_index() + self.items.len() - 1
	}

	pub fn page_range(&self) -> RangeInclusive<usize> {
		1..=self.num_pages
	}
}
