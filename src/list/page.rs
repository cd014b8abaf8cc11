//! Pure pagination and filtering helpers.

// self
use crate::list::ListItem;

/// One rendered page of a (possibly filtered) list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageView<I> {
	/// Items on this page.
	pub items: Vec<I>,
	/// 1-based page number.
	pub page: usize,
	/// Maximum items per page.
	pub page_size: usize,
	/// Items across all pages.
	pub total_items: usize,
	/// Number of pages; zero for an empty list.
	pub total_pages: usize,
}
impl<I> PageView<I> {
	/// Page numbers for the pagination controls (`1..=total_pages`).
	pub fn page_numbers(&self) -> std::ops::RangeInclusive<usize> {
		1..=self.total_pages
	}

	/// Returns `true` when the page has no items.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

/// Number of pages needed for `total_items` at `page_size` per page.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
	if page_size == 0 { 0 } else { total_items.div_ceil(page_size) }
}

/// Slices `items` into the 1-based `page`. Page `0` is treated as page `1`; pages past the end
/// are empty.
pub fn paginate<I>(items: &[I], page: usize, page_size: usize) -> PageView<I>
where
	I: Clone,
{
	let page = page.max(1);
	let start = (page - 1).saturating_mul(page_size).min(items.len());
	let end = start.saturating_add(page_size).min(items.len());

	PageView {
		items: items[start..end].to_vec(),
		page,
		page_size,
		total_items: items.len(),
		total_pages: total_pages(items.len(), page_size),
	}
}

/// Keeps items whose search text contains `query`, ignoring case. An empty query keeps all.
pub fn filter_items<I>(items: &[I], query: &str) -> Vec<I>
where
	I: ListItem,
{
	let needle = query.to_lowercase();

	if needle.is_empty() {
		return items.to_vec();
	}

	items.iter().filter(|item| item.search_text().to_lowercase().contains(&needle)).cloned().collect()
}
