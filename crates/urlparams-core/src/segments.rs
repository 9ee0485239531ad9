//! Raw URL path segments

/// Ordered path segments handed over by the router.
///
/// Indexing past the end yields the empty string instead of panicking, so
/// converters never need to check the length.
///
/// # Examples
///
/// ```
/// use urlparams_core::RawSegments;
///
/// let segments = RawSegments::from(vec!["111", "222"]);
/// assert_eq!(segments.get(1), "222");
/// assert_eq!(segments.get(50), "");
/// assert!(!segments.contains(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSegments(Vec<String>);

impl RawSegments {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the segment at `index`, or `""` when out of range.
	pub fn get(&self, index: usize) -> &str {
		self.0.get(index).map(String::as_str).unwrap_or("")
	}

	/// Returns `true` when the router actually supplied a segment at `index`.
	pub fn contains(&self, index: usize) -> bool {
		index < self.0.len()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl From<Vec<String>> for RawSegments {
	fn from(segments: Vec<String>) -> Self {
		Self(segments)
	}
}

impl From<Vec<&str>> for RawSegments {
	fn from(segments: Vec<&str>) -> Self {
		segments.into_iter().collect()
	}
}

impl<S: Into<String>> FromIterator<S> for RawSegments {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	fn test_empty_segments_yield_empty_string() {
		// Arrange
		let segments = RawSegments::new();

		// Assert
		assert_eq!(segments.get(0), "");
		assert!(segments.is_empty());
	}

	#[rstest]
	fn test_empty_segment_is_still_contained() {
		// Arrange
		let segments = RawSegments::from(vec!["", "x"]);

		// Assert
		assert!(segments.contains(0));
		assert_eq!(segments.get(0), "");
		assert_eq!(segments.iter().collect::<Vec<_>>(), vec!["", "x"]);
	}

	proptest! {
		#[test]
		fn prop_out_of_range_is_empty(
			segments in proptest::collection::vec("[a-z0-9-]{0,6}", 0..8),
			extra in 0usize..100,
		) {
			let raw: RawSegments = segments.iter().cloned().collect();
			let index = segments.len() + extra;
			prop_assert_eq!(raw.get(index), "");
			prop_assert!(!raw.contains(index));
		}
	}
}
