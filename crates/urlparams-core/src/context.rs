//! Per-invocation call context

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

/// Identity of a registered handler, e.g. `"shop.views.product_detail"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(Arc<str>);

impl HandlerId {
	pub fn new(id: impl AsRef<str>) -> Self {
		Self(Arc::from(id.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for HandlerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for HandlerId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for HandlerId {
	fn from(id: String) -> Self {
		Self::new(id)
	}
}

/// Opaque handle to the in-flight request.
///
/// The converter layer never inspects the request; converters that need it
/// downcast to the web layer's concrete type.
#[derive(Clone)]
pub struct RequestHandle(Arc<dyn Any + Send + Sync>);

impl RequestHandle {
	pub fn new<T: Any + Send + Sync>(request: T) -> Self {
		Self(Arc::new(request))
	}

	/// A placeholder request, for tests and offline conversion.
	pub fn empty() -> Self {
		Self::new(())
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}
}

impl fmt::Debug for RequestHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("RequestHandle(..)")
	}
}

/// Named options supplied where a handler is registered.
///
/// # Examples
///
/// ```
/// use urlparams_core::Options;
/// use serde_json::json;
///
/// let defaults = Options::new().with("redirect", json!("/login/"));
/// let site = Options::new().with("redirect", json!("/shop/")).with("strict", json!(true));
///
/// let merged = defaults.merged(&site);
/// assert_eq!(merged.get_str("redirect"), Some("/shop/"));
/// assert_eq!(merged.get_bool("strict"), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(HashMap<String, JsonValue>);

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
		self.0.insert(key.into(), value)
	}

	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.0.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(JsonValue::as_str)
	}

	pub fn get_bool(&self, key: &str) -> Option<bool> {
		self.get(key).and_then(JsonValue::as_bool)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Returns a copy of `self` updated with `other`; `other` wins on
	/// conflicting keys.
	pub fn merged(&self, other: &Options) -> Options {
		let mut merged = self.clone();
		merged
			.0
			.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		merged
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}
}

impl FromIterator<(String, JsonValue)> for Options {
	fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Context visible to every converter run for one handler invocation.
///
/// Created fresh for each invocation and dropped when it completes. Not
/// `Clone`.
#[derive(Debug)]
pub struct CallContext {
	request: RequestHandle,
	handler: HandlerId,
	options: Arc<Options>,
}

impl CallContext {
	pub fn new(request: RequestHandle, handler: HandlerId, options: Arc<Options>) -> Self {
		Self {
			request,
			handler,
			options,
		}
	}

	/// A context with an empty request and no options.
	pub fn detached(handler: impl Into<HandlerId>) -> Self {
		Self::new(RequestHandle::empty(), handler.into(), Arc::new(Options::new()))
	}

	pub fn request(&self) -> &RequestHandle {
		&self.request
	}

	pub fn handler(&self) -> &HandlerId {
		&self.handler
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn option(&self, key: &str) -> Option<&JsonValue> {
		self.options.get(key)
	}

	pub fn option_str(&self, key: &str) -> Option<&str> {
		self.options.get_str(key)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	struct FakeRequest {
		path: &'static str,
	}

	#[rstest]
	fn test_request_handle_downcast() {
		// Arrange
		let handle = RequestHandle::new(FakeRequest { path: "/shop/7/" });

		// Act
		let request = handle.downcast_ref::<FakeRequest>();

		// Assert
		assert_eq!(request.map(|r| r.path), Some("/shop/7/"));
		assert!(handle.downcast_ref::<String>().is_none());
	}

	#[rstest]
	fn test_call_context_exposes_options() {
		// Arrange
		let options = Arc::new(Options::new().with("redirect", json!("/login/")));
		let ctx = CallContext::new(RequestHandle::empty(), HandlerId::new("shop.index"), options);

		// Assert
		assert_eq!(ctx.handler().as_str(), "shop.index");
		assert_eq!(ctx.option_str("redirect"), Some("/login/"));
		assert!(ctx.option("missing").is_none());
	}

	#[rstest]
	fn test_options_merge_last_wins() {
		// Arrange
		let base = Options::new().with("a", json!(1)).with("b", json!(2));
		let over = Options::new().with("b", json!(3));

		// Act
		let merged = base.merged(&over);

		// Assert
		assert_eq!(merged.len(), 2);
		assert_eq!(merged.get("a"), Some(&json!(1)));
		assert_eq!(merged.get("b"), Some(&json!(3)));
		assert_eq!(base.get("b"), Some(&json!(2)));
	}
}
