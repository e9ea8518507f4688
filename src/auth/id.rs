//! Strongly typed application identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const APP_ID_MAX_LEN: usize = 128;

/// Error returned when application id validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Application id cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Application id contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Application id exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Platform application id identifying one tenant.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);
impl AppId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for AppId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AppId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AppId> for String {
	fn from(value: AppId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AppId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for AppId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AppId({})", self.0)
	}
}
impl Display for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AppId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > APP_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: APP_ID_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn app_ids_reject_blank_and_whitespace() {
		assert_eq!(AppId::new(""), Err(IdentifierError::Empty));
		assert_eq!(AppId::new(" wx123"), Err(IdentifierError::ContainsWhitespace));
		assert_eq!(AppId::new("wx\u{00A0}123"), Err(IdentifierError::ContainsWhitespace));

		let app_id = AppId::new("wx6c8124f1fbafb1f3").expect("App id fixture should be valid.");

		assert_eq!(app_id.as_ref(), "wx6c8124f1fbafb1f3");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let app_id: AppId =
			serde_json::from_str("\"wx42\"").expect("App id should deserialize successfully.");

		assert_eq!(&*app_id, "wx42");
		assert!(serde_json::from_str::<AppId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<AppId>(&format!("\"{}\"", "a".repeat(129))).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<AppId, u8> = HashMap::from_iter([(
			AppId::new("wx-lookup").expect("App id used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("wx-lookup"), Some(&7));
	}
}
