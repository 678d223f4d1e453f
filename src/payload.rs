//! Payment payload construction.
//!
//! The encoder treats the result as opaque bytes. Nothing here validates
//! addresses; values are only escaped where the payment apps expect it.

use core::fmt::{self, Display, Formatter};

/// Longest UPI id kept, in bytes.
pub const MAX_UPI_ID_LEN: usize = 63;

/// Cuts `s` down to at most `max` bytes without splitting a character.
pub(crate) fn truncate_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replaces every space with `%20`. All other bytes pass through unchanged.
///
///     use upiqr::payload::escape_spaces;
///
///     assert_eq!(escape_spaces("Alice Doe"), "Alice%20Doe");
pub fn escape_spaces(value: &str) -> String {
    value.replace(' ', "%20")
}

/// A virtual payment address such as `alice@examplebank`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpiId(String);

impl UpiId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        UpiId(truncate_to(&id, MAX_UPI_ID_LEN).to_owned())
    }

    /// Joins a username and a bank handle.
    ///
    ///     use upiqr::UpiId;
    ///
    ///     assert_eq!(UpiId::from_parts("alice", "examplebank").as_str(), "alice@examplebank");
    pub fn from_parts(username: &str, bank: &str) -> Self {
        Self::new(format!("{username}@{bank}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UpiId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `scheme://authority?key=value&...` URI. Values are written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUri {
    pub scheme: String,
    pub authority: String,
    pub params: Vec<(String, String)>,
}

impl PaymentUri {
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

impl Display for PaymentUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// The fields of a `upi://pay` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub payee_address: UpiId,
    pub payee_name: Option<String>,
    pub currency: String,
}

impl PaymentRequest {
    pub const DEFAULT_NAME: &'static str = "Payment";
    pub const DEFAULT_CURRENCY: &'static str = "INR";

    pub fn new(payee_address: impl Into<String>, payee_name: Option<&str>) -> Self {
        Self {
            payee_address: UpiId::new(payee_address),
            payee_name: payee_name.map(str::to_owned),
            currency: Self::DEFAULT_CURRENCY.to_owned(),
        }
    }

    /// The payee name as displayed by the paying app. Missing or empty names
    /// fall back to `Payment`.
    pub fn display_name(&self) -> &str {
        match self.payee_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => Self::DEFAULT_NAME,
        }
    }

    ///     use upiqr::PaymentRequest;
    ///
    ///     let request = PaymentRequest::new("alice@examplebank", Some("Alice Doe"));
    ///     assert_eq!(
    ///         request.to_uri().to_string(),
    ///         "upi://pay?pa=alice@examplebank&pn=Alice%20Doe&cu=INR"
    ///     );
    pub fn to_uri(&self) -> PaymentUri {
        PaymentUri::new("upi", "pay")
            .param("pa", self.payee_address.as_str())
            .param("pn", escape_spaces(self.display_name()))
            .param("cu", self.currency.as_str())
    }
}
