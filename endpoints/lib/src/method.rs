//! HTTP methods understood by calls and transports.

use strum::{Display, EnumIter, EnumString};

/// HTTP method of a [`Call`](crate::Call).
///
/// ## Examples
///
/// ```rust
/// use endpoints::RestMethod;
///
/// let method: RestMethod = "GET".parse().unwrap();
/// assert!(method.is_cacheable());
/// assert!(!RestMethod::Post.is_cacheable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl RestMethod {
    /// Returns `true` for methods that conventionally carry a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Returns `true` if repeating the request has the same effect as sending it once.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post | Self::Patch)
    }

    /// Returns `true` for read-only methods.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// Returns `true` if a successful response may be written to the
    /// response cache and later served as an offline fallback.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Trace => reqwest::Method::TRACE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn display_is_uppercase() {
        assert_eq!(RestMethod::Get.to_string(), "GET");
        assert_eq!(RestMethod::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn parses_uppercase_names() {
        assert_eq!("PATCH".parse::<RestMethod>().unwrap(), RestMethod::Patch);
        assert!("FETCH".parse::<RestMethod>().is_err());
    }

    #[test]
    fn only_get_and_head_are_cacheable() {
        let cacheable: Vec<_> = RestMethod::iter().filter(|m| m.is_cacheable()).collect();
        assert_eq!(cacheable, vec![RestMethod::Get, RestMethod::Head]);
    }

    #[test]
    fn body_and_idempotency() {
        assert!(RestMethod::Put.has_body());
        assert!(RestMethod::Put.is_idempotent());
        assert!(RestMethod::Post.has_body());
        assert!(!RestMethod::Post.is_idempotent());
        assert!(!RestMethod::Delete.has_body());
        assert!(RestMethod::Trace.is_safe());
    }

    #[test]
    fn converts_to_reqwest() {
        assert_eq!(reqwest::Method::from(RestMethod::Delete), reqwest::Method::DELETE);
        assert_eq!(RestMethod::Head.to_reqwest(), reqwest::Method::HEAD);
    }
}
