//! Authenticated session passed explicitly to request handlers.

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    token: String,
    user_id: String,
}

impl Session {
    /// `base_url` should be like `http://localhost:5000/api`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            user_id: user_id.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let session = Session::new("http://localhost:5000/api/", "t", "u");
        assert_eq!(session.base_url(), "http://localhost:5000/api");
        assert_eq!(session.url("/documents/7"), "http://localhost:5000/api/documents/7");
    }

    #[test]
    fn debug_hides_token() {
        let session = Session::new("http://x", "secret-token", "u");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
