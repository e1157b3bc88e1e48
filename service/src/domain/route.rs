//! Same-origin route definitions.

use std::str::FromStr;

use derive_more::{AsRef, Display};

/// Same-origin path a client may be redirected to.
///
/// Always starts with a single `/`, so it can never point to another host.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Path(String);

impl Path {
    /// Creates a new [`Path`] if the given `path` is a same-origin one.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        Self::check(&path).then_some(Self(path))
    }

    /// Checks whether the given `path` stays on the same origin.
    ///
    /// Browsers treat `//host` and `/\host` as protocol-relative URLs, and
    /// strip tabs and newlines before resolving, so those never pass.
    fn check(path: impl AsRef<str>) -> bool {
        let path = path.as_ref();
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.starts_with("/\\")
            && !path.chars().any(char::is_control)
    }

    /// Resolves the provided untrusted `next` value, falling back to the
    /// `default` [`Path`] when it is absent or leads off the origin.
    #[must_use]
    pub fn or_default(next: Option<&str>, default: &Self) -> Self {
        next.and_then(Self::new).unwrap_or_else(|| default.clone())
    }
}

impl FromStr for Path {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `route::Path`")
    }
}

/// Prefix of a route subtree, like `/mypage`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Prefix(Path);

impl Prefix {
    /// Creates a new [`Prefix`] out of the provided [`Path`].
    ///
    /// Trailing slashes are insignificant.
    #[must_use]
    pub fn new(path: Path) -> Self {
        let trimmed = path.0.trim_end_matches('/');
        if trimmed.len() == path.0.len() {
            Self(path)
        } else if trimmed.is_empty() {
            Self(Path("/".to_owned()))
        } else {
            Self(Path(trimmed.to_owned()))
        }
    }

    /// Returns the route of the provided `tail` segment inside this
    /// [`Prefix`] subtree.
    #[must_use]
    pub fn join(&self, tail: &str) -> String {
        let prefix = self.0 .0.trim_end_matches('/');
        format!("{prefix}/{}", tail.trim_start_matches('/'))
    }

    /// Indicates whether the provided request `path` belongs to the subtree
    /// of this [`Prefix`].
    ///
    /// Matching happens on segment boundaries only: `/mypage` covers
    /// `/mypage` and `/mypage/records`, but not `/mypages`.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        let prefix = self.0 .0.as_str();
        if prefix == "/" {
            return path.starts_with('/');
        }
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}
