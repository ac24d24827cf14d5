//! Attribute paths
//!
//! An [`AttributePath`] is the ordered list of keys leading from the root of an
//! attribute tree to one node. Diagnostics render it as each key wrapped in
//! brackets, so `["nginx", "port"]` becomes `[nginx][port]`. The root path
//! renders as the empty string.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Location of a node within an attribute tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributePath {
    keys: Vec<String>,
}

impl AttributePath {
    /// The empty path, addressing the root mapping.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from a sequence of keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Return a new path extended by `key`.
    pub fn child(&self, key: &str) -> Self {
        let mut path = self.clone();
        path.push(key);
        path
    }

    pub fn push(&mut self, key: &str) {
        self.keys.push(key.to_string());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.keys.pop()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The final key, or `None` for the root path.
    pub fn last(&self) -> Option<&str> {
        self.keys.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parse the bracketed rendering produced by `Display`.
    ///
    /// Keys may not themselves contain `[` or `]`; such paths do not survive a
    /// render/parse cycle and are rejected here.
    ///
    /// # Examples
    ///
    /// ```
    /// use attr_merge::path::AttributePath;
    ///
    /// let path = AttributePath::parse("[nginx][port]").unwrap();
    /// assert_eq!(path.keys(), ["nginx", "port"]);
    /// assert!(AttributePath::parse("").unwrap().is_empty());
    /// ```
    pub fn parse(rendered: &str) -> Result<Self> {
        let mut keys = Vec::new();
        let mut rest = rendered.trim();

        while !rest.is_empty() {
            let Some(after_open) = rest.strip_prefix('[') else {
                return Err(Error::Path {
                    message: format!("expected '[' in '{}'", rendered),
                });
            };
            let Some(close) = after_open.find(']') else {
                return Err(Error::Path {
                    message: format!("unclosed '[' in '{}'", rendered),
                });
            };
            let key = &after_open[..close];
            if key.contains('[') {
                return Err(Error::Path {
                    message: format!("nested '[' in '{}'", rendered),
                });
            }
            keys.push(key.to_string());
            rest = &after_open[close + 1..];
        }

        Ok(Self { keys })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            write!(f, "[{}]", key)?;
        }
        Ok(())
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<S: Into<String>> FromIterator<S> for AttributePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
