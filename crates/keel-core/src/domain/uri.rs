//! Request URI: path segments plus query parameters.
//!
//! A [`Uri`] is immutable once parsed. Dispatch consumes segments through a
//! [`PathCursor`] instead of popping them off a shared list, and controller
//! fallback produces a *new* `Uri` with the default controller in front
//! (see [`Uri::with_leading`]).

use std::collections::BTreeMap;
use std::fmt;

/// Parsed request path and query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    path: Vec<String>,
    query: BTreeMap<String, String>,
}

impl Uri {
    /// Parse a raw request target such as `/blog/show/42?page=2`.
    ///
    /// The path is trimmed of surrounding `/` before splitting, so `/` and
    /// the empty string both produce a URI with no segments. Repeated query
    /// keys keep the last value.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };

        let trimmed = path.trim_matches('/');
        let path = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(str::to_owned).collect()
        };

        let query = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self { path, query }
    }

    /// Build a URI from already-split path segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: segments.into_iter().map(Into::into).collect(),
            query: BTreeMap::new(),
        }
    }

    /// Attach query parameters (last value wins on duplicate keys).
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.insert(k.into(), v.into());
        }
        self
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// `true` when the request had no path segments at all.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// A copy of this URI with its path replaced; the query is kept.
    pub fn with_path(&self, path: Vec<String>) -> Self {
        Self {
            path,
            query: self.query.clone(),
        }
    }

    /// A copy of this URI with `segment` placed in front of the path.
    pub fn with_leading(&self, segment: impl Into<String>) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(segment.into());
        path.extend(self.path.iter().cloned());
        self.with_path(path)
    }

    /// Start consuming the path from the first segment.
    pub fn cursor(&self) -> PathCursor<'_> {
        PathCursor {
            path: &self.path,
            offset: 0,
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path.join("/"))?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Read-only cursor over a URI path.
#[derive(Debug, Clone)]
pub struct PathCursor<'a> {
    path: &'a [String],
    offset: usize,
}

impl<'a> PathCursor<'a> {
    /// Take the next segment, if any.
    pub fn shift(&mut self) -> Option<&'a str> {
        let segment = self.path.get(self.offset)?;
        self.offset += 1;
        Some(segment.as_str())
    }

    /// Segments not yet consumed.
    pub fn remaining(&self) -> &'a [String] {
        self.path.get(self.offset..).unwrap_or_default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
