//! Request descriptors.
//!
//! A descriptor is a server path plus named parameters, already encoded the
//! way the wire expects them: booleans as `0`/`1`, absent optionals omitted.

use std::fmt;

/// One request to the cube server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    path: String,
    params: Vec<(String, String)>,
}

impl Descriptor {
    /// Create a descriptor for a server path (e.g. `/cell/export`).
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter rendered with its `Display` form.
    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a boolean parameter encoded as `0`/`1`.
    pub fn flag(self, name: &str, value: bool) -> Self {
        self.param(name, if value { "1" } else { "0" })
    }

    /// Add a parameter only when a value is present.
    pub fn optional<V: fmt::Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// The server path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}
