//! Hierarchical names.
//!
//! A [`Name`] is an ordered list of string components, written as a `/`-separated path. Segmented
//! objects carry a trailing `seg=<n>` component.
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Prefix of the component that carries a segment number.
pub const SEGMENT_MARKER: &str = "seg=";

/// Component separating an identity from its key id in a key name.
pub const KEY_COMPONENT: &str = "KEY";

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    pub fn new() -> Name {
        Name::default()
    }

    pub fn from_components<I, S>(components: I) -> Name
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Name {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    pub fn append(mut self, component: impl Into<String>) -> Name {
        self.components.push(component.into());
        self
    }

    pub fn append_name(mut self, other: &Name) -> Name {
        self.components.extend(other.components.iter().cloned());
        self
    }

    pub fn append_segment(self, segment: u64) -> Name {
        self.append(format!("{}{}", SEGMENT_MARKER, segment))
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// The first `count` components.
    pub fn prefix(&self, count: usize) -> Name {
        Name::from_components(self.components.iter().take(count).cloned())
    }

    /// Everything from component `start` onwards.
    pub fn sub_name(&self, start: usize) -> Name {
        Name::from_components(self.components.iter().skip(start).cloned())
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Segment number carried by the last component, if any.
    pub fn segment(&self) -> Option<u64> {
        self.components
            .last()
            .and_then(|last| last.strip_prefix(SEGMENT_MARKER))
            .and_then(|number| number.parse().ok())
    }

    pub fn without_segment(&self) -> Name {
        match self.segment() {
            Some(_) => self.prefix(self.len() - 1),
            None => self.clone(),
        }
    }

    /// Identity part of a key name `<identity>/KEY/<key-id>`.
    pub fn key_identity(&self) -> Option<Name> {
        let position = self.components.iter().rposition(|c| c == KEY_COMPONENT)?;
        if position + 1 >= self.len() {
            return None;
        }
        Some(self.prefix(position))
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        write!(f, "/{}", self.components.iter().join("/"))
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        Name::from_components(uri.split('/').filter(|c| !c.is_empty()))
    }
}

impl From<String> for Name {
    fn from(uri: String) -> Self {
        Name::from(uri.as_str())
    }
}
