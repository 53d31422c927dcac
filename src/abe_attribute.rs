use serde::{Deserialize, Serialize};

/// An attribute as it appears in an access tree.
///
/// `index` is the document-order position of the leaf carrying the attribute; the same attribute
/// can appear in several leaves of one tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbeAttribute {
    pub name: String,
    pub index: Option<usize>,
}

impl AbeAttribute {
    pub fn new(name: &str) -> AbeAttribute {
        AbeAttribute {
            name: name.to_string(),
            index: None,
        }
    }

    pub fn new_with_index(name: &str, index: usize) -> AbeAttribute {
        AbeAttribute {
            name: name.to_string(),
            index: Some(index),
        }
    }
}

impl PartialEq for AbeAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
