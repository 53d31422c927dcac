use rabe_bn::Fr;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::abe_attribute::AbeAttribute;
use crate::access_tree::TreeOperator::{And, Or};
use crate::errors::AbeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeOperator {
    Or,
    And,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub operator: TreeOperator,
    pub left: Box<AccessTree>,
    pub right: Box<AccessTree>,
    pub value: Option<Fr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub attribute: AbeAttribute,
    pub value: Option<Fr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccessTree {
    Operator(Operator),
    Leaf(Leaf),
}

impl AccessTree {
    pub fn leaf(name: &str) -> AccessTree {
        AccessTree::Leaf(Leaf {
            attribute: AbeAttribute::new(name),
            value: None,
        })
    }

    pub fn and(left: AccessTree, right: AccessTree) -> AccessTree {
        AccessTree::Operator(Operator {
            operator: And,
            left: Box::new(left),
            right: Box::new(right),
            value: None,
        })
    }

    pub fn or(left: AccessTree, right: AccessTree) -> AccessTree {
        AccessTree::Operator(Operator {
            operator: Or,
            left: Box::new(left),
            right: Box::new(right),
            value: None,
        })
    }

    pub fn assign_indices(&mut self) {
        let mut index = 0;
        self.assign_indices_rec(&mut index);
    }

    fn assign_indices_rec(&mut self, index: &mut usize) {
        match self {
            AccessTree::Operator(Operator { left, right, .. }) => {
                left.assign_indices_rec(index);
                right.assign_indices_rec(index);
            }
            AccessTree::Leaf(Leaf { attribute, .. }) => {
                attribute.index = Some(*index);
                *index += 1;
            }
        }
    }

    /// All leaves in document order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        match self {
            AccessTree::Operator(Operator { left, right, .. }) => {
                let mut leaves = left.leaves();
                leaves.extend(right.leaves());
                leaves
            }
            AccessTree::Leaf(leaf) => vec![leaf],
        }
    }
}

pub trait GetAttributes {
    /// Returns a vector of all attributes in the tree
    fn get_attributes(&self) -> Vec<AbeAttribute>;
}

impl GetAttributes for AccessTree {
    fn get_attributes(&self) -> Vec<AbeAttribute> {
        self.leaves()
            .into_iter()
            .map(|leaf| leaf.attribute.clone())
            .collect()
    }
}

pub trait AssignValues {
    /// Shares `secret` over the tree: AND nodes split it additively, OR nodes copy it.
    fn assign_values<R: Rng + ?Sized>(&self, secret: Fr, rng: &mut R) -> AccessTree;
}

impl AssignValues for AccessTree {
    fn assign_values<R: Rng + ?Sized>(&self, secret: Fr, rng: &mut R) -> AccessTree {
        match self {
            AccessTree::Operator(Operator {
                left,
                right,
                operator,
                ..
            }) => {
                let (set_left, set_right) = match operator {
                    Or => (secret, secret),
                    And => {
                        let s_i1: Fr = rng.gen();
                        (s_i1, secret - s_i1)
                    }
                };

                AccessTree::Operator(Operator {
                    value: Some(secret),
                    operator: operator.clone(),
                    left: Box::from(left.assign_values(set_left, rng)),
                    right: Box::from(right.assign_values(set_right, rng)),
                })
            }
            AccessTree::Leaf(Leaf { attribute, .. }) => AccessTree::Leaf(Leaf {
                value: Some(secret),
                attribute: attribute.clone(),
            }),
        }
    }
}

pub trait MinimalSetFinder {
    /// Checks if the given set of attributes satisfies the tree
    fn is_satisfiable<S: AsRef<str>>(&self, attributes: &[S]) -> bool;

    /// Finds the smallest set of leaves that satisfies the tree using only the given attributes.
    ///
    /// AND nodes need both children, OR nodes take whichever satisfied child needs fewer leaves.
    fn find_minimal_set<S: AsRef<str>>(
        &self,
        attributes: &[S],
    ) -> Result<Vec<AbeAttribute>, AbeError>;
}

fn select_leaves<S: AsRef<str>>(tree: &AccessTree, attributes: &[S]) -> Option<Vec<AbeAttribute>> {
    match tree {
        AccessTree::Operator(Operator {
            operator: And,
            left,
            right,
            ..
        }) => {
            let mut selected = select_leaves(left, attributes)?;
            selected.extend(select_leaves(right, attributes)?);
            Some(selected)
        }
        AccessTree::Operator(Operator {
            operator: Or,
            left,
            right,
            ..
        }) => match (select_leaves(left, attributes), select_leaves(right, attributes)) {
            (Some(l), Some(r)) if r.len() < l.len() => Some(r),
            (Some(l), _) => Some(l),
            (None, r) => r,
        },
        AccessTree::Leaf(Leaf { attribute, .. }) => attributes
            .iter()
            .any(|a| a.as_ref() == attribute.name)
            .then(|| vec![attribute.clone()]),
    }
}

impl MinimalSetFinder for AccessTree {
    fn is_satisfiable<S: AsRef<str>>(&self, attributes: &[S]) -> bool {
        match self {
            AccessTree::Operator(Operator {
                operator,
                left,
                right,
                ..
            }) => match operator {
                And => left.is_satisfiable(attributes) && right.is_satisfiable(attributes),
                Or => left.is_satisfiable(attributes) || right.is_satisfiable(attributes),
            },
            AccessTree::Leaf(Leaf { attribute, .. }) => {
                attributes.iter().any(|a| a.as_ref() == attribute.name)
            }
        }
    }

    fn find_minimal_set<S: AsRef<str>>(
        &self,
        attributes: &[S],
    ) -> Result<Vec<AbeAttribute>, AbeError> {
        select_leaves(self, attributes).ok_or(AbeError::new(
            "Initial attribute set does not satisfy the tree",
        ))
    }
}
