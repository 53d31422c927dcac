use std::collections::{BTreeMap, HashMap};

use rabe_bn::{Fr, Gt, G1, G2};
use serde::{Deserialize, Serialize};

use crate::access_tree::AccessTree;

/// Scheme-wide public material, shared by both the ciphertext-policy and key-policy schemes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbePublicKey {
    pub g1: G1,
    pub g2: G2,
    pub y: Gt,
    pub big_t: HashMap<String, G1>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbeMasterKey {
    pub alpha: Fr,
    pub small_t: HashMap<String, Fr>,
}

/// Ciphertext-policy key: one component per held attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbeCpSecretKey {
    pub d_0: G2,
    pub arr_d: HashMap<String, G2>,
}

/// Key-policy key: the policy tree plus one component per leaf, keyed by leaf index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbeKpSecretKey {
    pub policy: AccessTree,
    pub arr_d: BTreeMap<usize, G2>,
}

/// Ciphertext-policy ciphertext. The tree carries indices but no share values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbeCpCipherText {
    pub access_tree: AccessTree,
    pub c_0: G1,
    pub c_1: Gt,
    pub arr_c: BTreeMap<usize, G1>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbeKpCipherText {
    pub c_1: Gt,
    pub arr_c: HashMap<String, G1>,
}
