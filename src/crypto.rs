//! Group-level attribute-based encryption over `rabe-bn` pairings.
//!
//! Both schemes share [`setup`]: a random `alpha` and one random `t_j` per attribute of the
//! universe, published as `y = e(g1, g2)^alpha` and `T_j = g1^t_j`. The schemes encrypt a group
//! element of `Gt`; turning that into a byte key is left to [`crate::abe_support`].
pub mod cp;
pub mod kp;

use std::collections::HashMap;

use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::Rng;

use crate::errors::AbeError;
use crate::models::{AbeMasterKey, AbePublicKey};

pub fn setup<R: Rng + ?Sized>(
    attributes: &[String],
    g: G1,
    g2: G2,
    rng: &mut R,
) -> (AbePublicKey, AbeMasterKey) {
    // tj = random field element
    let mut small_t = HashMap::new();
    for attribute in attributes {
        small_t.insert(attribute.clone(), rng.gen::<Fr>());
    }
    let alpha: Fr = rng.gen();

    // y=e(g1,g2)^alpha
    let y = pairing(g, g2).pow(alpha);

    // Tj = g^tj
    let big_t = small_t
        .iter()
        .map(|(name, t)| (name.clone(), g * *t))
        .collect::<HashMap<String, G1>>();

    (
        AbePublicKey {
            g1: g,
            g2,
            y,
            big_t,
        },
        AbeMasterKey { alpha, small_t },
    )
}

fn attribute_inverse(master_key: &AbeMasterKey, attribute: &str) -> Result<Fr, AbeError> {
    master_key
        .small_t
        .get(attribute)
        .ok_or(AbeError::new(
            format!("Attribute {} not found in master key", attribute).as_str(),
        ))?
        .inverse()
        .ok_or(AbeError::new(
            format!("Could not calculate inverse of {}", attribute).as_str(),
        ))
}

fn attribute_public(public_key: &AbePublicKey, attribute: &str) -> Result<G1, AbeError> {
    public_key.big_t.get(attribute).copied().ok_or(AbeError::new(
        format!("Attribute {} not found in public key", attribute).as_str(),
    ))
}

fn product(pairings: Vec<Gt>) -> Result<Gt, AbeError> {
    pairings
        .into_iter()
        .fold(None, |acc, e| match acc {
            None => Some(e),
            Some(acc) => Some(acc * e),
        })
        .ok_or(AbeError::new("Could not calculate product of e(cj,dj)"))
}
