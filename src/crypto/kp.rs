//! Key-policy scheme: keys carry the access tree, ciphertexts carry attributes.
use std::collections::{BTreeMap, HashMap};

use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::Rng;

use crate::access_tree::{AccessTree, AssignValues, MinimalSetFinder};
use crate::crypto::{attribute_inverse, attribute_public, product};
use crate::errors::AbeError;
use crate::models::{AbeKpCipherText, AbeKpSecretKey, AbeMasterKey, AbePublicKey};

pub fn keygen<R: Rng + ?Sized>(
    policy: &AccessTree,
    public_key: &AbePublicKey,
    master_key: &AbeMasterKey,
    rng: &mut R,
) -> Result<AbeKpSecretKey, AbeError> {
    let mut plain_policy = policy.clone();
    plain_policy.assign_indices();

    // alpha shared over the policy, qj per leaf
    let filled_policy = plain_policy.assign_values(master_key.alpha, rng);

    // dj = g2^(qj / tj)
    let mut arr_d: BTreeMap<usize, G2> = BTreeMap::new();
    for leaf in filled_policy.leaves() {
        let index = leaf.attribute.index.ok_or(AbeError::new(
            format!("Expected index for {} but got None", leaf.attribute.name).as_str(),
        ))?;
        let value = leaf.value.ok_or(AbeError::new(
            format!("Expected value for {} but got None", leaf.attribute.name).as_str(),
        ))?;
        let inverse = attribute_inverse(master_key, &leaf.attribute.name)?;
        arr_d.insert(index, public_key.g2 * (value * inverse));
    }

    Ok(AbeKpSecretKey {
        policy: plain_policy,
        arr_d,
    })
}

pub fn encrypt<R: Rng + ?Sized>(
    secret: &Gt,
    public_key: &AbePublicKey,
    attributes: &[String],
    rng: &mut R,
) -> Result<AbeKpCipherText, AbeError> {
    if attributes.is_empty() {
        return Err(AbeError::new("Cannot encrypt under an empty attribute set"));
    }

    let s: Fr = rng.gen();

    // c1 = m * y^s
    let c_1 = *secret * public_key.y.pow(s);

    // cj = Tj^s
    let arr_c = attributes
        .iter()
        .map(|a| Ok((a.clone(), attribute_public(public_key, a)? * s)))
        .collect::<Result<HashMap<String, G1>, AbeError>>()?;

    Ok(AbeKpCipherText { c_1, arr_c })
}

pub fn decrypt(cipher_text: &AbeKpCipherText, secret_key: &AbeKpSecretKey) -> Result<Gt, AbeError> {
    let labels = cipher_text.arr_c.keys().collect::<Vec<&String>>();
    let minimal_set = secret_key.policy.find_minimal_set(&labels)?;

    // e(g,g)^(s * alpha) = product of e(cj,dj)
    let pairings = minimal_set
        .iter()
        .map(|attribute| {
            let c = cipher_text.arr_c.get(&attribute.name).ok_or(AbeError::new(
                format!("Ciphertext has no component for {}", attribute.name).as_str(),
            ))?;
            let d = attribute
                .index
                .and_then(|index| secret_key.arr_d.get(&index))
                .ok_or(AbeError::new(
                    format!("Key has no component for {}", attribute.name).as_str(),
                ))?;
            Ok(pairing(*c, *d))
        })
        .collect::<Result<Vec<Gt>, AbeError>>()?;

    Ok(cipher_text.c_1 * product(pairings)?.inverse())
}
