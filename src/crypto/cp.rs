//! Ciphertext-policy scheme: keys carry attributes, ciphertexts carry the access tree.
use std::collections::{BTreeMap, HashMap};

use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::Rng;

use crate::access_tree::{AccessTree, AssignValues, MinimalSetFinder};
use crate::crypto::{attribute_inverse, attribute_public, product};
use crate::errors::AbeError;
use crate::models::{AbeCpCipherText, AbeCpSecretKey, AbeMasterKey, AbePublicKey};

pub fn keygen<R: Rng + ?Sized>(
    attributes: &[String],
    public_key: &AbePublicKey,
    master_key: &AbeMasterKey,
    rng: &mut R,
) -> Result<AbeCpSecretKey, AbeError> {
    let r: Fr = rng.gen();

    // d0 = g2^(alpha-r)
    let d_0 = public_key.g2 * (master_key.alpha - r);

    // dj = g2^(r / tj)
    let mut arr_d = HashMap::new();
    for a in attributes {
        let inverse = attribute_inverse(master_key, a)?;
        arr_d.insert(a.clone(), public_key.g2 * (r * inverse));
    }

    Ok(AbeCpSecretKey { d_0, arr_d })
}

pub fn encrypt<R: Rng + ?Sized>(
    secret: &Gt,
    public_key: &AbePublicKey,
    access_tree: &AccessTree,
    rng: &mut R,
) -> Result<AbeCpCipherText, AbeError> {
    // s = random field element
    let s: Fr = rng.gen();

    // c0 = g1^s
    let c_0 = public_key.g1 * s;

    // c1 = m * y^s
    let c_1 = *secret * public_key.y.pow(s);

    let mut plain_tree = access_tree.clone();
    plain_tree.assign_indices();
    let filled_tree = plain_tree.assign_values(s, rng);

    // cj = Tj^sj
    let mut arr_c: BTreeMap<usize, G1> = BTreeMap::new();
    for leaf in filled_tree.leaves() {
        let index = leaf.attribute.index.ok_or(AbeError::new(
            format!("Expected index for {} but got None", leaf.attribute.name).as_str(),
        ))?;
        let value = leaf.value.ok_or(AbeError::new(
            format!("Expected value for {} but got None", leaf.attribute.name).as_str(),
        ))?;
        arr_c.insert(index, attribute_public(public_key, &leaf.attribute.name)? * value);
    }

    Ok(AbeCpCipherText {
        access_tree: plain_tree,
        c_0,
        c_1,
        arr_c,
    })
}

pub fn decrypt(cipher_text: &AbeCpCipherText, secret_key: &AbeCpSecretKey) -> Result<Gt, AbeError> {
    let held = secret_key.arr_d.keys().collect::<Vec<&String>>();
    let minimal_set = cipher_text.access_tree.find_minimal_set(&held)?;

    // e(g,g)^rs = product of e(cj,dj)
    let pairings = minimal_set
        .iter()
        .map(|attribute| {
            let c = attribute
                .index
                .and_then(|index| cipher_text.arr_c.get(&index))
                .ok_or(AbeError::new(
                    format!("Ciphertext has no component for {}", attribute.name).as_str(),
                ))?;
            let d: &G2 = secret_key.arr_d.get(&attribute.name).ok_or(AbeError::new(
                format!("Key has no component for {}", attribute.name).as_str(),
            ))?;
            Ok(pairing(*c, *d))
        })
        .collect::<Result<Vec<Gt>, AbeError>>()?;

    // e(g^s,g^a) = e(c0,d0) * e(g,g)^rs
    let egsga = pairing(cipher_text.c_0, secret_key.d_0) * product(pairings)?;

    // m' = c1 / e(g^s,g^a)
    Ok(cipher_text.c_1 * egsga.inverse())
}

#[cfg(test)]
mod tests {
    use rabe_bn::{Group, Gt, G1, G2};
    use rand::Rng;

    use crate::crypto::{cp, setup};
    use crate::errors::AbeError;
    use crate::parser::AccessTreeParser;

    fn universe() -> Vec<String> {
        ["A", "B", "C", "D"].iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_cp_round_trip() {
        let rng = &mut rand::thread_rng();
        let (public_key, master_key) = setup(&universe(), G1::one(), G2::one(), rng);
        let tree = AccessTreeParser::new("(A&B)|(C&D)").parse().unwrap();
        let secret: Gt = rng.gen();

        let key = cp::keygen(&["C".to_string(), "D".to_string()], &public_key, &master_key, rng)
            .unwrap();
        let cipher_text = cp::encrypt(&secret, &public_key, &tree, rng).unwrap();

        assert_eq!(cp::decrypt(&cipher_text, &key).unwrap(), secret);
    }

    #[test]
    fn test_cp_ciphertext_hides_shares() {
        let rng = &mut rand::thread_rng();
        let (public_key, _) = setup(&universe(), G1::one(), G2::one(), rng);
        let tree = AccessTreeParser::new("A&B").parse().unwrap();
        let secret: Gt = rng.gen();

        let cipher_text = cp::encrypt(&secret, &public_key, &tree, rng).unwrap();
        assert!(cipher_text.access_tree.leaves().iter().all(|l| l.value.is_none()));
    }

    #[test]
    fn test_cp_unsatisfied_policy() {
        let rng = &mut rand::thread_rng();
        let (public_key, master_key) = setup(&universe(), G1::one(), G2::one(), rng);
        let tree = AccessTreeParser::new("A&B").parse().unwrap();
        let secret: Gt = rng.gen();

        let key = cp::keygen(&["A".to_string()], &public_key, &master_key, rng).unwrap();
        let cipher_text = cp::encrypt(&secret, &public_key, &tree, rng).unwrap();

        assert_eq!(
            cp::decrypt(&cipher_text, &key).unwrap_err(),
            AbeError::new("Initial attribute set does not satisfy the tree")
        );
    }

    #[test]
    fn test_cp_unknown_attribute() {
        let rng = &mut rand::thread_rng();
        let (public_key, master_key) = setup(&universe(), G1::one(), G2::one(), rng);

        assert!(cp::keygen(&["Z".to_string()], &public_key, &master_key, rng).is_err());
        let tree = AccessTreeParser::new("A|Z").parse().unwrap();
        assert!(cp::encrypt(&rng.gen(), &public_key, &tree, rng).is_err());
    }
}
