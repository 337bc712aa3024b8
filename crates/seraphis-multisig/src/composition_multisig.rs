//! Threshold composition proof: the MuSig2-style multisig variant of
//! `seraphis_crypto::composition_proof` (§4.7.1). Each signer
//! contributes a bi-nonce `(alpha_1, alpha_2)` over `U`; nonces are
//! sorted and merged into a single aggregate opening via a
//! deterministically-derived merge factor before the shared challenge
//! is computed, so that the order signers submit nonces in cannot
//! change the proof.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;
use seraphis_crypto::transcript::Transcript;
use seraphis_crypto::CryptoError;

fn inv8() -> Scalar {
    Scalar::from(8u8).invert()
}

fn challenge_message(message: &[u8; 32], k: &EdwardsPoint, ki: &EdwardsPoint, k_t1: &EdwardsPoint) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("spcomp-transcript")
        .push_point(&seraphis_crypto::generators::x_gen())
        .push_point(&seraphis_crypto::generators::u_gen())
        .push_bytes(message)
        .push_point(k)
        .push_point(ki)
        .push_point(k_t1);
    t.finish_scalar(&[])
}

fn challenge(m: &Scalar, k_t1_pub: &EdwardsPoint, k_t2_pub: &EdwardsPoint, ki_pub: &EdwardsPoint) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("spcomp-challenge")
        .push_scalar(m)
        .push_point(k_t1_pub)
        .push_point(k_t2_pub)
        .push_point(ki_pub);
    t.finish_scalar(&[])
}

/// `rho = H("bn", m, {alpha_1_e}, {alpha_2_e})`, over nonces already
/// sorted into a canonical order.
fn binonce_merge_factor(m: &Scalar, nonces_1: &[EdwardsPoint], nonces_2: &[EdwardsPoint]) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("bn").push_scalar(m);
    for n in nonces_1 {
        t.push_point(n);
    }
    for n in nonces_2 {
        t.push_point(n);
    }
    t.finish_scalar(&[])
}

/// A proposal broadcast to co-signers: the statement being proved plus
/// the proposer's own `(K_t1, K_t2)` single-use nonces.
#[derive(Debug, Clone)]
pub struct CompositionMultisigProposal {
    pub message: [u8; 32],
    pub k: EdwardsPoint,
    pub ki: EdwardsPoint,
    pub nonce_t1: Scalar,
    pub nonce_t2: Scalar,
}

/// One signer's bi-nonce preparation for the `KI` opening, generated
/// fresh per signing attempt and shared (the public half only) with
/// co-signers before any partial signature is produced.
#[derive(Debug, Clone)]
pub struct CompositionMultisigPrep {
    pub nonce_1_priv: Scalar,
    pub nonce_1_pub: EdwardsPoint,
    pub nonce_2_priv: Scalar,
    pub nonce_2_pub: EdwardsPoint,
}

pub fn init_multisig_prep(nonce_1_priv: Scalar, nonce_2_priv: Scalar) -> CompositionMultisigPrep {
    CompositionMultisigPrep {
        nonce_1_pub: nonce_1_priv * seraphis_crypto::generators::u_gen(),
        nonce_1_priv,
        nonce_2_pub: nonce_2_priv * seraphis_crypto::generators::u_gen(),
        nonce_2_priv,
    }
}

#[derive(Debug, Clone)]
pub struct CompositionMultisigPartial {
    pub message: [u8; 32],
    pub k: EdwardsPoint,
    pub ki: EdwardsPoint,
    pub k_t1: EdwardsPoint,
    pub c: Scalar,
    pub r_t1: Scalar,
    pub r_t2: Scalar,
    pub r_ki_partial: Scalar,
}

/// Sort signer nonce pairs by their first component's compressed
/// encoding so every co-signer derives the same merge factor regardless
/// of submission order.
fn sort_nonce_pairs(mut pairs: Vec<(EdwardsPoint, EdwardsPoint)>) -> Vec<(EdwardsPoint, EdwardsPoint)> {
    pairs.sort_by(|a, b| a.0.compress().to_bytes().cmp(&b.0.compress().to_bytes()));
    pairs
}

/// Build this signer's partial signature. `signer_nonces` holds every
/// participating signer's `(alpha_1*U, alpha_2*U)` pair (including this
/// signer's own, pre-multiplied by 8 the way an on-wire nonce is), in
/// any order — they are re-sorted here for determinism.
pub fn partial_sign(
    proposal: &CompositionMultisigProposal,
    x: &Scalar,
    y: &Scalar,
    z_e: &Scalar,
    signer_nonces: &[(EdwardsPoint, EdwardsPoint)],
    local_nonce_1_priv: &Scalar,
    local_nonce_2_priv: &Scalar,
) -> Result<CompositionMultisigPartial, CryptoError> {
    if proposal.k.is_identity() || proposal.ki.is_identity() {
        return Err(CryptoError::InvalidProof);
    }
    if *y == Scalar::ZERO || *z_e == Scalar::ZERO {
        return Err(CryptoError::InvalidProof);
    }

    let sorted = sort_nonce_pairs(signer_nonces.to_vec());
    let nonces_1: Vec<EdwardsPoint> = sorted.iter().map(|p| p.0).collect();
    let nonces_2: Vec<EdwardsPoint> = sorted.iter().map(|p| p.1).collect();

    let local_nonce_1_pub = local_nonce_1_priv * seraphis_crypto::generators::u_gen();
    let local_nonce_2_pub = local_nonce_2_priv * seraphis_crypto::generators::u_gen();
    if !sorted
        .iter()
        .any(|(n1, n2)| *n1 == local_nonce_1_pub && *n2 == local_nonce_2_pub)
    {
        return Err(CryptoError::Other(
            "local signer's opening nonces not in input set".into(),
        ));
    }

    let k_t1 = (y.invert() * inv8()) * proposal.k;
    let m = challenge_message(&proposal.message, &proposal.k, &proposal.ki, &k_t1);
    let rho = binonce_merge_factor(&m, &nonces_1, &nonces_2);

    let alpha_t1_pub = &proposal.nonce_t1 * &proposal.k;
    let alpha_t2_pub = &proposal.nonce_t2 * seraphis_crypto::generators::basepoint();

    let sum_1: EdwardsPoint = nonces_1.iter().sum();
    let sum_2: EdwardsPoint = nonces_2.iter().sum();
    let alpha_ki_pub = sum_1 + rho * sum_2;

    let c = challenge(&m, &alpha_t1_pub, &alpha_t2_pub, &alpha_ki_pub);

    let merged_local_nonce = local_nonce_1_priv + rho * local_nonce_2_priv;

    let r_t1 = proposal.nonce_t1 - c * y.invert();
    let r_t2 = proposal.nonce_t2 - c * (x * y.invert());
    let r_ki_partial = merged_local_nonce - c * (z_e * y.invert());

    Ok(CompositionMultisigPartial {
        message: proposal.message,
        k: proposal.k,
        ki: proposal.ki,
        k_t1,
        c,
        r_t1,
        r_t2,
        r_ki_partial,
    })
}

/// Assemble the final single-signer-shaped proof out of every
/// participant's partial signature. The shared components (`c`, `r_t1`,
/// `r_t2`, `K_t1`) must all agree; `r_ki` is the sum of the partial
/// `r_ki` contributions.
pub fn assemble(partials: &[CompositionMultisigPartial]) -> Result<seraphis_crypto::composition_proof::CompositionProof, CryptoError> {
    let first = partials
        .first()
        .ok_or_else(|| CryptoError::Other("no partial signatures to assemble".into()))?;

    for p in partials {
        if p.c != first.c || p.r_t1 != first.r_t1 || p.r_t2 != first.r_t2 || p.k_t1 != first.k_t1 || p.k != first.k || p.ki != first.ki || p.message != first.message {
            return Err(CryptoError::Other("partial signature mismatch".into()));
        }
    }

    let r_ki: Scalar = partials.iter().map(|p| p.r_ki_partial).sum();

    let proof = seraphis_crypto::composition_proof::CompositionProof {
        c: first.c,
        r_t1: first.r_t1,
        r_t2: first.r_t2,
        r_ki,
        k_t1: first.k_t1,
    };

    if !seraphis_crypto::composition_proof::verify(&proof, &first.message, &first.k, &first.ki) {
        return Err(CryptoError::InvalidProof);
    }

    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(seed: &[u8]) -> Scalar {
        seraphis_crypto::scalar_from_bytes_mod_order(seed)
    }

    #[test]
    fn two_of_two_assembles_a_valid_proof() {
        let x = scalar(b"ms test x...");
        let y = scalar(b"ms test y...");
        let z1 = scalar(b"ms test z1..");
        let z2 = scalar(b"ms test z2..");
        let z = z1 + z2;

        let g = seraphis_crypto::generators::basepoint();
        let xg = seraphis_crypto::generators::x_gen();
        let u = seraphis_crypto::generators::u_gen();
        let k = x * g + y * xg + z * u;
        let ki = (z * y.invert()) * u;

        let message = [9u8; 32];

        let prep1 = init_multisig_prep(scalar(b"n1 priv 1..."), scalar(b"n2 priv 1..."));
        let prep2 = init_multisig_prep(scalar(b"n1 priv 2..."), scalar(b"n2 priv 2..."));
        let nonces = vec![
            (prep1.nonce_1_pub, prep1.nonce_2_pub),
            (prep2.nonce_1_pub, prep2.nonce_2_pub),
        ];

        let proposal = CompositionMultisigProposal {
            message,
            k,
            ki,
            nonce_t1: scalar(b"proposer t1."),
            nonce_t2: scalar(b"proposer t2."),
        };

        let partial1 = partial_sign(&proposal, &x, &y, &z1, &nonces, &prep1.nonce_1_priv, &prep1.nonce_2_priv).unwrap();
        let partial2 = partial_sign(&proposal, &x, &y, &z2, &nonces, &prep2.nonce_1_priv, &prep2.nonce_2_priv).unwrap();

        let proof = assemble(&[partial1, partial2]).unwrap();
        assert!(seraphis_crypto::composition_proof::verify(&proof, &message, &k, &ki));
    }

    /// 2-of-3: shares `z1=5, z2=8, z3=21`. A signer absent from a given
    /// filter has its share redistributed `(1/threshold)`-weighted over
    /// the filter's active signers (§4.7.1 point 5), so every 2-subset
    /// reconstructs the same aggregate `z` and the shared nonce set stays
    /// fixed across filters, so `c, r_t1, r_t2, K_t1` come out identical
    /// no matter which 2-subset assembled the proof.
    #[test]
    fn three_signer_two_of_three_filters_agree() {
        let inv2 = Scalar::from(2u8).invert();
        let z1 = Scalar::from(5u8);
        let z2 = Scalar::from(8u8);
        let z3 = Scalar::from(21u8);
        let z_full = z1 + z2 + z3;

        let x = scalar(b"3sig test x.");
        let y = scalar(b"3sig test y.");
        let g = seraphis_crypto::generators::basepoint();
        let xg = seraphis_crypto::generators::x_gen();
        let u = seraphis_crypto::generators::u_gen();
        let k = x * g + y * xg + z_full * u;
        let ki = (z_full * y.invert()) * u;

        let message = [7u8; 32];
        let proposal = CompositionMultisigProposal {
            message,
            k,
            ki,
            nonce_t1: scalar(b"group t1...."),
            nonce_t2: scalar(b"group t2...."),
        };

        let prep1 = init_multisig_prep(scalar(b"3s n1 priv 1"), scalar(b"3s n2 priv 1"));
        let prep2 = init_multisig_prep(scalar(b"3s n1 priv 2"), scalar(b"3s n2 priv 2"));
        let prep3 = init_multisig_prep(scalar(b"3s n1 priv 3"), scalar(b"3s n2 priv 3"));
        let full_nonces = vec![
            (prep1.nonce_1_pub, prep1.nonce_2_pub),
            (prep2.nonce_1_pub, prep2.nonce_2_pub),
            (prep3.nonce_1_pub, prep3.nonce_2_pub),
        ];

        // (active signer, share, prep, missing signer's share) per filter.
        let filters = [
            [(z1, &prep1), (z2, &prep2)], // {1, 2}, missing signer 3 (z3)
            [(z1, &prep1), (z3, &prep3)], // {1, 3}, missing signer 2 (z2)
            [(z2, &prep2), (z3, &prep3)], // {2, 3}, missing signer 1 (z1)
        ];
        let missing = [z3, z2, z1];

        let mut proofs = Vec::new();
        for (filter, missing_share) in filters.iter().zip(missing) {
            let redistributed = missing_share * inv2;
            let partials: Vec<_> = filter
                .iter()
                .map(|(share, prep)| {
                    let z_e = *share + redistributed;
                    partial_sign(&proposal, &x, &y, &z_e, &full_nonces, &prep.nonce_1_priv, &prep.nonce_2_priv).unwrap()
                })
                .collect();
            let proof = assemble(&partials).unwrap();
            assert!(seraphis_crypto::composition_proof::verify(&proof, &message, &k, &ki));
            proofs.push(proof);
        }

        for p in &proofs[1..] {
            assert_eq!(p.c, proofs[0].c);
            assert_eq!(p.r_t1, proofs[0].r_t1);
            assert_eq!(p.r_t2, proofs[0].r_t2);
            assert_eq!(p.k_t1, proofs[0].k_t1);
        }
    }

    #[test]
    fn unrecognized_local_nonce_is_rejected() {
        let y = scalar(b"reject test y");
        let z = scalar(b"reject test z");
        let x = scalar(b"reject test x");
        let g = seraphis_crypto::generators::basepoint();
        let xg = seraphis_crypto::generators::x_gen();
        let u = seraphis_crypto::generators::u_gen();
        let k = x * g + y * xg + z * u;
        let ki = (z * y.invert()) * u;

        let proposal = CompositionMultisigProposal {
            message: [1u8; 32],
            k,
            ki,
            nonce_t1: scalar(b"proposer t1b"),
            nonce_t2: scalar(b"proposer t2b"),
        };

        let unrelated_nonce_1 = scalar(b"unrelated n1");
        let unrelated_nonce_2 = scalar(b"unrelated n2");
        let nonces = vec![(unrelated_nonce_1 * u, unrelated_nonce_2 * u)];

        let result = partial_sign(&proposal, &x, &y, &z, &nonces, &scalar(b"wrong local 1"), &scalar(b"wrong local 2"));
        assert!(result.is_err());
    }
}
