//! Opaque handles for the two proof systems spec.md explicitly treats as
//! black boxes rather than modeling (§1): legacy CLSAG ring signatures and
//! Bulletproofs+ range proofs. This crate never constructs or verifies
//! either — a handle only carries the serialized bytes and a declared
//! size so callers can size buffers and pass the bytes on to whatever
//! external prover/verifier owns the real implementation.
//!
//! Field shapes are named after the teacher's concrete `ClsagSignature`/
//! `BulletproofPlusProof` structs, but the payload itself is opaque.

/// An opaque legacy ring signature. Verification lives outside this
/// crate; this type only exists to move the bytes around typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClsagSignature {
    /// `[s_0..s_{n-1}][c1][key_image][commitment_image]`, ring-size
    /// dependent — see the teacher's `clsag::ClsagSignature` for the
    /// per-field breakdown this wraps.
    pub bytes: Vec<u8>,
}

impl ClsagSignature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// An opaque Bulletproofs+ range proof. Same treatment as
/// [`ClsagSignature`]: no verification logic, just a typed byte carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeProof {
    pub bytes: Vec<u8>,
}

impl RangeProof {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clsag_wrapper_round_trips_its_bytes() {
        let sig = ClsagSignature::from_bytes(vec![1, 2, 3]);
        assert_eq!(sig.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn range_proof_wrapper_round_trips_its_bytes() {
        let proof = RangeProof::from_bytes(vec![9, 9]);
        assert_eq!(proof.as_bytes(), &[9, 9]);
    }
}
