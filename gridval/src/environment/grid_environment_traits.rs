//! The grid_environment_traits module features the trait definitions that are used by
//! [`GridEnvironment`](crate::GridEnvironment) and the free validation functions to reach trust
//! store contents and cryptographic implementations.
//!
//! Trust store lookups are keyed by the eight hex digit name hash produced by
//! [`name_hash`](crate::util::name_utilities::name_hash).

use alloc::vec::Vec;

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::revocation::crl::GridCrl;
use crate::source::lsc_file::LscRecord;
use crate::util::error::*;
use crate::validator::grid_certificate::GridCertificate;
use crate::validator::signing_policy::SigningPolicyRecord;

/// The [`TrustStore`] trait enables trait objects to provide access to the trust material used to
/// validate Grid certificate chains and VOMS attribute certificates: CA certificates, CRLs, signing
/// policies, VOMS server certificates and LSC records.
pub trait TrustStore {
    /// candidate_anchors_for returns the CA certificates whose subject name hashes to the given value.
    fn candidate_anchors_for(&self, subject_hash: &str) -> Vec<&GridCertificate>;

    /// candidate_crls_for returns the CRLs whose issuer name hashes to the given value.
    fn candidate_crls_for(&self, issuer_hash: &str) -> Vec<&GridCrl>;

    /// signing_policy_for returns the ordered signing policy records configured for the CA whose
    /// subject name hashes to the given value.
    fn signing_policy_for(&self, ca_hash: &str) -> Option<&[SigningPolicyRecord]>;

    /// aa_candidates_for returns VOMS server certificates configured for the VO whose subject name
    /// hashes to the given value.
    fn aa_candidates_for(&self, issuer_hash: &str, vo: &str) -> Vec<&GridCertificate>;

    /// lsc_for returns the LSC record configured for the VO and VOMS server host, if any.
    fn lsc_for(&self, vo: &str, host: &str) -> Option<&LscRecord>;
}

/// The [`SignatureEngine`] trait abstracts the cryptographic library used to verify signatures on
/// certificates, CRLs and attribute certificates.
pub trait SignatureEngine: Send + Sync {
    /// verify returns Ok(()) if the signature over the message verifies under the public key using
    /// the given signature algorithm, `Error::PathValidation(BadSignature)` if it does not and
    /// `Error::Unrecognized` if the algorithm or key type is not supported.
    fn verify(
        &self,
        message_to_verify: &[u8],
        signature: &[u8],
        signature_alg: &AlgorithmIdentifierOwned,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()>;
}
