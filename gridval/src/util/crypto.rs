//! Provides an implementation of the [`SignatureEngine`] interface using libraries from the
//! [Rust Crypto](https://github.com/RustCrypto) project for support.

use der::{asn1::ObjectIdentifier, Encode};
use p256::ecdsa::{
    signature::Verifier as Verifier256, Signature as Signature256, VerifyingKey as VerifyingKey256,
};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::environment::grid_environment_traits::SignatureEngine;
use crate::util::error::{Error, PathValidationStatus, Result};
use crate::util::grid_alg_oids::*;
use crate::util::logging::*;

/// `RustCryptoSignatureEngine` verifies RSA PKCS #1 v1.5 signatures (SHA-1 and SHA-2 family) and
/// ECDSA P-256 signatures with SHA-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCryptoSignatureEngine;

impl RustCryptoSignatureEngine {
    /// Creates a new [`RustCryptoSignatureEngine`]
    pub fn new() -> Self {
        Self
    }
}

/// `hash_and_padding` takes a signature algorithm OID and returns the
/// corresponding Pkcs1v15Sign padding scheme along with the digest of the message.
fn hash_and_padding(
    signature_alg: &ObjectIdentifier,
    message: &[u8],
) -> Result<(Pkcs1v15Sign, Vec<u8>)> {
    match *signature_alg {
        PKIXALG_SHA1_WITH_RSA_ENCRYPTION => Ok((
            Pkcs1v15Sign::new::<Sha1>(),
            Sha1::digest(message).to_vec(),
        )),
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION => Ok((
            Pkcs1v15Sign::new::<Sha224>(),
            Sha224::digest(message).to_vec(),
        )),
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION => Ok((
            Pkcs1v15Sign::new::<Sha256>(),
            Sha256::digest(message).to_vec(),
        )),
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION => Ok((
            Pkcs1v15Sign::new::<Sha384>(),
            Sha384::digest(message).to_vec(),
        )),
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION => Ok((
            Pkcs1v15Sign::new::<Sha512>(),
            Sha512::digest(message).to_vec(),
        )),
        _ => Err(Error::Unrecognized),
    }
}

fn get_named_curve_parameter(alg_id: &AlgorithmIdentifierOwned) -> Result<ObjectIdentifier> {
    if let Some(params) = &alg_id.parameters {
        if let Ok(oid) = params.decode_as::<ObjectIdentifier>() {
            return Ok(oid);
        }
    }
    Err(Error::Unrecognized)
}

impl SignatureEngine for RustCryptoSignatureEngine {
    fn verify(
        &self,
        message_to_verify: &[u8],
        signature: &[u8],
        signature_alg: &AlgorithmIdentifierOwned,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        let bad_sig = Error::PathValidation(PathValidationStatus::BadSignature);
        if is_rsa(&signature_alg.oid) {
            let enc_spki = spki.to_der()?;
            let rsa = match RsaPublicKey::from_public_key_der(&enc_spki) {
                Ok(rsa) => rsa,
                Err(e) => {
                    log_message(
                        &PeLogLevels::PeDebug,
                        &format!("Failed to parse RSA public key: {:?}", e),
                    );
                    return Err(bad_sig);
                }
            };
            let (ps, hash_to_verify) = hash_and_padding(&signature_alg.oid, message_to_verify)?;
            return rsa
                .verify(ps, hash_to_verify.as_slice(), signature)
                .map_err(|_| bad_sig);
        } else if PKIXALG_ECDSA_WITH_SHA256 == signature_alg.oid {
            if PKIXALG_SECP256R1 != get_named_curve_parameter(&spki.algorithm)? {
                return Err(Error::Unrecognized);
            }
            let ecdsa = VerifyingKey256::from_sec1_bytes(spki.subject_public_key.raw_bytes())
                .map_err(|_| bad_sig)?;
            let s = Signature256::from_der(signature).map_err(|_| bad_sig)?;
            return ecdsa.verify(message_to_verify, &s).map_err(|_| bad_sig);
        }
        log_message(
            &PeLogLevels::PeDebug,
            &format!("Unsupported signature algorithm: {}", signature_alg.oid),
        );
        Err(Error::Unrecognized)
    }
}
