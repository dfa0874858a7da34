//! Structures and functions to perform CRL processing

use alloc::{format, vec::Vec};

use const_oid::db::rfc5912::{ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_CRL_NUMBER};
use der::{Decode, Encode};
use log::{debug, info};
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;

use crate::environment::grid_environment_traits::{SignatureEngine, TrustStore};
use crate::util::error::*;
use crate::util::logging::*;
use crate::util::name_utilities::*;
use crate::validator::grid_certificate::{verify_signed, GridCertificate};

/// [`GridCrl`] aggregates a binary, DER-encoded CRL and the parsed CRL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GridCrl {
    /// Binary, encoded CertificateList object
    pub encoded_crl: Vec<u8>,
    /// Decoded CertificateList object
    pub decoded_crl: CertificateList,
}

impl TryFrom<&[u8]> for GridCrl {
    type Error = der::Error;

    fn try_from(enc_crl: &[u8]) -> der::Result<Self> {
        Ok(GridCrl {
            encoded_crl: enc_crl.to_vec(),
            decoded_crl: CertificateList::from_der(enc_crl)?,
        })
    }
}

impl TryFrom<CertificateList> for GridCrl {
    type Error = der::Error;

    fn try_from(crl: CertificateList) -> der::Result<Self> {
        Ok(GridCrl {
            encoded_crl: crl.to_der()?,
            decoded_crl: crl,
        })
    }
}

impl GridCrl {
    /// Issuer name of the CRL
    pub fn issuer(&self) -> &Name {
        &self.decoded_crl.tbs_cert_list.issuer
    }

    /// `issuer_hash` returns the trust store index of the issuer name.
    pub fn issuer_hash(&self) -> Result<alloc::string::String> {
        name_hash(self.issuer())
    }

    /// thisUpdate as seconds since the Unix epoch
    pub fn this_update(&self) -> u64 {
        self.decoded_crl
            .tbs_cert_list
            .this_update
            .to_unix_duration()
            .as_secs()
    }

    /// nextUpdate as seconds since the Unix epoch, if present
    pub fn next_update(&self) -> Option<u64> {
        self.decoded_crl
            .tbs_cert_list
            .next_update
            .map(|nu| nu.to_unix_duration().as_secs())
    }

    /// `is_listed` returns true if the serial number appears among the revoked certificates.
    pub fn is_listed(&self, serial: &[u8]) -> bool {
        match &self.decoded_crl.tbs_cert_list.revoked_certificates {
            Some(rcs) => rcs.iter().any(|rc| rc.serial_number.as_bytes() == serial),
            None => false,
        }
    }

    /// `check_crl_extensions` fails if the CRL carries a critical extension other than authority
    /// key identifier or CRL number.
    pub fn check_crl_extensions(&self) -> Result<()> {
        let exts_to_ignore = [ID_CE_CRL_NUMBER, ID_CE_AUTHORITY_KEY_IDENTIFIER];
        if let Some(exts) = &self.decoded_crl.tbs_cert_list.crl_extensions {
            for e in exts {
                if e.critical && !exts_to_ignore.contains(&e.extn_id) {
                    return Err(Error::CrlIncompatible);
                }
            }
        }
        Ok(())
    }

    /// `check_crl_validity` fails if thisUpdate is after the time of interest or nextUpdate is
    /// before it. A zero time of interest disables the check.
    pub fn check_crl_validity(&self, toi: u64) -> Result<()> {
        if 0 != toi {
            let tu = self.this_update();
            if tu > toi {
                info!(
                    "Discarding CRL from {} as having this update time ({}) later than time of interest ({})",
                    name_to_openssl(self.issuer()),
                    tu,
                    toi
                );
                return Err(Error::CrlIncompatible);
            }
            if let Some(nu) = self.next_update() {
                if nu < toi {
                    info!(
                        "Discarding CRL from {} as having next update time ({}) earlier than time of interest ({})",
                        name_to_openssl(self.issuer()),
                        nu,
                        toi
                    );
                    return Err(Error::CrlIncompatible);
                }
            }
        }
        Ok(())
    }
}

/// `usable_for` returns Ok if the CRL was issued by the issuer, verifies under the issuer's key, is
/// current at the time of interest and carries no unrecognized critical extension.
pub fn usable_for(
    engine: &dyn SignatureEngine,
    crl: &GridCrl,
    issuer: &GridCertificate,
    toi: u64,
) -> Result<()> {
    if !compare_names(crl.issuer(), issuer.subject()) {
        return Err(Error::CrlIncompatible);
    }
    if let Err(e) = verify_signed(engine, &crl.encoded_crl, issuer.public_key()) {
        log_for_name(
            &PeLogLevels::PeWarn,
            issuer.subject(),
            &format!("CRL signature verification error: {:?}", e),
        );
        return Err(Error::CrlIncompatible);
    }
    crl.check_crl_validity(toi)?;
    crl.check_crl_extensions()
}

/// `check_revocation` consults the CRLs the trust store holds for the issuer of `cert`. It fails
/// with `Revoked` if a usable CRL lists the serial number of `cert`. CRLs that are not usable are
/// skipped.
pub fn check_revocation(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    issuer: &GridCertificate,
    cert: &GridCertificate,
    toi: u64,
) -> Result<()> {
    let issuer_hash = cert.issuer_hash()?;
    for crl in store.candidate_crls_for(&issuer_hash) {
        if let Err(e) = usable_for(engine, crl, issuer, toi) {
            debug!(
                "Skipping CRL from {}: {}",
                name_to_openssl(crl.issuer()),
                e
            );
            continue;
        }
        if crl.is_listed(cert.serial()) {
            log_error_for_name(cert.subject(), "certificate is revoked");
            return Err(Error::PathValidation(PathValidationStatus::Revoked));
        }
    }
    Ok(())
}
