//! Functions related to VOMS attribute certificate validation
//!
//! An attribute certificate is accepted when its issuer can be resolved and the issuer's
//! certificate chain validates, and when the attribute certificate itself is within its validity
//! window, lists the local host among its targets (if it has targets) and carries no unrecognized
//! critical extension.
//!
//! The issuer is resolved first from the certificates bundled in the ACCerts extension when an LSC
//! record configured for the VO and server lists their subject and issuer names. Failing that, the
//! VOMS server certificates configured for the VO are tried in turn, and the first whose key
//! verifies the attribute certificate signature becomes the only issuer certificate.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::{debug, info};
use x509_cert::ext::pkix::name::GeneralName;

use crate::asn1::voms::{decode_ac_sequence, VOMS_AC_SEQUENCE};
use crate::environment::grid_environment_traits::*;
use crate::util::error::*;
use crate::util::grid_utilities::valid_between;
use crate::util::logging::*;
use crate::util::name_utilities::*;
use crate::validator::attribute_certificate::*;
use crate::validator::grid_certificate::*;
use crate::validator::path_results::ChainValidationResults;
use crate::validator::path_settings::*;
use crate::validator::path_validator::validate_chain;

fn ac_failure(status: AcValidationStatus) -> Error {
    Error::AttributeCertificate(status)
}

fn log_ac_error(ac: &GridAttributeCertificate, msg: &str) {
    match ac.issuer_name() {
        Some(n) => log_error_for_name(n, msg),
        None => log_message(&PeLogLevels::PeError, msg),
    }
}

/// `openssl_pairs` returns the (subject, issuer) names of each certificate in OpenSSL form.
pub fn openssl_pairs(certs: &[GridCertificate]) -> Vec<(String, String)> {
    certs
        .iter()
        .map(|c| (name_to_openssl(c.subject()), name_to_openssl(c.issuer())))
        .collect()
}

/// `resolve_issuer_chain` returns the certificate chain of the attribute certificate issuer,
/// issuer first.
///
/// When the bundled ACCerts match an LSC record for the VO and server, the bundle is the chain and
/// the attribute certificate signature must verify under the key of its first certificate
/// (`BadSignature` otherwise). Otherwise the first VOMS server certificate configured for the issuer
/// name and VO whose key verifies the signature is the sole issuer certificate. `UnknownACIssuer`
/// results when neither applies.
pub fn resolve_issuer_chain(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    ac: &GridAttributeCertificate,
) -> Result<Vec<GridCertificate>> {
    let origin = ac.voms_origin()?;
    let bundle = ac.ac_certs()?;

    if let Some(origin) = &origin {
        if let Some(lsc) = store.lsc_for(&origin.vo, &origin.host) {
            if !bundle.is_empty() && lsc.matches(&openssl_pairs(&bundle)) {
                if let Err(e) = verify_signed(engine, &ac.encoded_ac, bundle[0].public_key()) {
                    log_ac_error(
                        ac,
                        format!("attribute certificate signature error: {:?}", e).as_str(),
                    );
                    return Err(ac_failure(AcValidationStatus::BadSignature));
                }
                return Ok(bundle);
            }
            debug!(
                "LSC record for {}/{} does not match the bundled certificates",
                origin.vo, origin.host
            );
        }
    }

    let vo = origin.as_ref().map(|o| o.vo.as_str()).unwrap_or_default();
    let issuer_hash = match ac.issuer_hash() {
        Ok(h) => h,
        Err(Error::NotFound) => {
            log_ac_error(ac, "attribute certificate issuer has no directoryName");
            return Err(ac_failure(AcValidationStatus::UnknownACIssuer));
        }
        Err(e) => return Err(e),
    };
    for candidate in store.aa_candidates_for(&issuer_hash, vo) {
        if verify_signed(engine, &ac.encoded_ac, candidate.public_key()).is_ok() {
            // the trust store completes the path, not the bundle
            return Ok(vec![candidate.clone()]);
        }
        log_for_name(
            &PeLogLevels::PeDebug,
            candidate.subject(),
            "skipping VOMS server certificate whose key does not verify the attribute certificate",
        );
    }

    log_ac_error(ac, "unable to resolve attribute certificate issuer");
    Err(ac_failure(AcValidationStatus::UnknownACIssuer))
}

/// `check_ac_validity` verifies the attribute certificate is valid at the time of interest.
pub fn check_ac_validity(vs: &ValidationSettings, ac: &GridAttributeCertificate) -> Result<()> {
    match valid_between(ac.not_before(), ac.not_after(), get_time_of_interest(vs)) {
        Ok(_) => Ok(()),
        Err(PathValidationStatus::NotYetValid) => {
            log_ac_error(ac, "attribute certificate is not yet valid");
            Err(ac_failure(AcValidationStatus::NotYetValid))
        }
        Err(_) => {
            log_ac_error(ac, "attribute certificate is expired");
            Err(ac_failure(AcValidationStatus::Expired))
        }
    }
}

/// `check_ac_targets` verifies the local host is listed when the attribute certificate carries a
/// targetInformation extension. An attribute certificate with targets never matches when no local
/// host is known. Host names are compared without regard to case.
pub fn check_ac_targets(
    vs: &ValidationSettings,
    ac: &GridAttributeCertificate,
    host: Option<&str>,
) -> Result<()> {
    if !get_check_ac_targets(vs) {
        return Ok(());
    }
    let targets = match ac.targets()? {
        Some(t) => t,
        None => return Ok(()),
    };
    let local = match host {
        Some(h) => Some(h.to_string()),
        None => get_host_name(vs),
    };
    if let Some(local) = local {
        if targets.iter().any(|t| t.eq_ignore_ascii_case(&local)) {
            return Ok(());
        }
    }
    log_ac_error(ac, "local host is not a target of the attribute certificate");
    Err(ac_failure(AcValidationStatus::TargetMismatch))
}

/// `check_ac_critical_extensions` verifies no extension other than targetInformation is critical.
pub fn check_ac_critical_extensions(ac: &GridAttributeCertificate) -> Result<()> {
    if let Some(oid) = ac.unprocessed_critical_extension() {
        log_ac_error(
            ac,
            format!("unprocessed critical attribute certificate extension: {}", oid).as_str(),
        );
        return Err(ac_failure(AcValidationStatus::UnhandledCriticalExtension));
    }
    Ok(())
}

/// `verify_attribute_certificate` validates a VOMS attribute certificate.
///
/// The issuer chain is resolved (see [`resolve_issuer_chain`]) and validated like any other chain;
/// a rejection is reported as `UntrustedACIssuer` carrying the chain status. Then validity, targets
/// and critical extensions are checked in that order. `host` overrides `PS_HOST_NAME`.
pub fn verify_attribute_certificate(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    vs: &ValidationSettings,
    ac: &GridAttributeCertificate,
    host: Option<&str>,
) -> Result<()> {
    let chain = resolve_issuer_chain(engine, store, ac)?;

    let mut results = ChainValidationResults::new();
    match validate_chain(engine, store, vs, &chain, &mut results) {
        Ok(()) => {}
        Err(Error::PathValidation(status)) => {
            log_ac_error(ac, "attribute certificate issuer chain is not trusted");
            return Err(ac_failure(AcValidationStatus::UntrustedACIssuer(status)));
        }
        Err(e) => return Err(e),
    }

    check_ac_validity(vs, ac)?;
    check_ac_targets(vs, ac, host)?;
    check_ac_critical_extensions(ac)?;

    if let Some(n) = ac.issuer_name() {
        log_for_name(&PeLogLevels::PeInfo, n, "attribute certificate validated");
    }
    Ok(())
}

/// `verify_holder` verifies the holder of the attribute certificate names the end entity
/// certificate, either by issuer and serial number or by subject name.
pub fn verify_holder(ac: &GridAttributeCertificate, eec: &GridCertificate) -> Result<()> {
    let holder = ac.holder();
    if let Some(bcid) = &holder.base_certificate_id {
        let issuer_ok = bcid.issuer.iter().any(|gn| match gn {
            GeneralName::DirectoryName(n) => {
                compare_names(n, eec.issuer())
            }
            _ => false,
        });
        if issuer_ok && bcid.serial.as_bytes() == eec.serial() {
            return Ok(());
        }
    }
    if let Some(gns) = &holder.entity_name {
        let subject_ok = gns.iter().any(|gn| match gn {
            GeneralName::DirectoryName(n) => {
                compare_names(n, eec.subject())
            }
            _ => false,
        });
        if subject_ok {
            return Ok(());
        }
    }
    log_error_for_name(
        eec.subject(),
        "attribute certificate holder does not name the certificate",
    );
    Err(ac_failure(AcValidationStatus::HolderMismatch))
}

/// `validate_all` returns the attribute certificates that validate, in order. Those that do not are
/// dropped and the reason logged.
pub fn validate_all(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    vs: &ValidationSettings,
    acs: &[GridAttributeCertificate],
    host: Option<&str>,
) -> Vec<GridAttributeCertificate> {
    acs.iter()
        .filter(|ac| match verify_attribute_certificate(engine, store, vs, ac, host) {
            Ok(()) => true,
            Err(e) => {
                info!("Dropping attribute certificate: {}", e);
                false
            }
        })
        .cloned()
        .collect()
}

/// `attribute_certificates_from_chain` returns the VOMS attribute certificates embedded in the
/// certificates of the chain, in chain order.
pub fn attribute_certificates_from_chain(
    chain: &[GridCertificate],
) -> Result<Vec<GridAttributeCertificate>> {
    let mut retval = Vec::new();
    for cert in chain {
        if let Some((_, v)) = cert.extension_value(&VOMS_AC_SEQUENCE) {
            let acs = decode_ac_sequence(v).map_err(|_| Error::MalformedExtension(VOMS_AC_SEQUENCE))?;
            for ac in acs {
                retval.push(GridAttributeCertificate::try_from(ac)?);
            }
        }
    }
    Ok(retval)
}
