//! Functions related to Grid certificate chain validation operations
//!
//! Validation builds a path from the presented chain, locates a trust anchor and then checks
//! each link from the anchor toward the target. The anchor is checked as its own issuer. For each
//! certificate the checks run in this order:
//! name chaining, validity, signature, revocation, CA constraints (signing policy and
//! basicConstraints path length) or proxy issuance, critical extensions and proxy aggregation. The
//! first failure stops validation.

use alloc::format;

use crate::environment::grid_environment_traits::*;
use crate::revocation::crl::check_revocation;
use crate::util::error::*;
use crate::util::grid_utilities::valid_at_time;
use crate::util::logging::*;
use crate::util::name_utilities::*;
use crate::validator::cert_path::*;
use crate::validator::grid_certificate::*;
use crate::validator::path_results::*;
use crate::validator::path_settings::*;
use crate::validator::proxy_chain::*;
use crate::validator::proxy_info::*;
use crate::validator::signing_policy::*;

/// `check_name_chaining` verifies the issuer name of `cert` matches the subject name of `issuer`.
pub fn check_name_chaining(issuer: &GridCertificate, cert: &GridCertificate) -> Result<()> {
    if !compare_names(cert.issuer(), issuer.subject()) {
        log_error_for_name(cert.subject(), "issuer name does not match subject of issuer");
        return Err(Error::PathValidation(
            PathValidationStatus::NameChainingFailure,
        ));
    }
    Ok(())
}

/// `check_validity` verifies the certificate is valid at the time of interest.
pub fn check_validity(vs: &ValidationSettings, cert: &GridCertificate) -> Result<()> {
    let toi = get_time_of_interest(vs);
    valid_at_time(
        &cert.decoded_cert.tbs_certificate.validity,
        cert.subject(),
        toi,
        false,
    )?;
    Ok(())
}

/// `verify_signature` verifies the signature on `cert` using the public key of `issuer`. Any
/// failure, including an unsupported algorithm, is reported as `BadSignature`.
pub fn verify_signature(
    engine: &dyn SignatureEngine,
    issuer: &GridCertificate,
    cert: &GridCertificate,
) -> Result<()> {
    if let Err(e) = verify_signed(engine, &cert.encoded_cert, issuer.public_key()) {
        log_error_for_name(
            cert.subject(),
            format!("signature verification error: {:?}", e).as_str(),
        );
        return Err(Error::PathValidation(PathValidationStatus::BadSignature));
    }
    Ok(())
}

/// `check_signing_policy` verifies the signing policy of `issuer`, if any, allows the subject
/// and directoryName alternative names of `cert`.
pub fn check_signing_policy(
    store: &dyn TrustStore,
    vs: &ValidationSettings,
    issuer: &GridCertificate,
    cert: &GridCertificate,
) -> Result<()> {
    if !get_enforce_signing_policy(vs) {
        return Ok(());
    }
    let records = match store.signing_policy_for(&issuer.subject_hash()?) {
        Some(r) => r,
        None => return Ok(()),
    };
    let ca_subject = name_to_openssl(issuer.subject());
    if !allows(&ca_subject, &subject_candidates(cert), records) {
        log_error_for_name(
            cert.subject(),
            format!("signing policy of {} does not permit subject", ca_subject).as_str(),
        );
        return Err(Error::PathValidation(PathValidationStatus::PolicyViolation));
    }
    Ok(())
}

/// `check_basic_constraints` verifies the basicConstraints path length declared by the issuer of
/// the certificate at `index` in a root-first path is not less than the number of certificates
/// that follow it. Every certificate below counts, including end entities and proxies.
pub fn check_basic_constraints(path: &[GridCertificate], index: usize) -> Result<()> {
    if index == 0 || index >= path.len() {
        return Ok(());
    }
    let issuer = &path[index - 1];
    let pl = issuer.basic_constraints_path_length();
    if pl < 0 {
        return Ok(());
    }
    let below = path.len() - 1 - index;
    if (pl as u64) < below as u64 {
        log_error_for_name(
            issuer.subject(),
            format!(
                "basicConstraints path length {} exceeded by {} certificates",
                pl, below
            )
            .as_str(),
        );
        return Err(Error::PathValidation(PathValidationStatus::PathTooLong));
    }
    Ok(())
}

/// `check_critical_extensions` verifies the certificate marks no extension critical beyond key
/// usage, basic constraints, the key identifiers and the proxy certificate information
/// extensions.
pub fn check_critical_extensions(cert: &GridCertificate) -> Result<()> {
    if let Some(oid) = cert.unprocessed_critical_extension() {
        log_error_for_name(
            cert.subject(),
            format!("unprocessed critical extension: {}", oid).as_str(),
        );
        return Err(Error::PathValidation(
            PathValidationStatus::UnhandledCriticalExtension,
        ));
    }
    Ok(())
}

/// `check_proxy_subject` verifies the subject of a draft or RFC 3820 proxy is its issuer's
/// subject plus one commonName RDN.
pub fn check_proxy_subject(cert: &GridCertificate, info: &ProxyInfo) -> Result<()> {
    match info.kind() {
        ProxyKind::DraftRfc | ProxyKind::Rfc3820 => {
            if appended_common_name(cert).is_none() {
                log_error_for_name(
                    cert.subject(),
                    "proxy subject is not the issuer subject plus one CN",
                );
                return Err(Error::PathValidation(
                    PathValidationStatus::ProxySubjectMismatch,
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_link(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    vs: &ValidationSettings,
    path: &[GridCertificate],
    index: usize,
    state: &mut ProxyChainState,
) -> Result<()> {
    // the anchor is its own issuer
    let issuer = if index == 0 { &path[0] } else { &path[index - 1] };
    let cert = &path[index];

    check_name_chaining(issuer, cert)?;
    check_validity(vs, cert)?;
    verify_signature(engine, issuer, cert)?;
    if get_check_revocation_status(vs) {
        check_revocation(engine, store, issuer, cert, get_time_of_interest(vs))?;
    }

    if is_ca(issuer) {
        if index > 0 {
            check_signing_policy(store, vs, issuer, cert)?;
            check_basic_constraints(path, index)?;
        }
    } else if !is_proxy(cert) {
        log_error_for_name(cert.subject(), "certificate issued by a non-CA is not a proxy");
        return Err(Error::PathValidation(
            PathValidationStatus::NonCAIssuedNonProxy,
        ));
    }

    check_critical_extensions(cert)?;

    let info = classify(cert)?;
    check_proxy_subject(cert, &info)?;
    if let Err(e) = state.push(cert) {
        log_error_for_name(cert.subject(), format!("proxy chain error: {}", e).as_str());
        return Err(e);
    }
    if state.limited && !get_allow_limited_proxy(vs) {
        log_error_for_name(cert.subject(), "limited proxies are not accepted");
        return Err(Error::PathValidation(PathValidationStatus::PolicyViolation));
    }
    Ok(())
}

/// `validate_chain` validates a possibly unordered chain against the trust store.
///
/// The path is built from `certs[0]` (see [`build_path`]) and completed with a trust anchor (see
/// [`find_anchor`]), then every link is checked from the anchor toward the target. The outcome,
/// the validated path and the aggregated proxy properties are recorded in `results`.
///
/// Returns `Err(Error::PathValidation(status))` when the chain is rejected, `Err(Error::EmptyChain)`
/// when no certificates are presented and other errors when an extension cannot be decoded. In the
/// last case `results` records `EncodingError` at the offending position.
pub fn validate_chain(
    engine: &dyn SignatureEngine,
    store: &dyn TrustStore,
    vs: &ValidationSettings,
    certs: &[GridCertificate],
    results: &mut ChainValidationResults,
) -> Result<()> {
    let leaf_first = build_path(certs)?;
    let path = match find_anchor(store, &leaf_first) {
        Ok(p) => p,
        Err(Error::PathValidation(status)) => {
            results.set_failure(status, None);
            return Err(Error::PathValidation(status));
        }
        Err(e) => return Err(e),
    };
    results.validated_path = path.certificates;
    let path: &[GridCertificate] = &results.validated_path;

    let mut state = ProxyChainState::new();
    let mut outcome = Ok(());
    for index in 0..path.len() {
        if let Err(e) = check_link(engine, store, vs, path, index, &mut state) {
            outcome = Err((e, index));
            break;
        }
    }

    let failure: Option<(Error, usize)> = outcome.err();
    results.record_proxy_state(&state);
    match failure {
        None => {
            results.status = PathValidationStatus::Valid;
            results.failed_index = None;
            if let Some(target) = results.target() {
                log_for_name(&PeLogLevels::PeInfo, target.subject(), "chain validated");
            }
            Ok(())
        }
        Some((Error::PathValidation(status), index)) => {
            results.set_failure(status, Some(index));
            Err(Error::PathValidation(status))
        }
        Some((e, index)) => {
            log_error_for_name(
                results.validated_path[index].subject(),
                format!("certificate could not be processed: {}", e).as_str(),
            );
            results.set_failure(PathValidationStatus::EncodingError, Some(index));
            Err(e)
        }
    }
}
