//! Utility functions that support chain and attribute certificate processing

use std::time::{SystemTime, UNIX_EPOCH};

use x509_cert::name::Name;
use x509_cert::time::Validity;

use crate::util::error::*;
use crate::util::logging::*;

/// `now_as_unix_secs` returns the current time as seconds since the Unix epoch, or zero if the
/// clock reads earlier than the epoch.
pub fn now_as_unix_secs() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => 0,
    }
}

/// `valid_at_time` evaluates the not_before and not_after fields of the given Validity instance
/// and provides an indication of validity relative to presented time of interest.
///
/// It returns the number of seconds left to live if the certificate is valid at the given time or
/// an error indicating which field failed if the certificate is not valid. The not_before field is
/// evaluated first.
///
/// To stifle logging output upon error, pass true for the stifle_log parameter.
pub fn valid_at_time(
    validity: &Validity,
    subject: &Name,
    toi: u64,
    stifle_log: bool,
) -> Result<u64> {
    if 0 == toi {
        // zero is used to disable validity check
        return Ok(0);
    }

    let nb = validity.not_before.to_unix_duration().as_secs();
    if nb > toi {
        if !stifle_log {
            log_error_for_name(subject, "certificate is not yet valid, i.e., not_before is after the configured time of interest");
        }
        return Err(Error::PathValidation(PathValidationStatus::NotYetValid));
    }

    let na = validity.not_after.to_unix_duration().as_secs();
    if na < toi {
        if !stifle_log {
            log_error_for_name(
                subject,
                format!(
                    "certificate is expired relative to the configured time of interest: {}",
                    validity.not_after
                )
                .as_str(),
            );
        }
        Err(Error::PathValidation(PathValidationStatus::Expired))
    } else {
        Ok(na - toi)
    }
}

/// `valid_between` is the attribute certificate and CRL counterpart of [`valid_at_time`] for
/// windows already expressed as seconds since the Unix epoch.
pub fn valid_between(not_before: u64, not_after: u64, toi: u64) -> core::result::Result<u64, PathValidationStatus> {
    if 0 == toi {
        return Ok(0);
    }
    if not_before > toi {
        return Err(PathValidationStatus::NotYetValid);
    }
    if not_after < toi {
        return Err(PathValidationStatus::Expired);
    }
    Ok(not_after - toi)
}
