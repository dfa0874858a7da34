//! Structures and functions related to configuring chain and attribute certificate validation

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Result as SerdeResult;

use gridprocmacros::*;

use crate::util::error::*;
use crate::util::grid_utilities::now_as_unix_secs;

/// `ValidationSettingsTypes` is used to define a variant map with types associated with
/// validating Grid certificate chains and attribute certificates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationSettingsTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u64 values
    U64(u64),
    /// Represents String values
    String(String),
}

/// `ValidationSettings` is a typedef for a `BTreeMap` that maps setting names to a variant map.
/// Settings are read and written using the `get_`/`set_` functions in this module.
pub type ValidationSettings = BTreeMap<String, ValidationSettingsTypes>;

/// `PS_TIME_OF_INTEREST` is used to retrieve the time of interest, as seconds since the Unix
/// epoch, at which validity periods are evaluated. Zero disables validity checks. Defaults to the
/// current time.
pub static PS_TIME_OF_INTEREST: &str = "psTimeOfInterest";

/// `PS_CHECK_REVOCATION_STATUS` governs whether CRLs from the trust store are consulted. Defaults to true.
pub static PS_CHECK_REVOCATION_STATUS: &str = "psCheckRevocationStatus";

/// `PS_ENFORCE_SIGNING_POLICY` governs whether signing policies from the trust store are enforced.
/// Defaults to true.
pub static PS_ENFORCE_SIGNING_POLICY: &str = "psEnforceSigningPolicy";

/// `PS_HOST_NAME` is the local host name that attribute certificate targets must list.
pub static PS_HOST_NAME: &str = "psHostName";

/// `PS_CHECK_AC_TARGETS` governs whether the targetInformation extension of attribute
/// certificates is evaluated. Defaults to true.
pub static PS_CHECK_AC_TARGETS: &str = "psCheckAcTargets";

/// `PS_ALLOW_LIMITED_PROXY` governs whether chains containing limited proxies are accepted.
/// Defaults to true.
pub static PS_ALLOW_LIMITED_PROXY: &str = "psAllowLimitedProxy";

vs_gets_and_sets_with_default!(PS_TIME_OF_INTEREST, u64, now_as_unix_secs());
vs_gets_and_sets_with_default!(PS_CHECK_REVOCATION_STATUS, bool, true);
vs_gets_and_sets_with_default!(PS_ENFORCE_SIGNING_POLICY, bool, true);
vs_gets_and_sets!(PS_HOST_NAME, String);
vs_gets_and_sets_with_default!(PS_CHECK_AC_TARGETS, bool, true);
vs_gets_and_sets_with_default!(PS_ALLOW_LIMITED_PROXY, bool, true);

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON
/// data that represents [`ValidationSettings`]. A missing file name or missing file yields empty
/// settings, i.e., all defaults; a file that cannot be parsed yields `Error::ParseError`.
pub fn read_settings(fname: &Option<String>) -> Result<ValidationSettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if Path::exists(p) {
            let json = std::fs::read(p)?;
            let r: SerdeResult<ValidationSettings> = serde_json::from_slice(&json);
            return match r {
                Ok(vs) => Ok(vs),
                Err(_e) => Err(Error::ParseError),
            };
        }
    }
    Ok(ValidationSettings::new())
}

#[test]
fn test_default_gets_vs() {
    let vs = ValidationSettings::new();
    assert!(get_time_of_interest(&vs) > 1_600_000_000);
    assert!(get_check_revocation_status(&vs));
    assert!(get_enforce_signing_policy(&vs));
    assert_eq!(None, get_host_name(&vs));
    assert!(get_check_ac_targets(&vs));
    assert!(get_allow_limited_proxy(&vs));
}

#[test]
fn test_sets_vs() {
    let mut vs = ValidationSettings::new();
    set_time_of_interest(&mut vs, 0);
    set_check_revocation_status(&mut vs, false);
    set_enforce_signing_policy(&mut vs, false);
    set_host_name(&mut vs, "host.example.org".to_string());
    set_check_ac_targets(&mut vs, false);
    set_allow_limited_proxy(&mut vs, false);

    assert_eq!(0, get_time_of_interest(&vs));
    assert!(!get_check_revocation_status(&vs));
    assert!(!get_enforce_signing_policy(&vs));
    assert_eq!(Some("host.example.org".to_string()), get_host_name(&vs));
    assert!(!get_check_ac_targets(&vs));
    assert!(!get_allow_limited_proxy(&vs));
}

#[test]
fn test_read_settings() {
    use std::io::Write;

    let mut vs = ValidationSettings::new();
    set_time_of_interest(&mut vs, 1_700_000_000);
    set_host_name(&mut vs, "host.example.org".to_string());
    let json = serde_json::to_string(&vs).unwrap();

    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    let name = f.path().to_str().unwrap().to_string();
    let read = read_settings(&Some(name)).unwrap();
    assert_eq!(vs, read);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    bad.write_all(b"not json").unwrap();
    let bad_name = bad.path().to_str().unwrap().to_string();
    assert_eq!(Err(Error::ParseError), read_settings(&Some(bad_name)));

    assert_eq!(ValidationSettings::new(), read_settings(&None).unwrap());
    assert_eq!(
        ValidationSettings::new(),
        read_settings(&Some("/does/not/exist.json".to_string())).unwrap()
    );
}
