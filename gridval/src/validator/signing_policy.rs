//! Evaluation of Globus signing policies, which restrict the subject names a CA may issue.
//!
//! Subjects and CA names are compared in the slash separated OpenSSL form produced by
//! [`name_to_openssl`]. Patterns in `cond_subjects` may use `*` to match any run of characters;
//! matching is case-sensitive.

use alloc::{string::String, vec::Vec};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::util::name_utilities::name_to_openssl;
use crate::validator::grid_certificate::GridCertificate;

/// One `access_id_CA` block from a signing policy file
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SigningPolicyRecord {
    /// Subject of the CA the record applies to, in OpenSSL form
    pub access_id_ca: String,
    /// Rights granted to the CA, e.g. `CA:sign`. Informational only.
    pub pos_rights: Vec<String>,
    /// Subject name patterns the CA may issue
    pub cond_subjects: Vec<String>,
}

/// `find_issuer` returns the index of the first record at or after `start` whose `access_id_ca`
/// equals `ca_subject`.
pub fn find_issuer(records: &[SigningPolicyRecord], ca_subject: &str, start: usize) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, r)| r.access_id_ca == ca_subject)
        .map(|(i, _)| i)
}

/// `glob_matches` returns true if the subject matches the pattern in full, where `*` matches any
/// run of characters, including none.
pub fn glob_matches(pattern: &str, subject: &str) -> bool {
    let re = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    match Regex::new(&re) {
        Ok(re) => re.is_match(subject),
        Err(_) => false,
    }
}

/// `allows` returns true if the CA named `ca_subject` may issue every one of the candidate names.
///
/// When no record applies to the CA no restriction is configured and the names are allowed.
/// Otherwise each candidate must match at least one `cond_subjects` pattern of a record for the CA.
pub fn allows(ca_subject: &str, candidates: &[String], records: &[SigningPolicyRecord]) -> bool {
    let mut applicable = Vec::new();
    let mut start = 0;
    while let Some(i) = find_issuer(records, ca_subject, start) {
        applicable.push(&records[i]);
        start = i + 1;
    }
    if applicable.is_empty() {
        return true;
    }

    candidates.iter().all(|candidate| {
        applicable
            .iter()
            .any(|r| r.cond_subjects.iter().any(|p| glob_matches(p, candidate)))
    })
}

/// `subject_candidates` returns the names of the certificate that are subject to signing policy:
/// the subject and any directoryName subject alternative names.
pub fn subject_candidates(cert: &GridCertificate) -> Vec<String> {
    let mut retval = vec![name_to_openssl(cert.subject())];
    for n in cert.alt_directory_names() {
        retval.push(name_to_openssl(n));
    }
    retval
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ca: &str, patterns: &[&str]) -> SigningPolicyRecord {
        SigningPolicyRecord {
            access_id_ca: ca.to_string(),
            pos_rights: vec!["CA:sign".to_string()],
            cond_subjects: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn globbing() {
        assert!(glob_matches("/C=US/O=Grid/*", "/C=US/O=Grid/CN=Alice"));
        assert!(glob_matches("/C=US/O=Grid/*", "/C=US/O=Grid/"));
        assert!(!glob_matches("/C=US/O=Grid/*", "/C=US/O=Other/CN=Alice"));
        assert!(!glob_matches("/C=US/O=Grid/*", "/c=us/o=grid/CN=Alice"));
        assert!(glob_matches("/O=a.b (c)/CN=*", "/O=a.b (c)/CN=x"));
        assert!(!glob_matches("/O=a.b/CN=x", "/O=aXb/CN=x"));
    }

    #[test]
    fn find_issuer_restarts() {
        let records = vec![
            record("/CN=CA1", &["/O=One/*"]),
            record("/CN=CA2", &["/O=Two/*"]),
            record("/CN=CA1", &["/O=Three/*"]),
        ];
        assert_eq!(Some(0), find_issuer(&records, "/CN=CA1", 0));
        assert_eq!(Some(2), find_issuer(&records, "/CN=CA1", 1));
        assert_eq!(None, find_issuer(&records, "/CN=CA1", 3));
        assert_eq!(None, find_issuer(&records, "/CN=CA3", 0));
    }

    #[test]
    fn allows_candidates() {
        let records = vec![
            record("/CN=CA1", &["/O=One/*"]),
            record("/CN=CA1", &["/O=Three/*"]),
        ];
        let ok = vec!["/O=One/CN=a".to_string(), "/O=Three/CN=b".to_string()];
        assert!(allows("/CN=CA1", &ok, &records));
        let bad = vec!["/O=One/CN=a".to_string(), "/O=Two/CN=b".to_string()];
        assert!(!allows("/CN=CA1", &bad, &records));
        // no record for the CA means no restriction
        assert!(allows("/CN=CA9", &bad, &records));
    }
}
