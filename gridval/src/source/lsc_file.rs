//! Parser for VOMS LSC (list of signing certificates) files.
//!
//! An LSC file lists, one DN per line in OpenSSL form, the certificates a VOMS server is expected
//! to present as (subject, issuer) pairs: the subject of a certificate on one line and its issuer
//! on the next, starting with the VOMS server certificate. An alternative with an odd number of
//! lines is rejected with `Error::ParseError`. Lines that start with `-` separate alternatives and
//! `#` starts a comment.
//!
//! ```text
//! # subject, then issuer
//! /DC=org/DC=example/CN=voms.example.org
//! /DC=org/DC=example/CN=Example CA
//! ------ NEXT CHAIN ------
//! /DC=org/DC=example/CN=voms.example.org
//! /DC=org/DC=other/CN=Other CA
//! /DC=org/DC=other/CN=Other CA
//! /DC=org/DC=other/CN=Other Root
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::util::error::*;

/// `LscRecord` holds the chains configured for one VO and VOMS server. Each alternative is a list
/// of (subject, issuer) pairs starting with the VOMS server certificate.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct LscRecord {
    /// VO the record applies to
    pub vo: String,
    /// Host name of the VOMS server
    pub host: String,
    /// Alternative chains of (subject, issuer) pairs
    pub alternatives: Vec<Vec<(String, String)>>,
}

impl LscRecord {
    /// `matches` returns true if some alternative lists exactly the given (subject, issuer) pairs,
    /// in order.
    pub fn matches(&self, pairs: &[(String, String)]) -> bool {
        self.alternatives.iter().any(|alt| alt.as_slice() == pairs)
    }
}

fn close_alternative(
    dns: &mut Vec<String>,
    alternatives: &mut Vec<Vec<(String, String)>>,
) -> Result<()> {
    if dns.is_empty() {
        return Ok(());
    }
    if dns.len() % 2 != 0 {
        return Err(Error::ParseError);
    }
    let pairs = dns
        .chunks(2)
        .map(|p| (p[0].clone(), p[1].clone()))
        .collect();
    alternatives.push(pairs);
    dns.clear();
    Ok(())
}

/// `parse_lsc` parses the contents of an LSC file into a record for the given VO and host. A chain
/// with an odd number of DNs yields `Error::ParseError`.
pub fn parse_lsc(vo: &str, host: &str, contents: &str) -> Result<LscRecord> {
    let mut alternatives = Vec::new();
    let mut dns: Vec<String> = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('-') {
            close_alternative(&mut dns, &mut alternatives)?;
            continue;
        }
        dns.push(line.to_string());
    }
    close_alternative(&mut dns, &mut alternatives)?;

    Ok(LscRecord {
        vo: vo.to_string(),
        host: host.to_string(),
        alternatives,
    })
}

/// `read_lsc_file` reads and parses an LSC file. The host name is taken from the file name without
/// its `.lsc` suffix, following the `<vo>/<host>.lsc` layout of the VOMS directory.
pub fn read_lsc_file(vo: &str, path: &std::path::Path) -> Result<LscRecord> {
    let contents = std::fs::read_to_string(path)?;
    let host = match path.file_stem().and_then(|s| s.to_str()) {
        Some(h) => h,
        None => return Err(Error::ParseError),
    };
    parse_lsc(vo, host, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSC: &str = "# voms.example.org
/DC=org/DC=example/CN=voms.example.org
/DC=org/DC=example/CN=Example CA

------ NEXT CHAIN ------
/DC=org/DC=example/CN=voms.example.org
/DC=org/DC=other/CN=Intermediate
/DC=org/DC=other/CN=Intermediate
/DC=org/DC=other/CN=Root
";

    fn pair(s: &str, i: &str) -> (String, String) {
        (s.to_string(), i.to_string())
    }

    #[test]
    fn parses_alternatives() {
        let rec = parse_lsc("atlas", "voms.example.org", LSC).unwrap();
        assert_eq!("atlas", rec.vo);
        assert_eq!(2, rec.alternatives.len());
        assert_eq!(1, rec.alternatives[0].len());
        assert_eq!(2, rec.alternatives[1].len());
        assert!(rec.matches(&[pair(
            "/DC=org/DC=example/CN=voms.example.org",
            "/DC=org/DC=example/CN=Example CA"
        )]));
        assert!(!rec.matches(&[pair(
            "/DC=org/DC=example/CN=voms.example.org",
            "/DC=org/DC=other/CN=Intermediate"
        )]));
    }

    #[test]
    fn odd_chain_is_an_error() {
        assert_eq!(
            Err(Error::ParseError),
            parse_lsc("atlas", "h", "/CN=a\n/CN=b\n/CN=c\n")
        );
    }

    #[test]
    fn reads_file() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voms.example.org.lsc");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(LSC.as_bytes()).unwrap();
        let rec = read_lsc_file("atlas", &path).unwrap();
        assert_eq!("voms.example.org", rec.host);
        assert_eq!(2, rec.alternatives.len());
    }
}
