//! Parser for Globus signing policy files (`<hash>.signing_policy`).
//!
//! ```text
//! # EACL for Example CA
//! access_id_CA   X509    '/C=US/O=Example/CN=Example CA'
//! pos_rights     globus  CA:sign
//! cond_subjects  globus  '"/C=US/O=Example/*"  "/C=US/O=Example Users/*"'
//! ```
//!
//! Each `access_id_CA` line starts a new record and the following `pos_rights` and `cond_subjects`
//! lines add to it. `#` starts a comment.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use lazy_static::lazy_static;
use regex::Regex;

use crate::util::error::*;
use crate::validator::signing_policy::SigningPolicyRecord;

lazy_static! {
    static ref LINE_RE: Regex =
        Regex::new(r"^\s*(\S+)\s+(\S+)\s+(.*?)\s*$").unwrap();
    static ref QUOTED_RE: Regex = Regex::new(r#""([^"]*)""#).unwrap();
}

fn strip_single_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

fn split_patterns(value: &str) -> Vec<String> {
    let inner = strip_single_quotes(value);
    let quoted: Vec<String> = QUOTED_RE
        .captures_iter(inner)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    if !quoted.is_empty() {
        quoted
    } else {
        inner.split_whitespace().map(|s| s.to_string()).collect()
    }
}

/// `parse_signing_policy` parses the contents of a signing policy file into records in file order.
///
/// Lines with an unknown keyword, too few fields or `pos_rights`/`cond_subjects` before the first
/// `access_id_CA` yield `Error::ParseError`.
pub fn parse_signing_policy(contents: &str) -> Result<Vec<SigningPolicyRecord>> {
    let mut records: Vec<SigningPolicyRecord> = Vec::new();
    for line in contents.lines() {
        let line = strip_comment(line);
        if line.trim().is_empty() {
            continue;
        }
        let caps = match LINE_RE.captures(line) {
            Some(c) => c,
            None => return Err(Error::ParseError),
        };
        let keyword = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        match keyword.to_ascii_lowercase().as_str() {
            "access_id_ca" => records.push(SigningPolicyRecord {
                access_id_ca: strip_single_quotes(value).to_string(),
                ..Default::default()
            }),
            "pos_rights" => match records.last_mut() {
                Some(r) => r
                    .pos_rights
                    .extend(value.split_whitespace().map(|s| s.to_string())),
                None => return Err(Error::ParseError),
            },
            "cond_subjects" => match records.last_mut() {
                Some(r) => r.cond_subjects.extend(split_patterns(value)),
                None => return Err(Error::ParseError),
            },
            _ => return Err(Error::ParseError),
        }
    }
    Ok(records)
}

// a `#` inside single quotes is part of the value
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

/// `read_signing_policy_file` reads and parses a signing policy file.
pub fn read_signing_policy_file(path: &std::path::Path) -> Result<Vec<SigningPolicyRecord>> {
    let contents = std::fs::read_to_string(path)?;
    parse_signing_policy(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "# EACL for Example CA
access_id_CA   X509    '/C=US/O=Example/CN=Example CA'
pos_rights     globus  CA:sign
cond_subjects  globus  '\"/C=US/O=Example/*\"  \"/C=US/O=Example Users/*\"'

 # second block
access_id_CA   X509    '/C=US/O=Example/CN=Example CA'
pos_rights     globus  CA:sign
cond_subjects  globus  \"/C=US/O=Other/*\"
";

    #[test]
    fn parses_records() {
        let records = parse_signing_policy(POLICY).unwrap();
        assert_eq!(2, records.len());
        assert_eq!("/C=US/O=Example/CN=Example CA", records[0].access_id_ca);
        assert_eq!(vec!["CA:sign".to_string()], records[0].pos_rights);
        assert_eq!(
            vec![
                "/C=US/O=Example/*".to_string(),
                "/C=US/O=Example Users/*".to_string()
            ],
            records[0].cond_subjects
        );
        assert_eq!(vec!["/C=US/O=Other/*".to_string()], records[1].cond_subjects);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(
            Err(Error::ParseError),
            parse_signing_policy("pos_rights globus CA:sign\n")
        );
        assert_eq!(
            Err(Error::ParseError),
            parse_signing_policy("access_id_CA X509 '/CN=a'\nbogus globus x\n")
        );
        assert_eq!(Ok(Vec::new()), parse_signing_policy("# nothing\n\n"));
    }

    #[test]
    fn hash_in_quotes_is_kept() {
        let records =
            parse_signing_policy("access_id_CA X509 '/O=a#b/CN=CA' # trailing\n").unwrap();
        assert_eq!("/O=a#b/CN=CA", records[0].access_id_ca);
    }

    #[test]
    fn reads_file() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1a2b3c4d.signing_policy");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(POLICY.as_bytes()).unwrap();
        let records = read_signing_policy_file(&path).unwrap();
        assert_eq!(parse_signing_policy(POLICY).unwrap(), records);

        assert_eq!(
            Err(Error::StdIoError(std::io::ErrorKind::NotFound)),
            read_signing_policy_file(&dir.path().join("missing.signing_policy"))
        );
    }
}
