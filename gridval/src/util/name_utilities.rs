//! Distinguished name utilities: comparison, OpenSSL-style string rendering and the subject hash
//! used to key trust store lookups

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use sha1::{Digest, Sha1};

use const_oid::db::rfc2256::STATE_OR_PROVINCE_NAME;
use const_oid::db::rfc3280::{EMAIL_ADDRESS, PSEUDONYM};
use const_oid::db::rfc4519::{
    COMMON_NAME, COUNTRY_NAME, DN_QUALIFIER, DOMAIN_COMPONENT, GENERATION_QUALIFIER, GIVEN_NAME,
    INITIALS, LOCALITY_NAME, NAME, ORGANIZATIONAL_UNIT_NAME, ORGANIZATION_NAME, SERIAL_NUMBER,
    STREET, SURNAME, TITLE,
};
use der::asn1::{Any, Ia5String, ObjectIdentifier, PrintableString, SetOfVec};
use der::{Encode, Tag, Tagged};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RelativeDistinguishedName};

use crate::util::error::*;

/// `UID` is the userId attribute type (RFC 4519), found in many Grid user certificates.
pub const UID: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1");

/// `attribute_label` returns the short label OpenSSL uses when rendering the attribute type, or the
/// dotted form of the OID when there is no well-known label.
pub fn attribute_label(oid: &ObjectIdentifier) -> String {
    let label = if *oid == COMMON_NAME {
        "CN"
    } else if *oid == COUNTRY_NAME {
        "C"
    } else if *oid == ORGANIZATION_NAME {
        "O"
    } else if *oid == ORGANIZATIONAL_UNIT_NAME {
        "OU"
    } else if *oid == LOCALITY_NAME {
        "L"
    } else if *oid == STATE_OR_PROVINCE_NAME {
        "ST"
    } else if *oid == DOMAIN_COMPONENT {
        "DC"
    } else if *oid == EMAIL_ADDRESS {
        "emailAddress"
    } else if *oid == UID {
        "UID"
    } else if *oid == SERIAL_NUMBER {
        "serialNumber"
    } else if *oid == STREET {
        "street"
    } else if *oid == TITLE {
        "title"
    } else if *oid == SURNAME {
        "SN"
    } else if *oid == GIVEN_NAME {
        "GN"
    } else if *oid == INITIALS {
        "initials"
    } else if *oid == GENERATION_QUALIFIER {
        "generationQualifier"
    } else if *oid == DN_QUALIFIER {
        "dnQualifier"
    } else if *oid == PSEUDONYM {
        "pseudonym"
    } else if *oid == NAME {
        "name"
    } else {
        return oid.to_string();
    };
    label.to_string()
}

/// `attribute_value_to_string` returns the value of a string-typed attribute without any escaping,
/// or None when the value is not one of the string types found in Grid certificates.
pub fn attribute_value_to_string(atav: &AttributeTypeAndValue) -> Option<String> {
    match atav.value.tag() {
        Tag::PrintableString => atav
            .value
            .decode_as()
            .ok()
            .map(|s: PrintableString| s.to_string()),
        Tag::Utf8String => atav.value.decode_as::<String>().ok(),
        Tag::Ia5String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Ia5String| s.to_string()),
        Tag::TeletexString | Tag::VisibleString => {
            Some(String::from_utf8_lossy(atav.value.value()).to_string())
        }
        _ => None,
    }
}

fn attribute_value_or_hex(atav: &AttributeTypeAndValue) -> String {
    match attribute_value_to_string(atav) {
        Some(s) => s,
        None => {
            let mut s = "#".to_string();
            for b in atav.value.value() {
                s.push_str(&format!("{:02x}", b));
            }
            s
        }
    }
}

/// `name_to_openssl` renders a Name in the slash separated form used by OpenSSL, signing policy
/// files and LSC files, i.e., `/C=US/O=Example/CN=Alice`. RDNs appear in encoded order and the
/// members of a multi-valued RDN are joined with `+`.
pub fn name_to_openssl(name: &Name) -> String {
    let mut s = String::new();
    for rdn in name.0.iter() {
        for (i, atav) in rdn.0.iter().enumerate() {
            if i == 0 {
                s.push('/');
            } else {
                s.push('+');
            }
            s.push_str(&attribute_label(&atav.oid));
            s.push('=');
            s.push_str(&attribute_value_or_hex(atav));
        }
    }
    s
}

/// `canonical_value` lowercases a string value, trims it and collapses runs of whitespace.
pub(crate) fn canonical_value(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

fn canonical_rdn(rdn: &RelativeDistinguishedName) -> Result<RelativeDistinguishedName> {
    let mut atavs = Vec::new();
    for atav in rdn.0.iter() {
        let value = match attribute_value_to_string(atav) {
            Some(v) => Any::new(Tag::Utf8String, canonical_value(&v).into_bytes())?,
            None => atav.value.clone(),
        };
        atavs.push(AttributeTypeAndValue {
            oid: atav.oid,
            value,
        });
    }
    Ok(RelativeDistinguishedName(SetOfVec::try_from(atavs)?))
}

/// `canonical_name_encoding` returns the concatenated DER encodings of each RDN of the name after
/// string values have been canonicalized. Names that differ only in string type, case or
/// whitespace produce the same encoding.
pub fn canonical_name_encoding(name: &Name) -> Result<Vec<u8>> {
    let mut enc = Vec::new();
    for rdn in name.0.iter() {
        let crdn = canonical_rdn(rdn)?;
        enc.extend_from_slice(&crdn.to_der()?);
    }
    Ok(enc)
}

/// `name_hash` returns the eight hex digit subject hash used to index trust store contents: the
/// first four bytes of the SHA-1 digest of the canonical name encoding, read as a little-endian
/// integer.
pub fn name_hash(name: &Name) -> Result<String> {
    let enc = canonical_name_encoding(name)?;
    let digest = Sha1::digest(enc.as_slice());
    let h = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
    Ok(format!("{:08x}", h))
}

/// [`compare_names`] compares two Name values returning true if they match and false otherwise.
/// String values are compared without regard to case, string type or repeated whitespace.
pub fn compare_names(left: &Name, right: &Name) -> bool {
    // no match if not the same number of RDNs
    if left.0.len() != right.0.len() {
        return false;
    }
    if left == right {
        return true;
    }

    match (
        canonical_name_encoding(left),
        canonical_name_encoding(right),
    ) {
        (Ok(l), Ok(r)) => l == r,
        _ => false,
    }
}

/// `compare_rdns` compares two RDNs using the same rules as [`compare_names`].
pub fn compare_rdns(left: &RelativeDistinguishedName, right: &RelativeDistinguishedName) -> bool {
    if left == right {
        return true;
    }
    match (canonical_rdn(left), canonical_rdn(right)) {
        (Ok(l), Ok(r)) => l == r,
        _ => false,
    }
}

/// `get_leaf_rdn` returns the last (most specific) RDN of the name, if any.
pub fn get_leaf_rdn(name: &Name) -> Option<&RelativeDistinguishedName> {
    name.0.last()
}

/// `common_name_of_rdn` returns the value of the RDN when it consists of a single commonName
/// attribute.
pub fn common_name_of_rdn(rdn: &RelativeDistinguishedName) -> Option<String> {
    if rdn.0.len() != 1 {
        return None;
    }
    let atav = rdn.0.iter().next()?;
    if atav.oid != COMMON_NAME {
        return None;
    }
    attribute_value_to_string(atav)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn openssl_rendering_follows_encoded_order() {
        let name = Name::from_str("CN=Alice Smith,OU=People,O=Example,C=US").unwrap();
        assert_eq!(
            "/C=US/O=Example/OU=People/CN=Alice Smith",
            name_to_openssl(&name)
        );
    }

    #[test]
    fn hash_ignores_case_whitespace_and_string_type() {
        let a = Name::from_str("CN=Alice  Smith,O=Example").unwrap();
        let b = Name::from_str("CN=alice smith,O=EXAMPLE").unwrap();
        assert_eq!(name_hash(&a).unwrap(), name_hash(&b).unwrap());
        assert!(compare_names(&a, &b));
        assert_eq!(8, name_hash(&a).unwrap().len());

        // same name with PrintableString values
        let mut c = b.clone();
        for rdn in c.0.iter_mut() {
            let mut atavs = Vec::new();
            for atav in rdn.0.iter() {
                let v = attribute_value_to_string(atav).unwrap();
                atavs.push(AttributeTypeAndValue {
                    oid: atav.oid,
                    value: Any::new(Tag::PrintableString, v.as_bytes()).unwrap(),
                });
            }
            *rdn = RelativeDistinguishedName(SetOfVec::try_from(atavs).unwrap());
        }
        assert_ne!(b, c);
        assert!(compare_names(&b, &c));
        assert_eq!(name_hash(&b).unwrap(), name_hash(&c).unwrap());
    }

    #[test]
    fn different_names_differ() {
        let a = Name::from_str("CN=Alice,O=Example").unwrap();
        let b = Name::from_str("CN=Bob,O=Example").unwrap();
        let c = Name::from_str("O=Example").unwrap();
        assert!(!compare_names(&a, &b));
        assert!(!compare_names(&a, &c));
        assert_ne!(name_hash(&a).unwrap(), name_hash(&b).unwrap());
    }

    #[test]
    fn leaf_common_name() {
        let a = Name::from_str("CN=proxy,CN=Alice,O=Example").unwrap();
        let leaf = get_leaf_rdn(&a).unwrap();
        assert_eq!(Some("proxy".to_string()), common_name_of_rdn(leaf));
        assert_eq!("CN", attribute_label(&COMMON_NAME));
        assert_eq!("1.2.3.4", attribute_label(&ObjectIdentifier::new_unwrap("1.2.3.4")));
    }
}
