//! ASN.1 definitions for the proxy certificate information extension defined in
//! [RFC 3820 Section 3.8] and its pre-standard Globus variant.
//!
//! ```text
//! ProxyCertInfoExtension ::= SEQUENCE {
//!      pCPathLenConstraint   ProxyCertPathLengthConstraint OPTIONAL,
//!      proxyPolicy           ProxyPolicy }
//!
//! ProxyCertPathLengthConstraint ::= INTEGER
//!
//! ProxyPolicy ::= SEQUENCE {
//!      policyLanguage        OBJECT IDENTIFIER,
//!      policy                OCTET STRING OPTIONAL }
//! ```
//!
//! The draft form issued by older Globus Toolkit releases places the path length constraint after
//! the proxy policy. Both orders are accepted when decoding; encoding always uses the RFC order.
//!
//! [RFC 3820 Section 3.8]: https://datatracker.ietf.org/doc/html/rfc3820#section-3.8

use der::asn1::{ObjectIdentifier, OctetString};
use der::{
    DecodeValue, Encode, EncodeValue, FixedTag, Header, Length, Reader, Sequence, Tag, Writer,
};

/// id-pe-proxyCertInfo OBJECT IDENTIFIER ::= { id-pe 14 }
pub const PKIX_PE_PROXY_CERT_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.14");

/// Globus draft proxy certificate information OID, used before RFC 3820 was published
pub const GT_PROXY_CERT_INFO_DRAFT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.222");

/// id-ppl-inheritAll OBJECT IDENTIFIER ::= { id-ppl 1 }
pub const PPL_INHERIT_ALL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.1");

/// id-ppl-independent OBJECT IDENTIFIER ::= { id-ppl 2 }
pub const PPL_INDEPENDENT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.2");

/// Globus limited proxy policy language OID
pub const PPL_LIMITED: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.1.1.9");

/// ProxyPolicy as defined in [RFC 3820 Section 3.8.2].
///
/// [RFC 3820 Section 3.8.2]: https://datatracker.ietf.org/doc/html/rfc3820#section-3.8.2
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct ProxyPolicy {
    pub policy_language: ObjectIdentifier,
    pub policy: Option<OctetString>,
}

/// ProxyCertInfo as defined in [RFC 3820 Section 3.8].
///
/// [RFC 3820 Section 3.8]: https://datatracker.ietf.org/doc/html/rfc3820#section-3.8
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxyCertInfo {
    /// Maximum depth of the proxy path that may follow this certificate. Absent means unlimited.
    pub path_len_constraint: Option<u32>,
    /// Delegation policy
    pub proxy_policy: ProxyPolicy,
}

impl FixedTag for ProxyCertInfo {
    const TAG: Tag = Tag::Sequence;
}

impl<'a> DecodeValue<'a> for ProxyCertInfo {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let leading: Option<u32> = reader.decode()?;
            let proxy_policy: ProxyPolicy = reader.decode()?;
            let trailing: Option<u32> = if leading.is_none() {
                reader.decode()?
            } else {
                None
            };
            Ok(Self {
                path_len_constraint: leading.or(trailing),
                proxy_policy,
            })
        })
    }
}

impl EncodeValue for ProxyCertInfo {
    fn value_len(&self) -> der::Result<Length> {
        self.path_len_constraint.encoded_len()? + self.proxy_policy.encoded_len()?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.path_len_constraint.encode(writer)?;
        self.proxy_policy.encode(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;
    use hex_literal::hex;

    #[test]
    fn decode_rfc_order() {
        let pci = ProxyCertInfo {
            path_len_constraint: Some(2),
            proxy_policy: ProxyPolicy {
                policy_language: PPL_INHERIT_ALL,
                policy: None,
            },
        };
        let der = pci.to_der().unwrap();
        // SEQUENCE { INTEGER 2, SEQUENCE { OID inheritAll } }
        assert_eq!(&hex!("300f 020102 300a 0608 2b06010505071501")[..], der.as_slice());
        assert_eq!(pci, ProxyCertInfo::from_der(&der).unwrap());
    }

    #[test]
    fn decode_draft_order() {
        let policy = ProxyPolicy {
            policy_language: PPL_LIMITED,
            policy: Some(OctetString::new(b"policy".to_vec()).unwrap()),
        };
        let mut content = policy.to_der().unwrap();
        content.extend_from_slice(&5u32.to_der().unwrap());
        let mut enc = vec![0x30, content.len() as u8];
        enc.extend_from_slice(&content);

        let pci = ProxyCertInfo::from_der(&enc).unwrap();
        assert_eq!(Some(5), pci.path_len_constraint);
        assert_eq!(PPL_LIMITED, pci.proxy_policy.policy_language);
    }

    #[test]
    fn decode_rejects_missing_policy() {
        let enc = hex!("3003 020101");
        assert!(ProxyCertInfo::from_der(&enc).is_err());
    }

    #[test]
    fn decode_rejects_two_path_lengths() {
        let policy = ProxyPolicy {
            policy_language: PPL_INHERIT_ALL,
            policy: None,
        };
        let mut content = 1u32.to_der().unwrap();
        content.extend_from_slice(&policy.to_der().unwrap());
        content.extend_from_slice(&1u32.to_der().unwrap());
        let mut enc = vec![0x30, content.len() as u8];
        enc.extend_from_slice(&content);
        assert!(ProxyCertInfo::from_der(&enc).is_err());
    }
}
