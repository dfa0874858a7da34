//! ASN.1 definitions for the attributes and extensions found in VOMS attribute certificates and in
//! the proxy certificates that carry them.
//!
//! ```text
//! IetfAttrSyntax ::= SEQUENCE {
//!      policyAuthority  [0] GeneralNames OPTIONAL,
//!      values           SEQUENCE OF CHOICE {
//!                           octets    OCTET STRING,
//!                           oid       OBJECT IDENTIFIER,
//!                           string    UTF8String } }
//!
//! Targets ::= SEQUENCE OF Target
//!
//! Target ::= CHOICE {
//!      targetName   [0] GeneralName,
//!      targetGroup  [1] GeneralName,
//!      targetCert   [2] TargetCert }
//!
//! ACCerts ::= SEQUENCE { SEQUENCE OF Certificate }
//!
//! FullAttributes ::= SEQUENCE { SEQUENCE OF AttributeHolder }
//!
//! AttributeHolder ::= SEQUENCE {
//!      grantor      GeneralNames,
//!      attributes   SEQUENCE OF AttributeEntry }
//!
//! AttributeEntry ::= SEQUENCE {
//!      name         OCTET STRING,
//!      value        OCTET STRING,
//!      qualifier    OCTET STRING OPTIONAL }
//! ```
//!
//! IetfAttrSyntax and Targets are defined in [RFC 5755 Section 4.4] and [RFC 5755 Section 4.3.2].
//!
//! [RFC 5755 Section 4.4]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.4
//! [RFC 5755 Section 4.3.2]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.3.2

use alloc::vec::Vec;

use der::asn1::{ObjectIdentifier, OctetString};
use der::{Choice, Decode, Sequence};
use x509_cert::ext::pkix::name::{GeneralName, GeneralNames};
use x509_cert::Certificate;

use crate::asn1::attribute_certificate::{AttributeCertificate, IssuerSerial, ObjectDigestInfo};

/// VOMS attribute holding FQANs in IetfAttrSyntax form
pub const VOMS_ATTRIBUTE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.4");

/// Proxy certificate extension that carries VOMS attribute certificates
pub const VOMS_AC_SEQUENCE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.5");

/// Attribute certificate extension bundling the certificate chain of the VOMS server
pub const VOMS_AC_CERTS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.10");

/// Attribute certificate extension holding generic name/value attributes
pub const VOMS_FULL_ATTRIBUTES: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.11");

/// id-ce-targetInformation OBJECT IDENTIFIER ::= { id-ce 55 }
pub const ID_CE_TARGET_INFORMATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.55");

/// id-ce-noRevAvail OBJECT IDENTIFIER ::= { id-ce 56 }
pub const ID_CE_NO_REV_AVAIL: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.56");

/// Value of an IetfAttrSyntax attribute
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum IetfAttrSyntaxValue {
    Octets(OctetString),
    Oid(ObjectIdentifier),
    #[asn1(type = "UTF8String")]
    String(alloc::string::String),
}

/// IetfAttrSyntax as defined in [RFC 5755 Section 4.4].
///
/// VOMS places the VO name and server address in the policy authority as a URI of the form
/// `vo://host:port` and carries one FQAN per value.
///
/// [RFC 5755 Section 4.4]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.4
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct IetfAttrSyntax {
    #[asn1(
        context_specific = "0",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub policy_authority: Option<GeneralNames>,
    pub values: Vec<IetfAttrSyntaxValue>,
}

/// TargetCert as defined in [RFC 5755 Section 4.3.2].
///
/// [RFC 5755 Section 4.3.2]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.3.2
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct TargetCert {
    pub target_certificate: IssuerSerial,
    pub target_name: Option<GeneralName>,
    pub cert_digest_info: Option<ObjectDigestInfo>,
}

/// Target as defined in [RFC 5755 Section 4.3.2].
///
/// [RFC 5755 Section 4.3.2]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.3.2
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum Target {
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    TargetName(GeneralName),
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT")]
    TargetGroup(GeneralName),
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", constructed = "true")]
    TargetCert(TargetCert),
}

/// Targets as defined in [RFC 5755 Section 4.3.2]
///
/// [RFC 5755 Section 4.3.2]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.3.2
pub type Targets = Vec<Target>;

/// Value of the targetInformation extension: `SEQUENCE OF Targets`
pub type TargetInformation = Vec<Targets>;

/// Value of the VOMS ACCerts extension
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AcCertsSyntax {
    pub certificates: Vec<Certificate>,
}

/// A single generic attribute from a VOMS FullAttributes extension
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AttributeEntry {
    pub name: OctetString,
    pub value: OctetString,
    pub qualifier: Option<OctetString>,
}

/// Generic attributes asserted by one grantor
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AttributeHolder {
    pub grantor: GeneralNames,
    pub attributes: Vec<AttributeEntry>,
}

/// Value of the VOMS FullAttributes extension
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct FullAttributes {
    pub holders: Vec<AttributeHolder>,
}

/// `decode_ac_sequence` decodes the value of the [`VOMS_AC_SEQUENCE`] proxy extension. VOMS nests the
/// attribute certificates one level deep (`SEQUENCE OF SEQUENCE OF AttributeCertificate`); a flat
/// `SEQUENCE OF AttributeCertificate` is accepted too.
pub fn decode_ac_sequence(enc: &[u8]) -> der::Result<Vec<AttributeCertificate>> {
    match Vec::<Vec<AttributeCertificate>>::from_der(enc) {
        Ok(nested) => Ok(nested.into_iter().flatten().collect()),
        Err(e) => match Vec::<AttributeCertificate>::from_der(enc) {
            Ok(flat) => Ok(flat),
            Err(_) => Err(e),
        },
    }
}
