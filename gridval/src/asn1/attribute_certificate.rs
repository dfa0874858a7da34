//! Attribute certificate structures from [RFC 5755 Section 4.1]. The module uses IMPLICIT tags.
//!
//! ```text
//! AttributeCertificate ::= SEQUENCE {
//!      acinfo               AttributeCertificateInfo,
//!      signatureAlgorithm   AlgorithmIdentifier,
//!      signatureValue       BIT STRING
//! }
//!
//! AttributeCertificateInfo ::= SEQUENCE {
//!      version              AttCertVersion, -- version is v2
//!      holder               Holder,
//!      issuer               AttCertIssuer,
//!      signature            AlgorithmIdentifier,
//!      serialNumber         CertificateSerialNumber,
//!      attrCertValidityPeriod   AttCertValidityPeriod,
//!      attributes           SEQUENCE OF Attribute,
//!      issuerUniqueID       UniqueIdentifier OPTIONAL,
//!      extensions           Extensions     OPTIONAL
//! }
//! ```
//!
//! [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1

use alloc::vec::Vec;

use der::asn1::{BitString, GeneralizedTime, ObjectIdentifier};
use der::{Enumerated, Sequence};
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::Attribute;
use x509_cert::certificate::Version;
use x509_cert::ext::pkix::name::GeneralNames;
use x509_cert::ext::Extensions;
use x509_cert::serial_number::SerialNumber;

/// AttributeCertificate as defined in [RFC 5755 Section 4.1].
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AttributeCertificate {
    pub acinfo: AttributeCertificateInfo,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature_value: BitString,
}

/// AttributeCertificateInfo as defined in [RFC 5755 Section 4.1].
///
/// The version field is always v2, which shares its encoding with the certificate v2 value.
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AttributeCertificateInfo {
    pub version: Version,
    pub holder: Holder,
    pub issuer: AttCertIssuer,
    pub signature: AlgorithmIdentifierOwned,
    pub serial_number: SerialNumber,
    pub attr_cert_validity_period: AttCertValidityPeriod,
    pub attributes: Vec<Attribute>,
    pub issuer_unique_id: Option<BitString>,
    pub extensions: Option<Extensions>,
}

/// Holder as defined in [RFC 5755 Section 4.1].
///
/// ```text
/// Holder ::= SEQUENCE {
///       baseCertificateID   [0] IssuerSerial OPTIONAL,
///       entityName          [1] GeneralNames OPTIONAL,
///       objectDigestInfo    [2] ObjectDigestInfo OPTIONAL
/// }
/// ```
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Default, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct Holder {
    #[asn1(
        context_specific = "0",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub base_certificate_id: Option<IssuerSerial>,
    #[asn1(
        context_specific = "1",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub entity_name: Option<GeneralNames>,
    #[asn1(
        context_specific = "2",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub object_digest_info: Option<ObjectDigestInfo>,
}

/// IssuerSerial as defined in [RFC 5755 Section 4.1].
///
/// ```text
/// IssuerSerial ::= SEQUENCE {
///       issuer         GeneralNames,
///       serial         CertificateSerialNumber,
///       issuerUID      UniqueIdentifier OPTIONAL
/// }
/// ```
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct IssuerSerial {
    pub issuer: GeneralNames,
    pub serial: SerialNumber,
    pub issuer_uid: Option<BitString>,
}

/// DigestedObjectType as defined in [RFC 5755 Section 4.1].
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enumerated)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum DigestedObjectType {
    PublicKey = 0,
    PublicKeyCert = 1,
    OtherObjectTypes = 2,
}

/// ObjectDigestInfo as defined in [RFC 5755 Section 4.1].
///
/// ```text
/// ObjectDigestInfo ::= SEQUENCE {
///       digestedObjectType  ENUMERATED {
///               publicKey            (0),
///               publicKeyCert        (1),
///               otherObjectTypes     (2) },
///       otherObjectTypeID   OBJECT IDENTIFIER  OPTIONAL,
///       digestAlgorithm     AlgorithmIdentifier,
///       objectDigest        BIT STRING
/// }
/// ```
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct ObjectDigestInfo {
    pub digested_object_type: DigestedObjectType,
    pub other_object_type_id: Option<ObjectIdentifier>,
    pub digest_algorithm: AlgorithmIdentifierOwned,
    pub object_digest: BitString,
}

/// AttCertIssuer as defined in [RFC 5755 Section 4.1].
///
/// ```text
/// AttCertIssuer ::= CHOICE {
///       v1Form   GeneralNames,  -- MUST NOT be used in this profile
///       v2Form   [0] V2Form     -- v2 only
/// }
/// ```
///
/// VOMS servers have issued both forms, so both are accepted.
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, der::Choice)]
#[allow(missing_docs)]
pub enum AttCertIssuer {
    V1Form(GeneralNames),
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true")]
    V2Form(V2Form),
}

/// V2Form as defined in [RFC 5755 Section 4.1].
///
/// ```text
/// V2Form ::= SEQUENCE {
///       issuerName            GeneralNames  OPTIONAL,
///       baseCertificateID     [0] IssuerSerial  OPTIONAL,
///       objectDigestInfo      [1] ObjectDigestInfo  OPTIONAL
/// }
/// ```
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Default, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct V2Form {
    pub issuer_name: Option<GeneralNames>,
    #[asn1(
        context_specific = "0",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub base_certificate_id: Option<IssuerSerial>,
    #[asn1(
        context_specific = "1",
        tag_mode = "IMPLICIT",
        optional = "true",
        constructed = "true"
    )]
    pub object_digest_info: Option<ObjectDigestInfo>,
}

/// AttCertValidityPeriod as defined in [RFC 5755 Section 4.1].
///
/// [RFC 5755 Section 4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct AttCertValidityPeriod {
    pub not_before_time: GeneralizedTime,
    pub not_after_time: GeneralizedTime,
}
