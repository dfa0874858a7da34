//! Error types

use core::fmt;

use der::asn1::ObjectIdentifier;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Reasons a certificate chain is rejected by [`validate_chain`](../../validator/path_validator/fn.validate_chain.html).
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum PathValidationStatus {
    /// No errors were encountered while validating the certificate chain
    Valid,
    /// No trust anchor could be located for the chain, either because a self-issued certificate
    /// in the chain is not present in the trust store or because no trusted issuer could be found.
    UnknownAnchor,
    /// A certificate in the chain has a notAfter date before the time of interest.
    Expired,
    /// A certificate in the chain has a notBefore date after the time of interest.
    NotYetValid,
    /// The public key of an issuer does not verify the signature of the certificate it issued.
    BadSignature,
    /// A current CRL from the issuer lists the certificate.
    Revoked,
    /// A basicConstraints or proxy path length constraint was exceeded.
    PathTooLong,
    /// The issuing CA's signing policy does not permit the subject name, or a limited proxy was
    /// presented where limited proxies are not accepted.
    PolicyViolation,
    /// A certificate that is not a CA issued a certificate that is not a proxy.
    NonCAIssuedNonProxy,
    /// Legacy, draft and RFC 3820 proxies were mixed, or a non-proxy follows a proxy.
    MixedProxyTypes,
    /// A certificate carries a critical extension that is not processed.
    UnhandledCriticalExtension,
    /// The issuer name of a certificate does not match the subject name of its issuer.
    NameChainingFailure,
    /// The subject of an RFC 3820 or draft proxy is not its issuer's subject plus one CN.
    ProxySubjectMismatch,
    /// An extension of a certificate in the path could not be decoded.
    EncodingError,
}

/// Reasons an attribute certificate is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum AcValidationStatus {
    /// No errors were encountered while validating the attribute certificate
    Valid,
    /// Neither an LSC record nor an AA candidate certificate could be matched to the issuer.
    UnknownACIssuer,
    /// The issuer certificate chain was found but failed validation for the given reason.
    UntrustedACIssuer(PathValidationStatus),
    /// The attribute certificate signature does not verify under the resolved issuer key.
    BadSignature,
    /// The attribute certificate notAfterTime is before the time of interest.
    Expired,
    /// The attribute certificate notBeforeTime is after the time of interest.
    NotYetValid,
    /// The local host name is not listed in the targets extension.
    TargetMismatch,
    /// The attribute certificate carries a critical extension that is not processed.
    UnhandledCriticalExtension,
    /// The holder of the attribute certificate does not match the presented certificate.
    HolderMismatch,
}

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Certificate chain was rejected
    PathValidation(PathValidationStatus),
    /// Attribute certificate was rejected
    AttributeCertificate(AcValidationStatus),
    /// The extension identified by the OID could not be decoded or has the wrong structure
    MalformedExtension(ObjectIdentifier),
    /// A proxy-only operation was invoked for a certificate that is not a proxy
    NotAProxy,
    /// An operation that requires at least one certificate was given none
    EmptyChain,
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// Unrecognized occurs when an error conditions does not match anything else here.
    Unrecognized,
    /// An artifact could not be parsed
    ParseError,
    /// The CRL is not usable for determining status of a certificate, i.e., it is from another
    /// issuer, is not current, does not verify or carries an unrecognized critical extension
    CrlIncompatible,
    /// Asn1Error is used to propagate error information from the der crate.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    StdIoError(std::io::ErrorKind),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl From<PathValidationStatus> for Error {
    fn from(status: PathValidationStatus) -> Error {
        Error::PathValidation(status)
    }
}

impl From<AcValidationStatus> for Error {
    fn from(status: AcValidationStatus) -> Error {
        Error::AttributeCertificate(status)
    }
}

impl fmt::Display for PathValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationStatus::Valid => write!(f, "Valid"),
            PathValidationStatus::UnknownAnchor => write!(f, "UnknownAnchor"),
            PathValidationStatus::Expired => write!(f, "Expired"),
            PathValidationStatus::NotYetValid => write!(f, "NotYetValid"),
            PathValidationStatus::BadSignature => write!(f, "BadSignature"),
            PathValidationStatus::Revoked => write!(f, "Revoked"),
            PathValidationStatus::PathTooLong => write!(f, "PathTooLong"),
            PathValidationStatus::PolicyViolation => write!(f, "PolicyViolation"),
            PathValidationStatus::NonCAIssuedNonProxy => write!(f, "NonCAIssuedNonProxy"),
            PathValidationStatus::MixedProxyTypes => write!(f, "MixedProxyTypes"),
            PathValidationStatus::UnhandledCriticalExtension => {
                write!(f, "UnhandledCriticalExtension")
            }
            PathValidationStatus::NameChainingFailure => write!(f, "Name chaining failure"),
            PathValidationStatus::ProxySubjectMismatch => write!(f, "ProxySubjectMismatch"),
            PathValidationStatus::EncodingError => write!(f, "EncodingError"),
        }
    }
}

impl fmt::Display for AcValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcValidationStatus::Valid => write!(f, "Valid"),
            AcValidationStatus::UnknownACIssuer => write!(f, "UnknownACIssuer"),
            AcValidationStatus::UntrustedACIssuer(pvs) => write!(f, "UntrustedACIssuer: {}", pvs),
            AcValidationStatus::BadSignature => write!(f, "BadSignature"),
            AcValidationStatus::Expired => write!(f, "Expired"),
            AcValidationStatus::NotYetValid => write!(f, "NotYetValid"),
            AcValidationStatus::TargetMismatch => write!(f, "TargetMismatch"),
            AcValidationStatus::UnhandledCriticalExtension => {
                write!(f, "UnhandledCriticalExtension")
            }
            AcValidationStatus::HolderMismatch => write!(f, "HolderMismatch"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PathValidation(err) => write!(f, "PathValidationError: {}", err),
            Error::AttributeCertificate(err) => write!(f, "AttributeCertificateError: {}", err),
            Error::MalformedExtension(oid) => write!(f, "MalformedExtension: {}", oid),
            Error::NotAProxy => write!(f, "NotAProxy"),
            Error::EmptyChain => write!(f, "EmptyChain"),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::ParseError => write!(f, "ParseError"),
            Error::CrlIncompatible => write!(f, "CrlIncompatible"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::StdIoError(err) => write!(f, "StdError: {:?}", err),
        }
    }
}

impl std::error::Error for Error {}

#[test]
fn error_test() {
    use alloc::format;

    assert_eq!("Valid", format!("{}", PathValidationStatus::Valid));
    let _s = format!("{}", PathValidationStatus::UnknownAnchor);
    let _s = format!("{}", PathValidationStatus::Expired);
    let _s = format!("{}", PathValidationStatus::NotYetValid);
    let _s = format!("{}", PathValidationStatus::BadSignature);
    let _s = format!("{}", PathValidationStatus::Revoked);
    let _s = format!("{}", PathValidationStatus::PathTooLong);
    let _s = format!("{}", PathValidationStatus::PolicyViolation);
    let _s = format!("{}", PathValidationStatus::NonCAIssuedNonProxy);
    let _s = format!("{}", PathValidationStatus::MixedProxyTypes);
    let _s = format!("{}", PathValidationStatus::UnhandledCriticalExtension);
    let _s = format!("{}", PathValidationStatus::NameChainingFailure);
    let _s = format!("{}", PathValidationStatus::ProxySubjectMismatch);
    assert_eq!("EncodingError", format!("{}", PathValidationStatus::EncodingError));

    assert_eq!(
        "UntrustedACIssuer: Expired",
        format!(
            "{}",
            AcValidationStatus::UntrustedACIssuer(PathValidationStatus::Expired)
        )
    );
    let _s = format!("{}", AcValidationStatus::UnknownACIssuer);
    let _s = format!("{}", AcValidationStatus::TargetMismatch);
    let _s = format!("{}", AcValidationStatus::HolderMismatch);

    assert_eq!(
        "PathValidationError: PathTooLong",
        format!("{}", Error::from(PathValidationStatus::PathTooLong))
    );
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::NotAProxy);
    let _s = format!("{}", Error::EmptyChain);
    let _s = format!("{}", Error::Unrecognized);
    let _s = format!("{}", Error::ParseError);
    let _s = format!("{}", Error::CrlIncompatible);
    let _s = format!(
        "{}",
        Error::StdIoError(std::io::ErrorKind::NotFound)
    );
}
