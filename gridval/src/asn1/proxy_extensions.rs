//! OIDs and structures for the Grid proxy certificate extensions that are carried through a proxy
//! chain: network restrictions, proxy tracing and SAML assertions.
//!
//! The source and target restriction extensions reuse the NameConstraints syntax from
//! [RFC 5280 Section 4.2.1.10] with iPAddress subtrees expressing the permitted and excluded
//! networks. Proxy tracing extensions carry a GeneralNames value holding URLs.
//!
//! [RFC 5280 Section 4.2.1.10]: https://datatracker.ietf.org/doc/html/rfc5280#section-4.2.1.10

use der::asn1::ObjectIdentifier;
use x509_cert::ext::pkix::constraints::name::NameConstraints;
use x509_cert::ext::pkix::name::GeneralNames;

/// Network restriction on the addresses a proxy may be used from
pub const PROXY_SOURCE_RESTRICTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113612.5.5.1.1.2.1");

/// Network restriction on the addresses a proxy may be used to contact
pub const PROXY_TARGET_RESTRICTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113612.5.5.1.1.2.2");

/// URL of the issuer of a proxy, for tracing delegation
pub const PROXY_TRACING_ISSUER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113612.5.5.1.1.1.1");

/// URL of the subject of a proxy, for tracing delegation
pub const PROXY_TRACING_SUBJECT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113612.5.5.1.1.1.2");

/// SAML assertion embedded in a proxy certificate
pub const PROXY_SAML_ASSERTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.1.1.12");

/// Syntax of the source and target restriction extensions
pub type ProxyRestriction = NameConstraints;

/// Syntax of the proxy tracing extensions
pub type ProxyTracing = GeneralNames;
