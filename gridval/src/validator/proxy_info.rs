//! Classification of certificates as legacy, draft or RFC 3820 proxy certificates

use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use der::Decode;

use crate::asn1::proxy_cert_info::*;
use crate::util::error::*;
use crate::util::name_utilities::{common_name_of_rdn, get_leaf_rdn};
use crate::validator::grid_certificate::*;

/// The kind of proxy a certificate is, without the delegation details
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProxyKind {
    /// Not a proxy certificate
    None,
    /// Globus legacy proxy, identified by a trailing `CN=proxy` or `CN=limited proxy`
    Legacy,
    /// Proxy using the pre-standard Globus proxy certificate information extension
    DraftRfc,
    /// RFC 3820 proxy certificate
    Rfc3820,
}

/// Delegation details carried by draft and RFC 3820 proxies
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxyPolicyInfo {
    /// Maximum number of proxies that may follow. `None` means unlimited.
    pub path_len_limit: Option<u32>,
    /// Policy language OID
    pub policy_oid: ObjectIdentifier,
    /// Policy expressed in the policy language, if any
    pub policy_octets: Option<Vec<u8>>,
}

impl From<ProxyCertInfo> for ProxyPolicyInfo {
    fn from(pci: ProxyCertInfo) -> Self {
        ProxyPolicyInfo {
            path_len_limit: pci.path_len_constraint,
            policy_oid: pci.proxy_policy.policy_language,
            policy_octets: pci.proxy_policy.policy.map(|p| p.as_bytes().to_vec()),
        }
    }
}

/// Result of classifying a certificate. Legacy proxies never carry a policy OID.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProxyInfo {
    /// Not a proxy certificate
    None,
    /// Legacy proxy; `limited` is set when the trailing CN is `limited proxy`
    Legacy {
        /// True for `CN=limited proxy`
        limited: bool,
    },
    /// Draft proxy and its decoded policy
    DraftRfc(ProxyPolicyInfo),
    /// RFC 3820 proxy and its decoded policy
    Rfc3820(ProxyPolicyInfo),
}

impl ProxyInfo {
    /// Kind of the classified proxy
    pub fn kind(&self) -> ProxyKind {
        match self {
            ProxyInfo::None => ProxyKind::None,
            ProxyInfo::Legacy { .. } => ProxyKind::Legacy,
            ProxyInfo::DraftRfc(_) => ProxyKind::DraftRfc,
            ProxyInfo::Rfc3820(_) => ProxyKind::Rfc3820,
        }
    }

    /// Decoded policy for draft and RFC 3820 proxies
    pub fn policy(&self) -> Option<&ProxyPolicyInfo> {
        match self {
            ProxyInfo::DraftRfc(p) | ProxyInfo::Rfc3820(p) => Some(p),
            _ => None,
        }
    }

    /// `is_limited` returns true for limited proxies and `Error::NotAProxy` for non-proxies.
    pub fn is_limited(&self) -> Result<bool> {
        match self {
            ProxyInfo::None => Err(Error::NotAProxy),
            ProxyInfo::Legacy { limited } => Ok(*limited),
            ProxyInfo::DraftRfc(p) | ProxyInfo::Rfc3820(p) => Ok(p.policy_oid == PPL_LIMITED),
        }
    }
}

fn decode_policy(cert: &GridCertificate, oid: &ObjectIdentifier) -> Result<Option<ProxyPolicyInfo>> {
    match cert.extension_value(oid) {
        Some((_, v)) => match ProxyCertInfo::from_der(v) {
            Ok(pci) => Ok(Some(pci.into())),
            Err(_e) => Err(Error::MalformedExtension(*oid)),
        },
        None => Ok(None),
    }
}

/// `classify` determines the kind of proxy a certificate is. The RFC 3820 extension takes
/// precedence over the draft extension, which takes precedence over the legacy naming convention.
/// Legacy proxies are recognized by a final subject RDN of `CN=proxy` or `CN=limited proxy`,
/// compared without regard to case.
///
/// A proxy certificate information extension that cannot be decoded yields
/// `Error::MalformedExtension`.
pub fn classify(cert: &GridCertificate) -> Result<ProxyInfo> {
    if let Some(p) = decode_policy(cert, &PKIX_PE_PROXY_CERT_INFO)? {
        return Ok(ProxyInfo::Rfc3820(p));
    }
    if let Some(p) = decode_policy(cert, &GT_PROXY_CERT_INFO_DRAFT)? {
        return Ok(ProxyInfo::DraftRfc(p));
    }
    let leaf_cn = get_leaf_rdn(cert.subject()).and_then(common_name_of_rdn);
    if let Some(cn) = leaf_cn {
        let lower = cn.to_lowercase();
        if lower == "proxy" || lower == "limited proxy" {
            return Ok(ProxyInfo::Legacy {
                limited: cn == "limited proxy",
            });
        }
    }
    Ok(ProxyInfo::None)
}

/// `is_limited` returns true if the certificate is a limited proxy. Legacy proxies are limited
/// when the trailing CN is exactly `limited proxy`; draft and RFC 3820 proxies when the policy
/// language is the limited proxy OID. Non-proxies yield `Error::NotAProxy`.
pub fn is_limited(cert: &GridCertificate) -> Result<bool> {
    classify(cert)?.is_limited()
}
