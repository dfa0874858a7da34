//! Aggregation of proxy certificate properties across a chain: proxy type consistency, the
//! remaining proxy path length, network restrictions, the limited proxy flag and passthrough of
//! tracing and SAML data.
//!
//! Chains may be presented root-first or leaf-first. Analysis always runs from the root toward
//! the leaf.

use alloc::vec::Vec;

use der::Decode;
use x509_cert::ext::pkix::constraints::name::NameConstraints;
use x509_cert::ext::pkix::name::GeneralNames;

use crate::asn1::proxy_extensions::*;
use crate::util::error::*;
use crate::util::name_utilities::compare_names;
use crate::validator::grid_certificate::GridCertificate;
use crate::validator::proxy_info::*;
use crate::validator::restriction_set::*;

/// Proxy tracing URLs asserted by one certificate
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ProxyTracingInfo {
    /// Value of the proxy tracing issuer extension
    pub issuer: Option<GeneralNames>,
    /// Value of the proxy tracing subject extension
    pub subject: Option<GeneralNames>,
}

/// `ProxyChainState` accumulates proxy properties one certificate at a time, root first.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ProxyChainState {
    /// Type set by the first proxy in the chain
    pub proxy_kind: Option<ProxyKind>,
    /// Remaining proxy path length. `None` means unlimited.
    pub path_limit: Option<i64>,
    /// True once any limited proxy has been seen
    pub limited: bool,
    /// Source restrictions, if any certificate asserted one
    pub source_restrictions: Option<RestrictionSet>,
    /// Target restrictions, if any certificate asserted one
    pub target_restrictions: Option<RestrictionSet>,
    /// Tracing information, in chain order, for certificates that carry it
    pub tracing: Vec<ProxyTracingInfo>,
    /// Raw SAML assertion extension values, in chain order
    pub saml_assertions: Vec<Vec<u8>>,
}

fn fold_type(running: &mut Option<ProxyKind>, kind: ProxyKind) -> Result<()> {
    match (*running, kind) {
        (None, ProxyKind::None) => Ok(()),
        (None, k) => {
            *running = Some(k);
            Ok(())
        }
        (Some(r), k) if r == k => Ok(()),
        _ => Err(Error::PathValidation(PathValidationStatus::MixedProxyTypes)),
    }
}

fn fold_path_limit(running: &mut Option<i64>, info: &ProxyInfo) -> Result<()> {
    if let ProxyInfo::None = info {
        return Ok(());
    }
    let decremented = running.map(|r| r - 1);
    let own = info.policy().and_then(|p| p.path_len_limit).map(i64::from);
    *running = match (decremented, own) {
        (Some(r), Some(o)) => Some(r.min(o)),
        (Some(r), None) => Some(r),
        (None, o) => o,
    };
    match running {
        Some(r) if *r < 0 => Err(Error::PathValidation(PathValidationStatus::PathTooLong)),
        _ => Ok(()),
    }
}

fn fold_restriction(
    running: &mut Option<RestrictionSet>,
    cert: &GridCertificate,
    direction: RestrictionDirection,
) -> Result<()> {
    let oid = direction.oid();
    if let Some((_, v)) = cert.extension_value(&oid) {
        let nc = NameConstraints::from_der(v).map_err(|_| Error::MalformedExtension(oid))?;
        let rs = RestrictionSet::from_name_constraints(&nc);
        match running {
            Some(r) => r.combine(&rs),
            None => *running = Some(rs),
        }
    }
    Ok(())
}

fn tracing_for(cert: &GridCertificate) -> Result<Option<ProxyTracingInfo>> {
    let mut info = ProxyTracingInfo::default();
    if let Some((_, v)) = cert.extension_value(&PROXY_TRACING_ISSUER) {
        info.issuer = Some(
            GeneralNames::from_der(v)
                .map_err(|_| Error::MalformedExtension(PROXY_TRACING_ISSUER))?,
        );
    }
    if let Some((_, v)) = cert.extension_value(&PROXY_TRACING_SUBJECT) {
        info.subject = Some(
            GeneralNames::from_der(v)
                .map_err(|_| Error::MalformedExtension(PROXY_TRACING_SUBJECT))?,
        );
    }
    if info.issuer.is_none() && info.subject.is_none() {
        Ok(None)
    } else {
        Ok(Some(info))
    }
}

impl ProxyChainState {
    /// Creates an empty state: no proxy type, unlimited path length and no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    /// `push` folds the next certificate (moving toward the leaf) into the state.
    pub fn push(&mut self, cert: &GridCertificate) -> Result<()> {
        let info = classify(cert)?;
        fold_type(&mut self.proxy_kind, info.kind())?;
        fold_path_limit(&mut self.path_limit, &info)?;
        if ProxyInfo::None != info && info.is_limited()? {
            self.limited = true;
        }
        fold_restriction(
            &mut self.source_restrictions,
            cert,
            RestrictionDirection::Source,
        )?;
        fold_restriction(
            &mut self.target_restrictions,
            cert,
            RestrictionDirection::Target,
        )?;
        if let Some(t) = tracing_for(cert)? {
            self.tracing.push(t);
        }
        if let Some((_, v)) = cert.extension_value(&PROXY_SAML_ASSERTION) {
            self.saml_assertions.push(v.to_vec());
        }
        Ok(())
    }

    /// Remaining proxy path length; `None` means unlimited
    pub fn remaining_path_length(&self) -> Option<u32> {
        self.path_limit.map(|p| p.max(0) as u32)
    }

    /// Restrictions accumulated for the given direction
    pub fn restrictions(&self, direction: RestrictionDirection) -> Option<&RestrictionSet> {
        match direction {
            RestrictionDirection::Source => self.source_restrictions.as_ref(),
            RestrictionDirection::Target => self.target_restrictions.as_ref(),
        }
    }
}

/// `root_first` returns references to the chain's certificates ordered from the root toward the
/// leaf. A chain whose first certificate was issued by its second is taken to be leaf-first.
pub fn root_first(chain: &[GridCertificate]) -> Vec<&GridCertificate> {
    let mut ordered: Vec<&GridCertificate> = chain.iter().collect();
    if chain.len() >= 2
        && compare_names(chain[0].issuer(), chain[1].subject())
        && !compare_names(chain[1].issuer(), chain[0].subject())
    {
        ordered.reverse();
    }
    ordered
}

/// `analyze_chain` folds every certificate of the chain into a [`ProxyChainState`].
pub fn analyze_chain(chain: &[GridCertificate]) -> Result<ProxyChainState> {
    let mut state = ProxyChainState::new();
    for cert in root_first(chain) {
        state.push(cert)?;
    }
    Ok(state)
}

/// `aggregate_type` returns the proxy type of the chain, [`ProxyKind::None`] when it contains no
/// proxy, or `MixedProxyTypes` when types differ or a non-proxy follows a proxy.
pub fn aggregate_type(chain: &[GridCertificate]) -> Result<ProxyKind> {
    let mut running = None;
    for cert in root_first(chain) {
        fold_type(&mut running, classify(cert)?.kind())?;
    }
    Ok(running.unwrap_or(ProxyKind::None))
}

/// `aggregate_path_limit` returns the number of further proxies the chain permits, `None` for
/// unlimited, or `PathTooLong` when a proxy path length constraint is exceeded.
pub fn aggregate_path_limit(chain: &[GridCertificate]) -> Result<Option<u32>> {
    let mut running = None;
    for cert in root_first(chain) {
        fold_path_limit(&mut running, &classify(cert)?)?;
    }
    Ok(running.map(|r| r as u32))
}

/// `aggregate_restrictions` combines the restriction extensions for the given direction across
/// the chain. `None` means no certificate asserted a restriction.
pub fn aggregate_restrictions(
    chain: &[GridCertificate],
    direction: RestrictionDirection,
) -> Result<Option<RestrictionSet>> {
    let mut running = None;
    for cert in root_first(chain) {
        fold_restriction(&mut running, cert, direction)?;
    }
    Ok(running)
}

/// `is_limited_chain` returns true if any proxy in the chain is limited.
pub fn is_limited_chain(chain: &[GridCertificate]) -> Result<bool> {
    for cert in chain {
        match classify(cert)? {
            ProxyInfo::None => {}
            info => {
                if info.is_limited()? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// `tracing_info` returns the proxy tracing extensions of the chain, root first.
pub fn tracing_info(chain: &[GridCertificate]) -> Result<Vec<ProxyTracingInfo>> {
    let mut retval = Vec::new();
    for cert in root_first(chain) {
        if let Some(t) = tracing_for(cert)? {
            retval.push(t);
        }
    }
    Ok(retval)
}

/// `saml_assertions` returns the raw SAML assertion extension values of the chain, root first.
pub fn saml_assertions(chain: &[GridCertificate]) -> Vec<Vec<u8>> {
    root_first(chain)
        .into_iter()
        .filter_map(|c| c.extension_value(&PROXY_SAML_ASSERTION))
        .map(|(_, v)| v.to_vec())
        .collect()
}
