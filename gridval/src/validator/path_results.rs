//! Structures related to results from chain validation operations

use alloc::vec::Vec;

use crate::util::error::PathValidationStatus;
use crate::validator::grid_certificate::*;
use crate::validator::proxy_chain::*;
use crate::validator::proxy_info::ProxyKind;
use crate::validator::restriction_set::*;

/// `ChainValidationResults` records the outcome of validating a chain along with the proxy
/// properties aggregated over the validated path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainValidationResults {
    /// Validation status. Anything other than `Valid` is the first rejection encountered.
    pub status: PathValidationStatus,
    /// Position in `validated_path` of the certificate that caused rejection, if any
    pub failed_index: Option<usize>,
    /// Path ordered from trust anchor (index 0) to target. Empty when no anchor was found.
    pub validated_path: Vec<GridCertificate>,
    /// Proxy type of the path
    pub proxy_kind: ProxyKind,
    /// Number of further proxies that may be issued, `None` for unlimited
    pub remaining_proxy_path_length: Option<u32>,
    /// True if the path contains a limited proxy
    pub limited: bool,
    /// Aggregated source restrictions, `None` when none were asserted
    pub source_restrictions: Option<RestrictionSet>,
    /// Aggregated target restrictions, `None` when none were asserted
    pub target_restrictions: Option<RestrictionSet>,
    /// Proxy tracing extensions along the path, root first
    pub tracing: Vec<ProxyTracingInfo>,
    /// Raw SAML assertion extensions along the path, root first
    pub saml_assertions: Vec<Vec<u8>>,
}

impl Default for ChainValidationResults {
    fn default() -> Self {
        ChainValidationResults {
            status: PathValidationStatus::Valid,
            failed_index: None,
            validated_path: Vec::new(),
            proxy_kind: ProxyKind::None,
            remaining_proxy_path_length: None,
            limited: false,
            source_restrictions: None,
            target_restrictions: None,
            tracing: Vec::new(),
            saml_assertions: Vec::new(),
        }
    }
}

impl ChainValidationResults {
    /// Creates a new [`ChainValidationResults`]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the chain was accepted
    pub fn is_valid(&self) -> bool {
        PathValidationStatus::Valid == self.status && !self.validated_path.is_empty()
    }

    /// `set_failure` records the rejection reason and the position of the failing certificate.
    pub fn set_failure(&mut self, status: PathValidationStatus, index: Option<usize>) {
        self.status = status;
        self.failed_index = index;
    }

    /// `record_proxy_state` copies aggregated proxy properties into the results.
    pub fn record_proxy_state(&mut self, state: &ProxyChainState) {
        self.proxy_kind = state.proxy_kind.unwrap_or(ProxyKind::None);
        self.remaining_proxy_path_length = state.remaining_path_length();
        self.limited = state.limited;
        self.source_restrictions = state.source_restrictions.clone();
        self.target_restrictions = state.target_restrictions.clone();
        self.tracing = state.tracing.clone();
        self.saml_assertions = state.saml_assertions.clone();
    }

    /// The last certificate of the validated path that is not a proxy, i.e., the end entity
    /// certificate whose identity the proxies carry.
    pub fn end_entity(&self) -> Option<&GridCertificate> {
        self.validated_path.iter().rev().find(|c| !is_proxy(c))
    }

    /// Target of the validated path
    pub fn target(&self) -> Option<&GridCertificate> {
        self.validated_path.last()
    }
}
