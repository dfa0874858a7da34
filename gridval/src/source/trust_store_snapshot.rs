//! In-memory trust store snapshots and the shared store that publishes them.
//!
//! A [`TrustStoreSnapshot`] is assembled once, from whatever source the caller loads trust material
//! from, and is immutable after it is published. [`SharedTrustStore`] holds the current snapshot in
//! an `ArcSwap`; `refresh` swaps in a new generation atomically while validations in progress keep
//! using the snapshot they started with.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use arc_swap::ArcSwap;
use log::debug;

use crate::environment::grid_environment_traits::TrustStore;
use crate::revocation::crl::GridCrl;
use crate::source::lsc_file::LscRecord;
use crate::util::error::*;
use crate::util::name_utilities::name_to_openssl;
use crate::validator::grid_certificate::GridCertificate;
use crate::validator::signing_policy::SigningPolicyRecord;

/// `TrustStoreSnapshot` indexes trust material by name hash.
#[derive(Clone, Debug, Default)]
pub struct TrustStoreSnapshot {
    /// CA certificates keyed by subject hash
    anchors: BTreeMap<String, Vec<GridCertificate>>,
    /// CRLs keyed by issuer hash
    crls: BTreeMap<String, Vec<GridCrl>>,
    /// Signing policy records keyed by CA subject hash
    signing_policies: BTreeMap<String, Vec<SigningPolicyRecord>>,
    /// VOMS server certificates keyed by (VO, subject hash)
    voms_servers: BTreeMap<(String, String), Vec<GridCertificate>>,
    /// LSC records keyed by (VO, host)
    lscs: BTreeMap<(String, String), LscRecord>,
}

impl TrustStoreSnapshot {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// `add_anchor` adds a CA certificate, indexed by its subject hash.
    pub fn add_anchor(&mut self, cert: GridCertificate) -> Result<()> {
        let hash = cert.subject_hash()?;
        debug!(
            "Adding CA certificate {} as {}",
            name_to_openssl(cert.subject()),
            hash
        );
        self.anchors.entry(hash).or_default().push(cert);
        Ok(())
    }

    /// `add_crl` adds a CRL, indexed by its issuer hash.
    pub fn add_crl(&mut self, crl: GridCrl) -> Result<()> {
        let hash = crl.issuer_hash()?;
        self.crls.entry(hash).or_default().push(crl);
        Ok(())
    }

    /// `add_signing_policy` sets the signing policy records for the CA with the given subject hash,
    /// replacing any previously set.
    pub fn add_signing_policy(&mut self, ca_hash: &str, records: Vec<SigningPolicyRecord>) {
        self.signing_policies.insert(ca_hash.to_string(), records);
    }

    /// `add_voms_server` adds a VOMS server certificate for the VO, indexed by its subject hash.
    pub fn add_voms_server(&mut self, vo: &str, cert: GridCertificate) -> Result<()> {
        let hash = cert.subject_hash()?;
        self.voms_servers
            .entry((vo.to_string(), hash))
            .or_default()
            .push(cert);
        Ok(())
    }

    /// `add_lsc` adds an LSC record, indexed by its VO and host, replacing any previously set.
    pub fn add_lsc(&mut self, lsc: LscRecord) {
        self.lscs.insert((lsc.vo.clone(), lsc.host.clone()), lsc);
    }

    /// Number of CA certificates in the snapshot
    pub fn num_anchors(&self) -> usize {
        self.anchors.values().map(|v| v.len()).sum()
    }
}

impl TrustStore for TrustStoreSnapshot {
    fn candidate_anchors_for(&self, subject_hash: &str) -> Vec<&GridCertificate> {
        match self.anchors.get(subject_hash) {
            Some(v) => v.iter().collect(),
            None => Vec::new(),
        }
    }

    fn candidate_crls_for(&self, issuer_hash: &str) -> Vec<&GridCrl> {
        match self.crls.get(issuer_hash) {
            Some(v) => v.iter().collect(),
            None => Vec::new(),
        }
    }

    fn signing_policy_for(&self, ca_hash: &str) -> Option<&[SigningPolicyRecord]> {
        self.signing_policies.get(ca_hash).map(|v| v.as_slice())
    }

    fn aa_candidates_for(&self, issuer_hash: &str, vo: &str) -> Vec<&GridCertificate> {
        match self
            .voms_servers
            .get(&(vo.to_string(), issuer_hash.to_string()))
        {
            Some(v) => v.iter().collect(),
            None => Vec::new(),
        }
    }

    fn lsc_for(&self, vo: &str, host: &str) -> Option<&LscRecord> {
        self.lscs.get(&(vo.to_string(), host.to_string()))
    }
}

/// `SharedTrustStore` publishes immutable [`TrustStoreSnapshot`] generations to concurrent readers.
pub struct SharedTrustStore {
    current: ArcSwap<TrustStoreSnapshot>,
}

impl Default for SharedTrustStore {
    fn default() -> Self {
        Self::new(TrustStoreSnapshot::new())
    }
}

impl SharedTrustStore {
    /// Creates a store publishing the given snapshot
    pub fn new(snapshot: TrustStoreSnapshot) -> Self {
        SharedTrustStore {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// `snapshot` returns the current generation. The returned snapshot is unaffected by later
    /// refreshes.
    pub fn snapshot(&self) -> Arc<TrustStoreSnapshot> {
        self.current.load_full()
    }

    /// `refresh` atomically replaces the current generation.
    pub fn refresh(&self, snapshot: TrustStoreSnapshot) {
        debug!(
            "Publishing trust store snapshot with {} CA certificates",
            snapshot.num_anchors()
        );
        self.current.store(Arc::new(snapshot));
    }
}
