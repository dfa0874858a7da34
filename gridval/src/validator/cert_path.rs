//! Provides the structure that represents a Grid certification path, from trust anchor to target,
//! along with functions to build one from an unordered chain and a trust store.

use alloc::vec::Vec;

use crate::environment::grid_environment_traits::TrustStore;
use crate::util::error::*;
use crate::util::logging::*;
use crate::util::name_utilities::compare_names;
use crate::validator::grid_certificate::*;

/// Upper bound on the number of trust store certificates added above the presented chain
const MAX_STORE_DEPTH: usize = 32;

/// `GridCertificationPath` holds the certificates of a path ordered from the trust anchor at
/// index 0 to the target. The anchor is the trust store copy of a self-issued certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GridCertificationPath {
    /// Certificates from trust anchor to target
    pub certificates: Vec<GridCertificate>,
}

impl GridCertificationPath {
    /// Trust anchor of the path
    pub fn anchor(&self) -> Option<&GridCertificate> {
        self.certificates.first()
    }

    /// Target of the path, i.e., the last certificate
    pub fn target(&self) -> Option<&GridCertificate> {
        self.certificates.last()
    }
}

/// `build_path` orders the certificates reachable from `chain[0]` from leaf to root. Starting with
/// `chain[0]`, the remaining certificate that issued the top of the path is pushed until the top is
/// self-issued or no issuer remains, and the remaining certificate issued by the bottom of the path
/// is inserted until none remains. Certificates that cannot be linked are dropped.
///
/// Any ordering of the same linear chain therefore produces the same path.
pub fn build_path(chain: &[GridCertificate]) -> Result<Vec<&GridCertificate>> {
    let (first, rest) = match chain.split_first() {
        Some(s) => s,
        None => return Err(Error::EmptyChain),
    };

    let mut remaining: Vec<&GridCertificate> = rest.iter().collect();
    let mut path: Vec<&GridCertificate> = vec![first];

    // upward, toward the root
    loop {
        let top = path[path.len() - 1];
        if top.is_self_issued() {
            break;
        }
        match remaining.iter().position(|c| check_issued(c, top)) {
            Some(i) => {
                let issuer = remaining.remove(i);
                path.push(issuer);
            }
            None => break,
        }
    }

    // downward, toward the leaf
    loop {
        let bottom = path[0];
        match remaining
            .iter()
            .position(|c| !c.is_self_issued() && check_issued(bottom, c))
        {
            Some(i) => {
                let issued = remaining.remove(i);
                path.insert(0, issued);
            }
            None => break,
        }
    }

    for dropped in remaining {
        log_for_name(
            &PeLogLevels::PeDebug,
            dropped.subject(),
            "dropping certificate that does not link to the chain",
        );
    }
    Ok(path)
}

fn is_same_certificate(a: &GridCertificate, b: &GridCertificate) -> bool {
    a.encoded_cert == b.encoded_cert
        || (compare_names(a.subject(), b.subject())
            && a.public_key() == b.public_key())
}

/// `find_anchor` completes a leaf-first path with trust store certificates and returns it ordered
/// from trust anchor to target.
///
/// A self-issued top is replaced by the trust store copy with the same subject hash that matches
/// it. Otherwise trust store certificates that issued the top are added until a self-issued
/// certificate is reached. Either failure yields `UnknownAnchor`.
pub fn find_anchor(
    store: &dyn TrustStore,
    leaf_first: &[&GridCertificate],
) -> Result<GridCertificationPath> {
    let unknown = Error::PathValidation(PathValidationStatus::UnknownAnchor);
    let (top, below) = match leaf_first.split_last() {
        Some(s) => s,
        None => return Err(Error::EmptyChain),
    };

    let mut root_first: Vec<GridCertificate> = Vec::new();
    if top.is_self_issued() {
        let hash = top.subject_hash()?;
        match store
            .candidate_anchors_for(&hash)
            .into_iter()
            .find(|c| is_same_certificate(c, top))
        {
            Some(anchor) => root_first.push(anchor.clone()),
            None => {
                log_error_for_name(top.subject(), "self-issued certificate is not a trust anchor");
                return Err(unknown);
            }
        }
    } else {
        let mut above: Vec<GridCertificate> = Vec::new();
        let mut current: GridCertificate = (*top).clone();
        let mut found = false;
        for _ in 0..MAX_STORE_DEPTH {
            let hash = current.issuer_hash()?;
            let candidate = store
                .candidate_anchors_for(&hash)
                .into_iter()
                .find(|c| check_issued(c, &current) && !above.contains(c));
            match candidate {
                Some(c) => {
                    above.push(c.clone());
                    if c.is_self_issued() {
                        found = true;
                        break;
                    }
                    current = c.clone();
                }
                None => break,
            }
        }
        if !found {
            log_error_for_name(top.subject(), "no trust anchor found for issuer");
            return Err(unknown);
        }
        above.reverse();
        root_first.extend(above);
        root_first.push((*top).clone());
    }

    for c in below.iter().rev() {
        root_first.push((*c).clone());
    }
    Ok(GridCertificationPath {
        certificates: root_first,
    })
}
