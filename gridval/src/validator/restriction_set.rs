//! Structures and functions related to processing the source and target network restrictions
//! carried by proxy certificates.
//!
//! Restrictions are expressed with the NameConstraints syntax. Only iPAddress subtrees are
//! meaningful; other name forms are ignored.

use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use x509_cert::ext::pkix::constraints::name::{GeneralSubtrees, NameConstraints};
use x509_cert::ext::pkix::name::GeneralName;

use crate::asn1::proxy_extensions::{PROXY_SOURCE_RESTRICTION, PROXY_TARGET_RESTRICTION};
use crate::util::error::*;

/// Direction of a network restriction
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RestrictionDirection {
    /// Addresses the proxy may be used from
    Source,
    /// Addresses the proxy may be used to contact
    Target,
}

impl RestrictionDirection {
    /// OID of the extension carrying restrictions for this direction
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            RestrictionDirection::Source => PROXY_SOURCE_RESTRICTION,
            RestrictionDirection::Target => PROXY_TARGET_RESTRICTION,
        }
    }
}

/// An IPv4 or IPv6 network: address and netmask of equal length, with the address masked.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IpSubnet {
    /// Network address with host bits cleared
    pub address: Vec<u8>,
    /// Network mask
    pub netmask: Vec<u8>,
}

impl IpSubnet {
    /// `new` creates a subnet from a 4 or 16 byte address and a mask of the same length. Host bits
    /// in the address are cleared.
    pub fn new(address: &[u8], netmask: &[u8]) -> Result<Self> {
        if address.len() != netmask.len() || !(address.len() == 4 || address.len() == 16) {
            return Err(Error::ParseError);
        }
        Ok(IpSubnet {
            address: address
                .iter()
                .zip(netmask.iter())
                .map(|(a, m)| a & m)
                .collect(),
            netmask: netmask.to_vec(),
        })
    }

    /// `from_octets` parses the 8 or 32 byte iPAddress form used in name constraints, i.e., an
    /// address followed by a mask.
    pub fn from_octets(octets: &[u8]) -> Result<Self> {
        if !(octets.len() == 8 || octets.len() == 32) {
            return Err(Error::ParseError);
        }
        let (address, netmask) = octets.split_at(octets.len() / 2);
        IpSubnet::new(address, netmask)
    }

    /// `contains` returns true if every address in `other` is also in `self`.
    pub fn contains(&self, other: &IpSubnet) -> bool {
        if self.address.len() != other.address.len() {
            return false;
        }
        for i in 0..self.address.len() {
            // other must be at least as specific and agree on the bits self fixes
            if other.netmask[i] & self.netmask[i] != self.netmask[i] {
                return false;
            }
            if other.address[i] & self.netmask[i] != self.address[i] {
                return false;
            }
        }
        true
    }

    /// `intersect` returns the more specific of two overlapping subnets, or None when the subnets
    /// do not overlap.
    pub fn intersect(&self, other: &IpSubnet) -> Option<IpSubnet> {
        if self.contains(other) {
            Some(other.clone())
        } else if other.contains(self) {
            Some(self.clone())
        } else {
            None
        }
    }

    /// `contains_address` returns true if the 4 or 16 byte address falls within the subnet.
    pub fn contains_address(&self, address: &[u8]) -> bool {
        address.len() == self.address.len()
            && address
                .iter()
                .zip(self.netmask.iter())
                .zip(self.address.iter())
                .all(|((a, m), n)| a & m == *n)
    }
}

fn ip_subnets(subtrees: &GeneralSubtrees) -> Vec<IpSubnet> {
    let mut retval = Vec::new();
    for subtree in subtrees {
        if let GeneralName::IpAddress(os) = &subtree.base {
            if let Ok(subnet) = IpSubnet::from_octets(os.as_bytes()) {
                retval.push(subnet);
            }
        }
    }
    retval.sort();
    retval.dedup();
    retval
}

/// The `RestrictionSet` structure accumulates the network restrictions asserted along a proxy
/// chain for one direction.
///
/// An empty permitted vector with `permitted_null` clear means no permitted networks have been
/// asserted, i.e., any address is permitted. `permitted_null` is set when an intersection left no
/// permitted network, i.e., the chain is usable nowhere.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct RestrictionSet {
    /// Permitted networks, sorted
    pub permitted: Vec<IpSubnet>,
    /// Set when intersecting permitted networks yielded the empty set
    pub permitted_null: bool,
    /// Excluded networks, sorted
    pub excluded: Vec<IpSubnet>,
}

impl RestrictionSet {
    /// `from_name_constraints` reads the iPAddress subtrees from a restriction extension.
    pub fn from_name_constraints(nc: &NameConstraints) -> Self {
        let permitted = match &nc.permitted_subtrees {
            Some(p) => ip_subnets(p),
            None => Vec::new(),
        };
        let excluded = match &nc.excluded_subtrees {
            Some(e) => ip_subnets(e),
            None => Vec::new(),
        };
        RestrictionSet {
            permitted,
            permitted_null: false,
            excluded,
        }
    }

    /// `combine` folds another set into this one: excluded networks by union and permitted
    /// networks by intersection, where two overlapping networks yield the more specific one and
    /// non-overlapping pairs are dropped.
    pub fn combine(&mut self, other: &RestrictionSet) {
        self.calculate_union(&other.excluded);

        if self.permitted_null {
            return;
        }
        if other.permitted_null {
            self.permitted.clear();
            self.permitted_null = true;
            return;
        }
        self.calculate_intersection(&other.permitted);
    }

    fn calculate_union(&mut self, excluded: &[IpSubnet]) {
        self.excluded.extend_from_slice(excluded);
        self.excluded.sort();
        self.excluded.dedup();
    }

    fn calculate_intersection(&mut self, permitted: &[IpSubnet]) {
        if permitted.is_empty() {
            return;
        }
        if self.permitted.is_empty() {
            self.permitted = permitted.to_vec();
            return;
        }

        let mut new_permitted = Vec::new();
        for a in &self.permitted {
            for b in permitted {
                if let Some(i) = a.intersect(b) {
                    new_permitted.push(i);
                }
            }
        }
        new_permitted.sort();
        new_permitted.dedup();
        if new_permitted.is_empty() {
            self.permitted_null = true;
        }
        self.permitted = new_permitted;
    }

    /// `usable_nowhere` returns true when the permitted networks intersected to nothing.
    pub fn usable_nowhere(&self) -> bool {
        self.permitted_null
    }

    /// `permits` returns true if the address is outside every excluded network and inside a
    /// permitted network, or no permitted networks were asserted.
    pub fn permits(&self, address: &[u8]) -> bool {
        if self.permitted_null {
            return false;
        }
        if self.excluded.iter().any(|e| e.contains_address(address)) {
            return false;
        }
        self.permitted.is_empty() || self.permitted.iter().any(|p| p.contains_address(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(a: [u8; 4], m: [u8; 4]) -> IpSubnet {
        IpSubnet::new(&a, &m).unwrap()
    }

    fn set(permitted: Vec<IpSubnet>, excluded: Vec<IpSubnet>) -> RestrictionSet {
        let mut p = permitted;
        p.sort();
        let mut e = excluded;
        e.sort();
        RestrictionSet {
            permitted: p,
            permitted_null: false,
            excluded: e,
        }
    }

    fn combined(a: &RestrictionSet, b: &RestrictionSet) -> RestrictionSet {
        let mut r = a.clone();
        r.combine(b);
        r
    }

    #[test]
    fn subnet_basics() {
        let slash8 = net([10, 1, 2, 3], [255, 0, 0, 0]);
        assert_eq!(vec![10, 0, 0, 0], slash8.address);
        let slash16 = net([10, 1, 0, 0], [255, 255, 0, 0]);
        assert!(slash8.contains(&slash16));
        assert!(!slash16.contains(&slash8));
        assert_eq!(Some(slash16.clone()), slash8.intersect(&slash16));
        assert_eq!(Some(slash16.clone()), slash16.intersect(&slash8));
        assert_eq!(None, slash16.intersect(&net([192, 168, 0, 0], [255, 255, 0, 0])));
        assert!(slash16.contains_address(&[10, 1, 200, 7]));
        assert!(!slash16.contains_address(&[10, 2, 0, 1]));
        assert!(IpSubnet::from_octets(&[1, 2, 3]).is_err());
        let v6 = IpSubnet::from_octets(&[0u8; 32]).unwrap();
        assert!(!v6.contains(&slash8));
    }

    #[test]
    fn disjoint_permitted_is_usable_nowhere() {
        let a = set(vec![net([10, 0, 0, 0], [255, 0, 0, 0])], vec![]);
        let b = set(vec![net([192, 168, 0, 0], [255, 255, 0, 0])], vec![]);
        let r = combined(&a, &b);
        assert!(r.usable_nowhere());
        assert!(r.permitted.is_empty());
        assert!(!r.permits(&[10, 0, 0, 1]));

        // nowhere stays nowhere
        let r2 = combined(&r, &a);
        assert!(r2.usable_nowhere());
    }

    #[test]
    fn algebra_laws() {
        let a = set(
            vec![
                net([10, 0, 0, 0], [255, 0, 0, 0]),
                net([172, 16, 0, 0], [255, 240, 0, 0]),
            ],
            vec![net([10, 9, 0, 0], [255, 255, 0, 0])],
        );
        let b = set(
            vec![net([10, 1, 0, 0], [255, 255, 0, 0])],
            vec![net([172, 16, 1, 0], [255, 255, 255, 0])],
        );
        let c = set(
            vec![
                net([10, 1, 2, 0], [255, 255, 255, 0]),
                net([172, 16, 5, 0], [255, 255, 255, 0]),
            ],
            vec![],
        );
        let identity = RestrictionSet::default();

        // commutative
        assert_eq!(combined(&a, &b), combined(&b, &a));
        assert_eq!(combined(&a, &c), combined(&c, &a));
        // associative
        assert_eq!(
            combined(&combined(&a, &b), &c),
            combined(&a, &combined(&b, &c))
        );
        // absent restriction is the identity
        assert_eq!(a, combined(&a, &identity));
        assert_eq!(a, combined(&identity, &a));

        let ab = combined(&a, &b);
        assert_eq!(vec![net([10, 1, 0, 0], [255, 255, 0, 0])], ab.permitted);
        assert_eq!(2, ab.excluded.len());
        assert!(ab.permits(&[10, 1, 3, 4]));
        assert!(!ab.permits(&[10, 2, 3, 4]));
    }
}
