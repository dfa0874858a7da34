//! Sources of trust material: signing policy and LSC file parsers and the in-memory trust store
//! snapshot consulted during validation

pub mod lsc_file;
pub mod signing_policy_file;
pub mod trust_store_snapshot;

pub use crate::{
    source::lsc_file::*, source::signing_policy_file::*, source::trust_store_snapshot::*,
};
