//! Basic utility functionality supporting Grid chain and attribute certificate validation

#[cfg(feature = "rust_crypto")]
pub mod crypto;
pub mod error;
pub mod grid_alg_oids;
pub mod grid_utilities;
pub mod logging;
pub mod name_utilities;

#[cfg(feature = "rust_crypto")]
pub use crate::util::crypto::*;

pub use crate::{
    util::error::*, util::grid_alg_oids::*, util::grid_utilities::*, util::logging::*,
    util::name_utilities::*,
};
