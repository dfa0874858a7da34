//! Grid certificate chain and VOMS attribute certificate validation

pub mod ac_validator;
pub mod attribute_certificate;
pub mod cert_path;
pub mod grid_certificate;
pub mod path_results;
pub mod path_settings;
pub mod path_validator;
pub mod proxy_chain;
pub mod proxy_info;
pub mod restriction_set;
pub mod signing_policy;

pub use crate::{
    validator::ac_validator::*, validator::attribute_certificate::*, validator::cert_path::*,
    validator::grid_certificate::*, validator::path_results::*, validator::path_settings::*,
    validator::path_validator::*, validator::proxy_chain::*, validator::proxy_info::*,
    validator::restriction_set::*, validator::signing_policy::*,
};
