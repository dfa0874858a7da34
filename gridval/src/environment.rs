//! Traits consumed by validation operations and the [`GridEnvironment`](environment::grid_environment::GridEnvironment)
//! that ties a trust store and a signature engine together

pub mod grid_environment;
pub mod grid_environment_traits;

pub use crate::{environment::grid_environment::*, environment::grid_environment_traits::*};
