//! Revocation status determination using CRLs supplied by the trust store
//!
//! Only complete CRLs issued directly by the certificate issuer are used. Delta CRLs, indirect
//! CRLs and OCSP are not supported.

pub mod crl;

pub use crate::revocation::crl::*;
