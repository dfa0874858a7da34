//! ASN.1 encoders and decoders for Grid structures not included in a RustCrypto formats repo

pub mod attribute_certificate;
pub mod proxy_cert_info;
pub mod proxy_extensions;
pub mod voms;

pub use crate::asn1::attribute_certificate::*;
pub use crate::asn1::proxy_cert_info::*;
pub use crate::asn1::proxy_extensions::*;
pub use crate::asn1::voms::*;
