//! Wrappers around asn.1 encoder/decoder structures to support Grid chain processing

use alloc::collections::BTreeMap;
use alloc::{string::String, vec::Vec};

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::{BitString, ObjectIdentifier};
use der::{Decode, Encode};
use log::error;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::Version;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, KeyUsages, SubjectAltName,
    SubjectKeyIdentifier,
};
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::asn1::proxy_cert_info::*;
use crate::environment::grid_environment_traits::SignatureEngine;
use crate::util::error::*;
use crate::util::name_utilities::*;

/// Extensions that are decoded when a [`GridCertificate`] is created
pub const EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_SUBJECT_ALT_NAME,
];

/// Extensions a certificate may mark critical without causing the chain to be rejected
pub const PROCESSED_CRITICAL_EXTENSIONS: &[ObjectIdentifier] = &[
    ID_CE_KEY_USAGE,
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    PKIX_PE_PROXY_CERT_INFO,
    GT_PROXY_CERT_INFO_DRAFT,
];

/// [`GridExtension`] provides a wrapper for the extension types decoded during Grid chain
/// processing.
#[derive(PartialEq, Clone, Eq, Debug)]
pub enum GridExtension {
    /// Parsed BasicConstraints extension
    BasicConstraints(BasicConstraints),
    /// Parsed KeyUsage extension
    KeyUsage(KeyUsage),
    /// Parsed SubjectKeyIdentifier extension
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    /// Parsed AuthorityKeyIdentifier extension
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    /// Parsed SubjectAltName extension
    SubjectAltName(SubjectAltName),
}

/// [`ParsedExtensions`] is a typedef of a BTreeMap map that associates [`GridExtension`] objects
/// with object identifier values so extensions are not parsed repeatedly.
pub type ParsedExtensions = BTreeMap<ObjectIdentifier, GridExtension>;

/// The [`ExtensionProcessing`] trait provides a common means of extracting extensions from objects
/// that retain copies of decoded extension structures.
pub trait ExtensionProcessing {
    /// `get_extension` returns a previously parsed [`GridExtension`] if the extension was present
    /// and could be decoded.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ GridExtension>>;

    /// `parse_extension` decodes and caches the extension identified by the OID, if present.
    /// Decoding failures are reported as `MalformedExtension`.
    fn parse_extension(&'_ mut self, oid: &ObjectIdentifier) -> Result<Option<&'_ GridExtension>>;

    /// `parse_extensions` decodes each of the listed extensions, skipping those that fail to decode.
    fn parse_extensions(&'_ mut self, oids: &[ObjectIdentifier]);
}

/// [`GridCertificate`] aggregates a binary, DER-encoded Certificate, the parsed Certificate and
/// the parsed extensions of interest. It is immutable once created.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct GridCertificate {
    /// Binary, encoded Certificate object
    pub encoded_cert: Vec<u8>,
    /// Decoded Certificate object
    pub decoded_cert: Certificate,
    /// Parsed extensions from the Certificate
    pub parsed_extensions: ParsedExtensions,
}

impl TryFrom<&[u8]> for GridCertificate {
    type Error = der::Error;

    fn try_from(enc_cert: &[u8]) -> der::Result<Self> {
        let cert = Certificate::from_der(enc_cert)?;
        let mut grid_cert = GridCertificate {
            encoded_cert: enc_cert.to_vec(),
            decoded_cert: cert,
            parsed_extensions: ParsedExtensions::new(),
        };
        grid_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(grid_cert)
    }
}

impl TryFrom<Certificate> for GridCertificate {
    type Error = der::Error;

    fn try_from(cert: Certificate) -> der::Result<Self> {
        let enc_cert = cert.to_der()?;
        let mut grid_cert = GridCertificate {
            encoded_cert: enc_cert,
            decoded_cert: cert,
            parsed_extensions: ParsedExtensions::new(),
        };
        grid_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(grid_cert)
    }
}

impl ExtensionProcessing for GridCertificate {
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ GridExtension>> {
        Ok(self.parsed_extensions.get(oid))
    }

    fn parse_extension(&mut self, oid: &ObjectIdentifier) -> Result<Option<&GridExtension>> {
        macro_rules! add_and_return {
            ($pe:ident, $v:ident, $t:ident, $variant:ident) => {
                match $t::from_der($v) {
                    Ok(r) => {
                        $pe.insert(*oid, GridExtension::$variant(r));
                        return Ok($pe.get(oid));
                    }
                    Err(_e) => {
                        return Err(Error::MalformedExtension(*oid));
                    }
                }
            };
        }

        let pe = &mut self.parsed_extensions;
        if pe.contains_key(oid) {
            return Ok(pe.get(oid));
        }

        if let Some(exts) = self.decoded_cert.tbs_certificate.extensions.as_ref() {
            if let Some(i) = exts.iter().find(|&ext| ext.extn_id == *oid) {
                let v = i.extn_value.as_bytes();
                match *oid {
                    ID_CE_BASIC_CONSTRAINTS => {
                        add_and_return!(pe, v, BasicConstraints, BasicConstraints);
                    }
                    ID_CE_KEY_USAGE => {
                        add_and_return!(pe, v, KeyUsage, KeyUsage);
                    }
                    ID_CE_SUBJECT_KEY_IDENTIFIER => {
                        add_and_return!(pe, v, SubjectKeyIdentifier, SubjectKeyIdentifier);
                    }
                    ID_CE_AUTHORITY_KEY_IDENTIFIER => {
                        add_and_return!(pe, v, AuthorityKeyIdentifier, AuthorityKeyIdentifier);
                    }
                    ID_CE_SUBJECT_ALT_NAME => {
                        add_and_return!(pe, v, SubjectAltName, SubjectAltName);
                    }
                    _ => {
                        // ignore unrecognized
                    }
                }
            }
        }
        Ok(None)
    }

    fn parse_extensions(&'_ mut self, oids: &[ObjectIdentifier]) {
        for oid in oids {
            let _r = self.parse_extension(oid);
        }
    }
}

impl GridCertificate {
    /// Subject name of the certificate
    pub fn subject(&self) -> &Name {
        &self.decoded_cert.tbs_certificate.subject
    }

    /// Issuer name of the certificate
    pub fn issuer(&self) -> &Name {
        &self.decoded_cert.tbs_certificate.issuer
    }

    /// Serial number bytes as encoded in the certificate
    pub fn serial(&self) -> &[u8] {
        self.decoded_cert.tbs_certificate.serial_number.as_bytes()
    }

    /// Subject public key of the certificate
    pub fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.decoded_cert.tbs_certificate.subject_public_key_info
    }

    /// notBefore as seconds since the Unix epoch
    pub fn not_before(&self) -> u64 {
        self.decoded_cert
            .tbs_certificate
            .validity
            .not_before
            .to_unix_duration()
            .as_secs()
    }

    /// notAfter as seconds since the Unix epoch
    pub fn not_after(&self) -> u64 {
        self.decoded_cert
            .tbs_certificate
            .validity
            .not_after
            .to_unix_duration()
            .as_secs()
    }

    /// `subject_hash` returns the trust store index of the subject name.
    pub fn subject_hash(&self) -> Result<String> {
        name_hash(self.subject())
    }

    /// `issuer_hash` returns the trust store index of the issuer name.
    pub fn issuer_hash(&self) -> Result<String> {
        name_hash(self.issuer())
    }

    /// Key usage extension, if present and decodable
    pub fn key_usage(&self) -> Option<&KeyUsage> {
        match self.parsed_extensions.get(&ID_CE_KEY_USAGE) {
            Some(GridExtension::KeyUsage(ku)) => Some(ku),
            _ => None,
        }
    }

    /// `basic_constraints_path_length` returns -1 when the certificate is not a CA, the
    /// pathLenConstraint when one is asserted and `i32::MAX` when the CA is unconstrained.
    ///
    /// Version 1 self-issued certificates predate basicConstraints and are treated as
    /// unconstrained CAs.
    pub fn basic_constraints_path_length(&self) -> i32 {
        match self.parsed_extensions.get(&ID_CE_BASIC_CONSTRAINTS) {
            Some(GridExtension::BasicConstraints(bc)) => {
                if !bc.ca {
                    -1
                } else {
                    match bc.path_len_constraint {
                        Some(pl) => pl as i32,
                        None => i32::MAX,
                    }
                }
            }
            _ => {
                if Version::V1 == self.decoded_cert.tbs_certificate.version
                    && self.is_self_issued()
                {
                    i32::MAX
                } else {
                    -1
                }
            }
        }
    }

    /// keyIdentifier from the authority key identifier extension, if present
    pub fn authority_key_id(&self) -> Option<&[u8]> {
        match self.parsed_extensions.get(&ID_CE_AUTHORITY_KEY_IDENTIFIER) {
            Some(GridExtension::AuthorityKeyIdentifier(akid)) => {
                akid.key_identifier.as_ref().map(|kid| kid.as_bytes())
            }
            _ => None,
        }
    }

    /// Value of the subject key identifier extension, if present
    pub fn subject_key_id(&self) -> Option<&[u8]> {
        match self.parsed_extensions.get(&ID_CE_SUBJECT_KEY_IDENTIFIER) {
            Some(GridExtension::SubjectKeyIdentifier(skid)) => Some(skid.0.as_bytes()),
            _ => None,
        }
    }

    /// `extension_value` returns the criticality flag and raw extnValue bytes for the extension
    /// identified by the OID.
    pub fn extension_value(&self, oid: &ObjectIdentifier) -> Option<(bool, &[u8])> {
        let exts = self.decoded_cert.tbs_certificate.extensions.as_ref()?;
        exts.iter()
            .find(|ext| ext.extn_id == *oid)
            .map(|ext| (ext.critical, ext.extn_value.as_bytes()))
    }

    /// `has_extension` returns true if an extension with the given OID is present.
    pub fn has_extension(&self, oid: &ObjectIdentifier) -> bool {
        self.extension_value(oid).is_some()
    }

    /// OIDs of the extensions marked critical
    pub fn critical_extensions(&self) -> Vec<ObjectIdentifier> {
        match self.decoded_cert.tbs_certificate.extensions.as_ref() {
            Some(exts) => exts
                .iter()
                .filter(|ext| ext.critical)
                .map(|ext| ext.extn_id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// `unprocessed_critical_extension` returns the first critical extension that is not listed in
    /// [`PROCESSED_CRITICAL_EXTENSIONS`].
    pub fn unprocessed_critical_extension(&self) -> Option<ObjectIdentifier> {
        self.critical_extensions()
            .into_iter()
            .find(|oid| !PROCESSED_CRITICAL_EXTENSIONS.contains(oid))
    }

    /// `is_self_issued` returns true if the subject and issuer names match.
    pub fn is_self_issued(&self) -> bool {
        compare_names(self.subject(), self.issuer())
    }

    /// directoryName entries from the subject alternative name extension
    pub fn alt_directory_names(&self) -> Vec<&Name> {
        match self.parsed_extensions.get(&ID_CE_SUBJECT_ALT_NAME) {
            Some(GridExtension::SubjectAltName(san)) => san
                .0
                .iter()
                .filter_map(|gn| match gn {
                    GeneralName::DirectoryName(n) => Some(n),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `to_der_signed` splits the encoded certificate into the to-be-signed bytes, signature
    /// algorithm and signature without re-encoding.
    pub fn to_der_signed(&self) -> Result<DeferDecodeSigned> {
        Ok(DeferDecodeSigned::from_der(self.encoded_cert.as_slice())?)
    }
}

/// [`DeferDecodeSigned`] is used to parse only the top-level structure of a signed object, without
/// parsing the details of the to-be-signed field.
///
/// Deferred decoding avoids re-encoding the signed content, and potentially encountering problems
/// with structures that were not DER-encoded prior to signing. The same outer shape is shared by
/// certificates, CRLs and attribute certificates.
pub struct DeferDecodeSigned {
    /// tbsCertificate, tbsCertList or acinfo
    pub tbs_field: Vec<u8>,
    /// signatureAlgorithm   AlgorithmIdentifier,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// signature            BIT STRING
    pub signature: BitString,
}

impl ::der::FixedTag for DeferDecodeSigned {
    const TAG: ::der::Tag = ::der::Tag::Sequence;
}

impl<'a> ::der::DecodeValue<'a> for DeferDecodeSigned {
    fn decode_value<R: ::der::Reader<'a>>(
        reader: &mut R,
        header: ::der::Header,
    ) -> ::der::Result<Self> {
        use ::der::Reader as _;
        reader.read_nested(header.length, |reader| {
            let tbs_field = reader.tlv_bytes()?;
            let signature_algorithm = reader.decode()?;
            let signature = reader.decode()?;
            Ok(Self {
                tbs_field: tbs_field.to_vec(),
                signature_algorithm,
                signature,
            })
        })
    }
}

/// `verify_signed` verifies the signature on a certificate, CRL or attribute certificate encoding
/// using the presented public key.
pub fn verify_signed(
    engine: &dyn SignatureEngine,
    encoded: &[u8],
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let defer = DeferDecodeSigned::from_der(encoded)?;
    engine.verify(
        defer.tbs_field.as_slice(),
        defer.signature.raw_bytes(),
        &defer.signature_algorithm,
        spki,
    )
}

/// `parse_cert` takes a buffer containing a DER or PEM encoded certificate and returns a
/// [`GridCertificate`] if parsing was successful.
pub fn parse_cert(buffer: &[u8], locator: &str) -> Result<GridCertificate> {
    let der_buf = if buffer.starts_with(b"-----BEGIN") {
        match pem_rfc7468::decode_vec(buffer) {
            Ok((_label, d)) => d,
            Err(e) => {
                error!("Failed to decode PEM certificate from {}: {}", locator, e);
                return Err(Error::ParseError);
            }
        }
    } else {
        buffer.to_vec()
    };

    match GridCertificate::try_from(der_buf.as_slice()) {
        Ok(c) => Ok(c),
        Err(e) => {
            error!("Failed to parse certificate from {}: {}", locator, e);
            Err(Error::Asn1Error(e))
        }
    }
}

/// `is_ca` returns false if a key usage extension is present without keyCertSign or if the
/// basicConstraints path length is -1, and true otherwise.
pub fn is_ca(cert: &GridCertificate) -> bool {
    if let Some(ku) = cert.key_usage() {
        if !ku.0.contains(KeyUsages::KeyCertSign) {
            return false;
        }
    }
    cert.basic_constraints_path_length() != -1
}

/// `appended_common_name` returns the value of the final subject RDN when the subject is the issuer name
/// plus one trailing commonName RDN.
pub(crate) fn appended_common_name(cert: &GridCertificate) -> Option<String> {
    let subject = cert.subject();
    let issuer = cert.issuer();
    if subject.0.len() != issuer.0.len() + 1 {
        return None;
    }
    for (s, i) in subject.0.iter().zip(issuer.0.iter()) {
        if !compare_rdns(s, i) {
            return None;
        }
    }
    common_name_of_rdn(get_leaf_rdn(subject)?)
}

/// `is_proxy` returns true if the certificate carries either proxy certificate information
/// extension or if its subject is the issuer name plus a trailing `CN=proxy` or
/// `CN=limited proxy`.
pub fn is_proxy(cert: &GridCertificate) -> bool {
    if cert.has_extension(&PKIX_PE_PROXY_CERT_INFO) || cert.has_extension(&GT_PROXY_CERT_INFO_DRAFT)
    {
        return true;
    }
    matches!(
        appended_common_name(cert).as_deref(),
        Some("proxy") | Some("limited proxy")
    )
}

/// `check_issued` returns true if `issued` could have been issued by `issuer`: the issuer name
/// matches the issuer's subject, key identifiers agree when both are present and, when the issuer
/// is not a CA, the issuer may sign and `issued` is a proxy.
pub fn check_issued(issuer: &GridCertificate, issued: &GridCertificate) -> bool {
    if !compare_names(issued.issuer(), issuer.subject()) {
        return false;
    }

    if let (Some(akid), Some(skid)) = (issued.authority_key_id(), issuer.subject_key_id()) {
        if akid != skid {
            return false;
        }
    }

    if !is_ca(issuer) {
        if let Some(ku) = issuer.key_usage() {
            if !ku.0.contains(KeyUsages::DigitalSignature) {
                return false;
            }
        }
        if !is_proxy(issued) {
            return false;
        }
    }
    true
}
