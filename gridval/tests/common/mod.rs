//! Fabrication of certificates, CRLs and attribute certificates for integration tests.
//!
//! Objects are "signed" by [`TestSignatureEngine`]: the signature is the SHA-256 digest of the
//! to-be-signed bytes followed by the DER encoding of the signer's public key, so only the holder
//! of the matching test key produces a signature that verifies.

#![allow(dead_code)]

use core::str::FromStr;
use core::time::Duration;

use const_oid::db::rfc5912::{
    ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE, ID_EC_PUBLIC_KEY, SHA_256_WITH_RSA_ENCRYPTION,
};
use der::asn1::{Any, BitString, GeneralizedTime, OctetString, SetOfVec, UtcTime};
use der::{Decode, Encode};
use sha2::{Digest, Sha256};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::attr::Attribute;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::constraints::name::{GeneralSubtree, NameConstraints};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsage, KeyUsages};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

use gridval::*;

/// Time of interest used by the tests
pub const TOI: u64 = 1_700_000_000;
pub const NOT_BEFORE: u64 = 1_600_000_000;
pub const NOT_AFTER: u64 = 1_800_000_000;

pub const CA_DN: &str = "CN=Test CA,O=Grid,C=US";
pub const EEC_DN: &str = "CN=Alice,O=Grid,C=US";
pub const VOMS_DN: &str = "CN=voms.example.org,O=Grid,C=US";

/// Deterministic stand-in for a cryptographic library
pub struct TestSignatureEngine;

fn test_signature(message: &[u8], spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(message);
    hasher.update(spki.to_der().unwrap());
    hasher.finalize().to_vec()
}

impl SignatureEngine for TestSignatureEngine {
    fn verify(
        &self,
        message_to_verify: &[u8],
        signature: &[u8],
        _signature_alg: &AlgorithmIdentifierOwned,
        spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        if test_signature(message_to_verify, spki).as_slice() == signature {
            Ok(())
        } else {
            Err(Error::PathValidation(PathValidationStatus::BadSignature))
        }
    }
}

/// Public key for test key number `id`
pub fn key(id: u8) -> SubjectPublicKeyInfoOwned {
    SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: ID_EC_PUBLIC_KEY,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&[0x04, id, id, id, id]).unwrap(),
    }
}

pub fn sig_alg() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: SHA_256_WITH_RSA_ENCRYPTION,
        parameters: None,
    }
}

pub fn name(dn: &str) -> Name {
    Name::from_str(dn).unwrap()
}

/// `name` followed by one more commonName RDN
pub fn append_cn(name: &Name, cn: &str) -> Name {
    let mut n = name.clone();
    let leaf = Name::from_str(&format!("CN={}", cn)).unwrap();
    n.0.push(leaf.0[0].clone());
    n
}

pub fn utc(secs: u64) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}

pub fn ext<T: Encode>(oid: der::asn1::ObjectIdentifier, critical: bool, value: &T) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

pub fn ca_extensions(path_len: Option<u8>) -> Vec<Extension> {
    vec![
        ext(
            ID_CE_BASIC_CONSTRAINTS,
            true,
            &BasicConstraints {
                ca: true,
                path_len_constraint: path_len,
            },
        ),
        ext(
            ID_CE_KEY_USAGE,
            true,
            &KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
        ),
    ]
}

pub fn ee_extensions() -> Vec<Extension> {
    vec![ext(
        ID_CE_KEY_USAGE,
        true,
        &KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment),
    )]
}

pub fn proxy_cert_info_extension(oid: der::asn1::ObjectIdentifier, path_len: Option<u32>, language: der::asn1::ObjectIdentifier) -> Extension {
    ext(
        oid,
        true,
        &ProxyCertInfo {
            path_len_constraint: path_len,
            proxy_policy: ProxyPolicy {
                policy_language: language,
                policy: None,
            },
        },
    )
}

/// Restriction extension permitting the given IPv4 networks, each as address followed by mask
pub fn restriction_extension(oid: der::asn1::ObjectIdentifier, networks: &[[u8; 8]]) -> Extension {
    let subtrees = networks
        .iter()
        .map(|n| GeneralSubtree {
            base: GeneralName::IpAddress(OctetString::new(n.to_vec()).unwrap()),
            minimum: 0,
            maximum: None,
        })
        .collect();
    ext(
        oid,
        false,
        &NameConstraints {
            permitted_subtrees: Some(subtrees),
            excluded_subtrees: None,
        },
    )
}

/// Description of a certificate to fabricate
pub struct CertTemplate {
    pub subject: Name,
    pub issuer: Name,
    pub serial: u8,
    pub key: u8,
    pub issuer_key: u8,
    pub not_before: u64,
    pub not_after: u64,
    pub extensions: Vec<Extension>,
}

impl CertTemplate {
    pub fn new(subject: Name, issuer: Name, key: u8, issuer_key: u8) -> Self {
        CertTemplate {
            subject,
            issuer,
            serial: key,
            key,
            issuer_key,
            not_before: NOT_BEFORE,
            not_after: NOT_AFTER,
            extensions: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, exts: Vec<Extension>) -> Self {
        self.extensions.extend(exts);
        self
    }

    pub fn with_validity(mut self, not_before: u64, not_after: u64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn build(&self) -> GridCertificate {
        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&[self.serial]).unwrap(),
            signature: sig_alg(),
            issuer: self.issuer.clone(),
            validity: Validity {
                not_before: utc(self.not_before),
                not_after: utc(self.not_after),
            },
            subject: self.subject.clone(),
            subject_public_key_info: key(self.key),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if self.extensions.is_empty() {
                None
            } else {
                Some(self.extensions.clone())
            },
        };
        let sig = test_signature(&tbs.to_der().unwrap(), &key(self.issuer_key));
        let cert = Certificate {
            tbs_certificate: tbs,
            signature_algorithm: sig_alg(),
            signature: BitString::from_bytes(&sig).unwrap(),
        };
        GridCertificate::try_from(cert).unwrap()
    }
}

/// Self-signed CA certificate using key 1
pub fn ca() -> GridCertificate {
    CertTemplate::new(name(CA_DN), name(CA_DN), 1, 1)
        .with_extensions(ca_extensions(None))
        .build()
}

/// End entity certificate issued by [`ca`] using key 2
pub fn eec() -> GridCertificate {
    CertTemplate::new(name(EEC_DN), name(CA_DN), 2, 1)
        .with_extensions(ee_extensions())
        .build()
}

/// Legacy proxy of `issuer`, which holds key `issuer_key`
pub fn legacy_proxy(issuer: &GridCertificate, issuer_key: u8, key: u8, cn: &str) -> GridCertificate {
    CertTemplate::new(
        append_cn(issuer.subject(), cn),
        issuer.subject().clone(),
        key,
        issuer_key,
    )
    .build()
}

/// RFC 3820 proxy of `issuer`, which holds key `issuer_key`
pub fn rfc_proxy(
    issuer: &GridCertificate,
    issuer_key: u8,
    key: u8,
    path_len: Option<u32>,
    extra: Vec<Extension>,
) -> GridCertificate {
    CertTemplate::new(
        append_cn(issuer.subject(), &format!("{}", 1000 + key as u32)),
        issuer.subject().clone(),
        key,
        issuer_key,
    )
    .with_extensions(vec![proxy_cert_info_extension(
        PKIX_PE_PROXY_CERT_INFO,
        path_len,
        PPL_INHERIT_ALL,
    )])
    .with_extensions(extra)
    .build()
}

/// CRL issued by the CA holding `issuer_key` listing the given serial numbers
pub fn crl(issuer: &Name, issuer_key: u8, serials: &[u8]) -> GridCrl {
    let revoked: Vec<RevokedCert> = serials
        .iter()
        .map(|s| RevokedCert {
            serial_number: SerialNumber::new(&[*s]).unwrap(),
            revocation_date: utc(NOT_BEFORE + 10),
            crl_entry_extensions: None,
        })
        .collect();
    let tbs = TbsCertList {
        version: Version::V2,
        signature: sig_alg(),
        issuer: issuer.clone(),
        this_update: utc(TOI - 1000),
        next_update: Some(utc(TOI + 100_000)),
        revoked_certificates: if revoked.is_empty() { None } else { Some(revoked) },
        crl_extensions: None,
    };
    let sig = test_signature(&tbs.to_der().unwrap(), &key(issuer_key));
    let crl = CertificateList {
        tbs_cert_list: tbs,
        signature_algorithm: sig_alg(),
        signature: BitString::from_bytes(&sig).unwrap(),
    };
    GridCrl::try_from(crl).unwrap()
}

/// Snapshot holding [`ca`] as its only trust anchor
pub fn snapshot_with_ca() -> TrustStoreSnapshot {
    let mut snapshot = TrustStoreSnapshot::new();
    snapshot.add_anchor(ca()).unwrap();
    snapshot
}

pub fn settings() -> ValidationSettings {
    let mut vs = ValidationSettings::new();
    set_time_of_interest(&mut vs, TOI);
    vs
}

pub fn environment(snapshot: TrustStoreSnapshot, vs: ValidationSettings) -> GridEnvironment {
    GridEnvironment::new(
        Box::new(TestSignatureEngine),
        SharedTrustStore::new(snapshot),
        vs,
    )
}

/// VOMS server certificate issued by [`ca`] using key 7
pub fn voms_server() -> GridCertificate {
    CertTemplate::new(name(VOMS_DN), name(CA_DN), 7, 1)
        .with_extensions(ee_extensions())
        .build()
}

/// Description of an attribute certificate to fabricate
pub struct AcTemplate {
    pub holder: GridCertificate,
    pub issuer: Name,
    pub signer_key: u8,
    pub vo: String,
    pub fqans: Vec<String>,
    pub not_before: u64,
    pub not_after: u64,
    pub targets: Option<Vec<String>>,
    pub bundle: Vec<GridCertificate>,
    pub extra: Vec<Extension>,
}

impl AcTemplate {
    /// AC for the holder issued by [`voms_server`] for VO `atlas`
    pub fn new(holder: &GridCertificate) -> Self {
        AcTemplate {
            holder: holder.clone(),
            issuer: name(VOMS_DN),
            signer_key: 7,
            vo: "atlas".to_string(),
            fqans: vec!["/atlas/Role=NULL/Capability=NULL".to_string()],
            not_before: NOT_BEFORE,
            not_after: NOT_AFTER,
            targets: None,
            bundle: Vec::new(),
            extra: Vec::new(),
        }
    }

    pub fn build_ac(&self) -> AttributeCertificate {
        let ias = IetfAttrSyntax {
            policy_authority: Some(vec![GeneralName::UniformResourceIdentifier(
                der::asn1::Ia5String::new(&format!("{}://voms.example.org:15001", self.vo))
                    .unwrap(),
            )]),
            values: self
                .fqans
                .iter()
                .map(|f| IetfAttrSyntaxValue::Octets(OctetString::new(f.as_bytes().to_vec()).unwrap()))
                .collect(),
        };
        let value = Any::from_der(&ias.to_der().unwrap()).unwrap();

        let mut exts = Vec::new();
        if let Some(targets) = &self.targets {
            let ti: TargetInformation = vec![targets
                .iter()
                .map(|t| {
                    Target::TargetName(GeneralName::DnsName(
                        der::asn1::Ia5String::new(t).unwrap(),
                    ))
                })
                .collect()];
            exts.push(ext(ID_CE_TARGET_INFORMATION, true, &ti));
        }
        if !self.bundle.is_empty() {
            exts.push(ext(
                VOMS_AC_CERTS,
                false,
                &AcCertsSyntax {
                    certificates: self.bundle.iter().map(|c| c.decoded_cert.clone()).collect(),
                },
            ));
        }
        exts.extend(self.extra.clone());

        let acinfo = AttributeCertificateInfo {
            version: Version::V2,
            holder: Holder {
                base_certificate_id: Some(IssuerSerial {
                    issuer: vec![GeneralName::DirectoryName(self.holder.issuer().clone())],
                    serial: self.holder.decoded_cert.tbs_certificate.serial_number.clone(),
                    issuer_uid: None,
                }),
                ..Default::default()
            },
            issuer: AttCertIssuer::V2Form(V2Form {
                issuer_name: Some(vec![GeneralName::DirectoryName(self.issuer.clone())]),
                ..Default::default()
            }),
            signature: sig_alg(),
            serial_number: SerialNumber::new(&[0x42]).unwrap(),
            attr_cert_validity_period: AttCertValidityPeriod {
                not_before_time: GeneralizedTime::from_unix_duration(Duration::from_secs(
                    self.not_before,
                ))
                .unwrap(),
                not_after_time: GeneralizedTime::from_unix_duration(Duration::from_secs(
                    self.not_after,
                ))
                .unwrap(),
            },
            attributes: vec![Attribute {
                oid: VOMS_ATTRIBUTE,
                values: SetOfVec::try_from(vec![value]).unwrap(),
            }],
            issuer_unique_id: None,
            extensions: if exts.is_empty() { None } else { Some(exts) },
        };
        let sig = test_signature(&acinfo.to_der().unwrap(), &key(self.signer_key));
        AttributeCertificate {
            acinfo,
            signature_algorithm: sig_alg(),
            signature_value: BitString::from_bytes(&sig).unwrap(),
        }
    }

    pub fn build(&self) -> GridAttributeCertificate {
        GridAttributeCertificate::try_from(self.build_ac()).unwrap()
    }
}
