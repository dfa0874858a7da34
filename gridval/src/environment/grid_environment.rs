//! GridEnvironment aggregates a signature engine, a shared trust store and validation settings and
//! exposes the chain, attribute certificate and proxy classification operations.
//!
//! The sample below illustrates preparation of a GridEnvironment for validating a chain.
//! ```
//! use gridval::*;
//!
//! let mut snapshot = TrustStoreSnapshot::new();
//! // add CA certificates, CRLs, signing policies, VOMS server certificates and LSC records, e.g.,
//! // snapshot.add_anchor(parse_cert(&ca_der, "ca.pem")?)?;
//!
//! let env = GridEnvironment::new(
//!     Box::new(RustCryptoSignatureEngine::new()),
//!     SharedTrustStore::new(snapshot),
//!     ValidationSettings::new(),
//! );
//! assert_eq!(Err(Error::EmptyChain), env.validate_chain(&[]));
//! ```
//!
//! Each operation takes one trust store snapshot when it starts and uses it throughout, so a
//! concurrent [`GridEnvironment::refresh_trust_store`] never produces a mixed view.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::info;

use crate::environment::grid_environment_traits::*;
use crate::source::trust_store_snapshot::*;
use crate::util::error::*;
use crate::validator::ac_validator::*;
use crate::validator::attribute_certificate::GridAttributeCertificate;
use crate::validator::grid_certificate::GridCertificate;
use crate::validator::path_results::ChainValidationResults;
use crate::validator::path_settings::ValidationSettings;
use crate::validator::path_validator;
use crate::validator::proxy_info::*;

/// [`GridEnvironment`] ties together the collaborators used by validation operations.
pub struct GridEnvironment {
    /// Signature verification implementation
    engine: Box<dyn SignatureEngine>,
    /// Trust material, published in immutable generations
    trust_store: SharedTrustStore,
    /// Settings applied to every operation
    settings: ValidationSettings,
}

#[cfg(feature = "rust_crypto")]
impl Default for GridEnvironment {
    /// GridEnvironment::default uses [`RustCryptoSignatureEngine`](crate::util::crypto::RustCryptoSignatureEngine),
    /// an empty trust store and default settings.
    fn default() -> Self {
        GridEnvironment::new(
            Box::new(crate::util::crypto::RustCryptoSignatureEngine::new()),
            SharedTrustStore::default(),
            ValidationSettings::new(),
        )
    }
}

impl GridEnvironment {
    /// Creates a new [`GridEnvironment`]
    pub fn new(
        engine: Box<dyn SignatureEngine>,
        trust_store: SharedTrustStore,
        settings: ValidationSettings,
    ) -> Self {
        GridEnvironment {
            engine,
            trust_store,
            settings,
        }
    }

    /// Settings applied to every operation
    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// Replaces the settings applied to subsequent operations
    pub fn set_settings(&mut self, settings: ValidationSettings) {
        self.settings = settings;
    }

    /// The shared trust store
    pub fn trust_store(&self) -> &SharedTrustStore {
        &self.trust_store
    }

    /// `refresh_trust_store` publishes a new trust store generation.
    pub fn refresh_trust_store(&self, snapshot: TrustStoreSnapshot) {
        self.trust_store.refresh(snapshot);
    }

    /// `validate_chain` validates a possibly unordered chain whose first certificate is the target.
    ///
    /// Rejections are reported through the status of the returned [`ChainValidationResults`].
    /// `Err` is returned for an empty chain or when a certificate cannot be decoded.
    pub fn validate_chain(&self, certs: &[GridCertificate]) -> Result<ChainValidationResults> {
        let snapshot = self.trust_store.snapshot();
        let mut results = ChainValidationResults::new();
        match path_validator::validate_chain(
            self.engine.as_ref(),
            snapshot.as_ref(),
            &self.settings,
            certs,
            &mut results,
        ) {
            Ok(()) | Err(Error::PathValidation(_)) => Ok(results),
            Err(e) => Err(e),
        }
    }

    /// `validate_attribute_certificate` validates a VOMS attribute certificate for the given local
    /// host, or the host configured by `PS_HOST_NAME` when `host` is `None`.
    pub fn validate_attribute_certificate(
        &self,
        ac: &GridAttributeCertificate,
        host: Option<&str>,
    ) -> Result<()> {
        let snapshot = self.trust_store.snapshot();
        verify_attribute_certificate(
            self.engine.as_ref(),
            snapshot.as_ref(),
            &self.settings,
            ac,
            host,
        )
    }

    /// `validated_attribute_certificates` returns the VOMS attribute certificates embedded in a
    /// validated chain that validate and whose holder is the end entity certificate of the chain.
    pub fn validated_attribute_certificates(
        &self,
        results: &ChainValidationResults,
        host: Option<&str>,
    ) -> Result<Vec<GridAttributeCertificate>> {
        let eec = match (results.is_valid(), results.end_entity()) {
            (true, Some(eec)) => eec,
            _ => return Err(Error::PathValidation(results.status)),
        };
        let embedded = attribute_certificates_from_chain(&results.validated_path)?;
        let held: Vec<GridAttributeCertificate> = embedded
            .into_iter()
            .filter(|ac| match verify_holder(ac, eec) {
                Ok(()) => true,
                Err(e) => {
                    info!("Dropping attribute certificate: {}", e);
                    false
                }
            })
            .collect();

        let snapshot = self.trust_store.snapshot();
        Ok(validate_all(
            self.engine.as_ref(),
            snapshot.as_ref(),
            &self.settings,
            &held,
            host,
        ))
    }

    /// `classify_proxy` returns the proxy type and policy of the certificate.
    pub fn classify_proxy(&self, cert: &GridCertificate) -> Result<ProxyInfo> {
        classify(cert)
    }
}
