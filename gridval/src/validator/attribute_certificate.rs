//! Wrapper around decoded VOMS attribute certificates providing the facts consumed by attribute
//! certificate validation: holder, issuer, validity window, FQANs, targets and bundled issuer
//! certificates.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::name::{GeneralName, GeneralNames};
use x509_cert::name::Name;

use crate::asn1::attribute_certificate::*;
use crate::asn1::voms::*;
use crate::util::error::*;
use crate::util::name_utilities::name_hash;
use crate::validator::grid_certificate::GridCertificate;

/// Extensions an attribute certificate may mark critical
pub const PROCESSED_AC_CRITICAL_EXTENSIONS: &[ObjectIdentifier] = &[ID_CE_TARGET_INFORMATION];

/// VO and server address taken from the policy authority of the VOMS attribute
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VomsOrigin {
    /// Name of the virtual organization
    pub vo: String,
    /// Host name of the VOMS server
    pub host: String,
    /// Port of the VOMS server, if given
    pub port: Option<u16>,
}

impl VomsOrigin {
    /// `parse` splits a policy authority URI of the form `vo://host:port`.
    pub fn parse(uri: &str) -> Option<Self> {
        let (vo, rest) = uri.split_once("://")?;
        if vo.is_empty() {
            return None;
        }
        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => (h, p.parse::<u16>().ok()),
            None => (authority, None),
        };
        if host.is_empty() {
            return None;
        }
        Some(VomsOrigin {
            vo: vo.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

/// A generic attribute from the FullAttributes extension
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenericAttribute {
    /// Attribute name
    pub name: String,
    /// Attribute value
    pub value: String,
    /// Qualifier, usually the group that granted the attribute
    pub qualifier: Option<String>,
}

/// `GridAttributeCertificate` holds the encoded and decoded form of an attribute certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GridAttributeCertificate {
    /// Binary, encoded attribute certificate
    pub encoded_ac: Vec<u8>,
    /// Decoded attribute certificate
    pub decoded_ac: AttributeCertificate,
}

impl TryFrom<&[u8]> for GridAttributeCertificate {
    type Error = der::Error;
    fn try_from(enc_ac: &[u8]) -> der::Result<Self> {
        let decoded_ac = AttributeCertificate::from_der(enc_ac)?;
        Ok(GridAttributeCertificate {
            encoded_ac: enc_ac.to_vec(),
            decoded_ac,
        })
    }
}

impl TryFrom<AttributeCertificate> for GridAttributeCertificate {
    type Error = der::Error;
    fn try_from(ac: AttributeCertificate) -> der::Result<Self> {
        let encoded_ac = ac.to_der()?;
        Ok(GridAttributeCertificate {
            encoded_ac,
            decoded_ac: ac,
        })
    }
}

fn first_directory_name(gns: &GeneralNames) -> Option<&Name> {
    gns.iter().find_map(|gn| match gn {
        GeneralName::DirectoryName(n) => Some(n),
        _ => None,
    })
}

fn octets_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

/// `host_of_general_name` returns the host named by a dNSName or by the authority of a URI.
pub fn host_of_general_name(gn: &GeneralName) -> Option<String> {
    match gn {
        GeneralName::DnsName(d) => Some(d.to_string()),
        GeneralName::UniformResourceIdentifier(u) => {
            let s = u.to_string();
            let rest = match s.split_once("://") {
                Some((_, r)) => r,
                None => s.as_str(),
            };
            let authority = rest.split('/').next().unwrap_or_default();
            let host = match authority.rsplit_once(':') {
                Some((h, _)) => h,
                None => authority,
            };
            Some(host.to_string())
        }
        _ => None,
    }
}

impl GridAttributeCertificate {
    /// Holder of the attribute certificate
    pub fn holder(&self) -> &Holder {
        &self.decoded_ac.acinfo.holder
    }

    /// `issuer_name` returns the first directoryName of the issuer, from either the v1 or v2 form.
    pub fn issuer_name(&self) -> Option<&Name> {
        match &self.decoded_ac.acinfo.issuer {
            AttCertIssuer::V1Form(gns) => first_directory_name(gns),
            AttCertIssuer::V2Form(v2) => first_directory_name(v2.issuer_name.as_ref()?),
        }
    }

    /// Hash of the issuer name, `NotFound` when the issuer has no directoryName
    pub fn issuer_hash(&self) -> Result<String> {
        match self.issuer_name() {
            Some(n) => name_hash(n),
            None => Err(Error::NotFound),
        }
    }

    /// Serial number bytes
    pub fn serial(&self) -> &[u8] {
        self.decoded_ac.acinfo.serial_number.as_bytes()
    }

    /// notBeforeTime as seconds since the Unix epoch
    pub fn not_before(&self) -> u64 {
        self.decoded_ac
            .acinfo
            .attr_cert_validity_period
            .not_before_time
            .to_unix_duration()
            .as_secs()
    }

    /// notAfterTime as seconds since the Unix epoch
    pub fn not_after(&self) -> u64 {
        self.decoded_ac
            .acinfo
            .attr_cert_validity_period
            .not_after_time
            .to_unix_duration()
            .as_secs()
    }

    /// `extension_value` returns the criticality and value of the extension with the given OID.
    pub fn extension_value(&self, oid: &ObjectIdentifier) -> Option<(bool, &[u8])> {
        self.decoded_ac
            .acinfo
            .extensions
            .as_ref()?
            .iter()
            .find(|e| e.extn_id == *oid)
            .map(|e| (e.critical, e.extn_value.as_bytes()))
    }

    /// `unprocessed_critical_extension` returns the first critical extension other than
    /// targetInformation.
    pub fn unprocessed_critical_extension(&self) -> Option<ObjectIdentifier> {
        self.decoded_ac
            .acinfo
            .extensions
            .as_ref()?
            .iter()
            .find(|e| e.critical && !PROCESSED_AC_CRITICAL_EXTENSIONS.contains(&e.extn_id))
            .map(|e| e.extn_id)
    }

    /// `voms_attribute` decodes the VOMS attribute, if present.
    pub fn voms_attribute(&self) -> Result<Option<IetfAttrSyntax>> {
        let attr = match self
            .decoded_ac
            .acinfo
            .attributes
            .iter()
            .find(|a| a.oid == VOMS_ATTRIBUTE)
        {
            Some(a) => a,
            None => return Ok(None),
        };
        let value = match attr.values.iter().next() {
            Some(v) => v,
            None => return Err(Error::MalformedExtension(VOMS_ATTRIBUTE)),
        };
        let enc = value.to_der()?;
        match IetfAttrSyntax::from_der(&enc) {
            Ok(ias) => Ok(Some(ias)),
            Err(_) => Err(Error::MalformedExtension(VOMS_ATTRIBUTE)),
        }
    }

    /// `fqans` returns the FQANs asserted by the VOMS attribute, in order.
    pub fn fqans(&self) -> Result<Vec<String>> {
        let ias = match self.voms_attribute()? {
            Some(ias) => ias,
            None => return Ok(Vec::new()),
        };
        Ok(ias
            .values
            .iter()
            .map(|v| match v {
                IetfAttrSyntaxValue::Octets(o) => octets_to_string(o.as_bytes()),
                IetfAttrSyntaxValue::Oid(o) => o.to_string(),
                IetfAttrSyntaxValue::String(s) => s.clone(),
            })
            .collect())
    }

    /// `voms_origin` returns the VO and server taken from the policy authority of the VOMS
    /// attribute.
    pub fn voms_origin(&self) -> Result<Option<VomsOrigin>> {
        let ias = match self.voms_attribute()? {
            Some(ias) => ias,
            None => return Ok(None),
        };
        let gns = match &ias.policy_authority {
            Some(gns) => gns,
            None => return Ok(None),
        };
        Ok(gns.iter().find_map(|gn| match gn {
            GeneralName::UniformResourceIdentifier(u) => VomsOrigin::parse(&u.to_string()),
            _ => None,
        }))
    }

    /// `targets` returns the host names listed by the targetInformation extension, or `None` when
    /// the extension is absent. Targets given as certificates are not returned.
    pub fn targets(&self) -> Result<Option<Vec<String>>> {
        let v = match self.extension_value(&ID_CE_TARGET_INFORMATION) {
            Some((_, v)) => v,
            None => return Ok(None),
        };
        let ti = TargetInformation::from_der(v)
            .map_err(|_| Error::MalformedExtension(ID_CE_TARGET_INFORMATION))?;
        let mut hosts = Vec::new();
        for target in ti.iter().flatten() {
            let host = match target {
                Target::TargetName(gn) | Target::TargetGroup(gn) => host_of_general_name(gn),
                Target::TargetCert(_) => None,
            };
            if let Some(h) = host {
                hosts.push(h);
            }
        }
        Ok(Some(hosts))
    }

    /// `ac_certs` returns the issuer certificates bundled in the ACCerts extension, server first.
    pub fn ac_certs(&self) -> Result<Vec<GridCertificate>> {
        let v = match self.extension_value(&VOMS_AC_CERTS) {
            Some((_, v)) => v,
            None => return Ok(Vec::new()),
        };
        let acc =
            AcCertsSyntax::from_der(v).map_err(|_| Error::MalformedExtension(VOMS_AC_CERTS))?;
        let mut retval = Vec::new();
        for c in acc.certificates {
            retval.push(GridCertificate::try_from(c)?);
        }
        Ok(retval)
    }

    /// `full_attributes` returns the generic attributes of the FullAttributes extension.
    pub fn full_attributes(&self) -> Result<Vec<GenericAttribute>> {
        let v = match self.extension_value(&VOMS_FULL_ATTRIBUTES) {
            Some((_, v)) => v,
            None => return Ok(Vec::new()),
        };
        let fa = FullAttributes::from_der(v)
            .map_err(|_| Error::MalformedExtension(VOMS_FULL_ATTRIBUTES))?;
        Ok(fa
            .holders
            .iter()
            .flat_map(|h| h.attributes.iter())
            .map(|a| GenericAttribute {
                name: octets_to_string(a.name.as_bytes()),
                value: octets_to_string(a.value.as_bytes()),
                qualifier: a.qualifier.as_ref().map(|q| octets_to_string(q.as_bytes())),
            })
            .collect())
    }
}

/// `parse_attribute_certificate` takes a buffer containing a DER or PEM encoded attribute
/// certificate and returns a [`GridAttributeCertificate`] if parsing was successful.
pub fn parse_attribute_certificate(buffer: &[u8]) -> Result<GridAttributeCertificate> {
    let der_buf = if buffer.starts_with(b"-----BEGIN") {
        match pem_rfc7468::decode_vec(buffer) {
            Ok((_label, d)) => d,
            Err(_) => return Err(Error::ParseError),
        }
    } else {
        buffer.to_vec()
    };
    Ok(GridAttributeCertificate::try_from(der_buf.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_parsing() {
        assert_eq!(
            Some(VomsOrigin {
                vo: "atlas".to_string(),
                host: "voms.example.org".to_string(),
                port: Some(15001)
            }),
            VomsOrigin::parse("atlas://voms.example.org:15001")
        );
        assert_eq!(
            Some(VomsOrigin {
                vo: "cms".to_string(),
                host: "voms.example.org".to_string(),
                port: None
            }),
            VomsOrigin::parse("cms://voms.example.org")
        );
        assert_eq!(None, VomsOrigin::parse("voms.example.org:15001"));
        assert_eq!(None, VomsOrigin::parse("://voms.example.org"));
    }

    #[test]
    fn target_hosts() {
        use der::asn1::Ia5String;
        let dns = GeneralName::DnsName(Ia5String::new("host.example.org").unwrap());
        assert_eq!(Some("host.example.org".to_string()), host_of_general_name(&dns));
        let uri = GeneralName::UniformResourceIdentifier(
            Ia5String::new("https://host.example.org:8443/path").unwrap(),
        );
        assert_eq!(Some("host.example.org".to_string()), host_of_general_name(&uri));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_attribute_certificate(&[0x30, 0x03, 0x02, 0x01, 0x01]).is_err());
    }
}
