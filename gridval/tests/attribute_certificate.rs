mod common;

use common::*;
use der::asn1::OctetString;
use der::Encode;
use x509_cert::ext::pkix::name::GeneralName;

use gridval::*;

fn snapshot_with_voms_server() -> TrustStoreSnapshot {
    let mut snapshot = snapshot_with_ca();
    snapshot.add_voms_server("atlas", voms_server()).unwrap();
    snapshot
}

fn ac_status(r: Result<()>) -> AcValidationStatus {
    match r {
        Err(Error::AttributeCertificate(s)) => s,
        Ok(()) => AcValidationStatus::Valid,
        Err(e) => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn ac_facts() {
    let eec = eec();
    let mut template = AcTemplate::new(&eec);
    template.fqans = vec![
        "/atlas/Role=NULL/Capability=NULL".to_string(),
        "/atlas/production/Role=NULL/Capability=NULL".to_string(),
    ];
    template.targets = Some(vec!["host.example.org".to_string()]);
    template.bundle = vec![voms_server()];
    let ac = template.build();

    assert_eq!(template.fqans, ac.fqans().unwrap());
    let origin = ac.voms_origin().unwrap().unwrap();
    assert_eq!("atlas", origin.vo);
    assert_eq!("voms.example.org", origin.host);
    assert_eq!(Some(15001), origin.port);
    assert_eq!(
        Some(vec!["host.example.org".to_string()]),
        ac.targets().unwrap()
    );
    assert_eq!(vec![voms_server()], ac.ac_certs().unwrap());
    assert_eq!(&name(VOMS_DN), ac.issuer_name().unwrap());
    assert_eq!(NOT_BEFORE, ac.not_before());
    assert_eq!(NOT_AFTER, ac.not_after());
    assert_eq!(None, ac.unprocessed_critical_extension());

    let reparsed = parse_attribute_certificate(&ac.encoded_ac).unwrap();
    assert_eq!(ac, reparsed);
}

#[test]
fn ac_issued_by_configured_voms_server_is_accepted() {
    let eec = eec();
    let ac = AcTemplate::new(&eec).build();
    let env = environment(snapshot_with_voms_server(), settings());
    assert_eq!(Ok(()), env.validate_attribute_certificate(&ac, None));
}

#[test]
fn unknown_ac_issuer_is_rejected() {
    let eec = eec();
    let ac = AcTemplate::new(&eec).build();

    // nothing configured for the VO
    let env = environment(snapshot_with_ca(), settings());
    assert_eq!(
        AcValidationStatus::UnknownACIssuer,
        ac_status(env.validate_attribute_certificate(&ac, None))
    );

    // a configured server whose key does not verify the signature
    let mut template = AcTemplate::new(&eec);
    template.signer_key = 9;
    let forged = template.build();
    let env = environment(snapshot_with_voms_server(), settings());
    assert_eq!(
        AcValidationStatus::UnknownACIssuer,
        ac_status(env.validate_attribute_certificate(&forged, None))
    );

    // configured for another VO
    let mut template = AcTemplate::new(&eec);
    template.vo = "cms".to_string();
    let other_vo = template.build();
    assert_eq!(
        AcValidationStatus::UnknownACIssuer,
        ac_status(env.validate_attribute_certificate(&other_vo, None))
    );
}

#[test]
fn lsc_matched_bundle_is_accepted() {
    let eec = eec();
    let voms = voms_server();
    let mut template = AcTemplate::new(&eec);
    template.bundle = vec![voms.clone()];
    let ac = template.build();

    let mut snapshot = snapshot_with_ca();
    snapshot.add_lsc(LscRecord {
        vo: "atlas".to_string(),
        host: "voms.example.org".to_string(),
        alternatives: vec![vec![(
            name_to_openssl(voms.subject()),
            name_to_openssl(voms.issuer()),
        )]],
    });
    let env = environment(snapshot, settings());
    assert_eq!(Ok(()), env.validate_attribute_certificate(&ac, None));

    // an LSC record that does not list the bundle and no configured server
    let mut snapshot = snapshot_with_ca();
    snapshot.add_lsc(LscRecord {
        vo: "atlas".to_string(),
        host: "voms.example.org".to_string(),
        alternatives: vec![vec![(
            name_to_openssl(voms.subject()),
            "/C=XX/CN=Someone Else".to_string(),
        )]],
    });
    let env = environment(snapshot, settings());
    assert_eq!(
        AcValidationStatus::UnknownACIssuer,
        ac_status(env.validate_attribute_certificate(&ac, None))
    );
}

#[test]
fn lsc_matched_bundle_must_sign_the_ac() {
    let eec = eec();
    let voms = voms_server();
    let mut template = AcTemplate::new(&eec);
    template.bundle = vec![voms.clone()];
    template.signer_key = 9;
    let ac = template.build();

    let mut snapshot = snapshot_with_ca();
    snapshot.add_lsc(LscRecord {
        vo: "atlas".to_string(),
        host: "voms.example.org".to_string(),
        alternatives: vec![openssl_pairs(&[voms])],
    });
    let env = environment(snapshot, settings());
    assert_eq!(
        AcValidationStatus::BadSignature,
        ac_status(env.validate_attribute_certificate(&ac, None))
    );
}

#[test]
fn untrusted_ac_issuer_carries_chain_status() {
    let eec = eec();
    let ac = AcTemplate::new(&eec).build();

    // the VOMS server certificate is configured but its CA is not
    let mut snapshot = TrustStoreSnapshot::new();
    snapshot.add_voms_server("atlas", voms_server()).unwrap();
    let env = environment(snapshot, settings());
    assert_eq!(
        AcValidationStatus::UntrustedACIssuer(PathValidationStatus::UnknownAnchor),
        ac_status(env.validate_attribute_certificate(&ac, None))
    );

    // the VOMS server certificate is revoked
    let mut snapshot = snapshot_with_voms_server();
    snapshot.add_crl(crl(&name(CA_DN), 1, &[7])).unwrap();
    let env = environment(snapshot, settings());
    assert_eq!(
        AcValidationStatus::UntrustedACIssuer(PathValidationStatus::Revoked),
        ac_status(env.validate_attribute_certificate(&ac, None))
    );
}

#[test]
fn ac_validity_is_checked() {
    let eec = eec();
    let env = environment(snapshot_with_voms_server(), settings());

    let mut template = AcTemplate::new(&eec);
    template.not_after = TOI - 1;
    assert_eq!(
        AcValidationStatus::Expired,
        ac_status(env.validate_attribute_certificate(&template.build(), None))
    );

    let mut template = AcTemplate::new(&eec);
    template.not_before = TOI + 1;
    assert_eq!(
        AcValidationStatus::NotYetValid,
        ac_status(env.validate_attribute_certificate(&template.build(), None))
    );
}

#[test]
fn targets_bind_the_ac_to_hosts() {
    let eec = eec();
    let mut template = AcTemplate::new(&eec);
    template.targets = Some(vec![
        "host.example.org".to_string(),
        "other.example.org".to_string(),
    ]);
    let ac = template.build();
    let env = environment(snapshot_with_voms_server(), settings());

    assert_eq!(
        Ok(()),
        env.validate_attribute_certificate(&ac, Some("HOST.example.org"))
    );
    assert_eq!(
        AcValidationStatus::TargetMismatch,
        ac_status(env.validate_attribute_certificate(&ac, Some("third.example.org")))
    );
    // no local host known
    assert_eq!(
        AcValidationStatus::TargetMismatch,
        ac_status(env.validate_attribute_certificate(&ac, None))
    );

    // local host from settings
    let mut vs = settings();
    set_host_name(&mut vs, "other.example.org".to_string());
    let env = environment(snapshot_with_voms_server(), vs);
    assert_eq!(Ok(()), env.validate_attribute_certificate(&ac, None));

    // target checks disabled
    let mut vs = settings();
    set_check_ac_targets(&mut vs, false);
    let env = environment(snapshot_with_voms_server(), vs);
    assert_eq!(
        Ok(()),
        env.validate_attribute_certificate(&ac, Some("third.example.org"))
    );
}

#[test]
fn unknown_critical_ac_extension_is_rejected() {
    let eec = eec();
    let mut template = AcTemplate::new(&eec);
    template.extra = vec![ext(ID_CE_NO_REV_AVAIL, true, &der::asn1::Null)];
    let env = environment(snapshot_with_voms_server(), settings());
    assert_eq!(
        AcValidationStatus::UnhandledCriticalExtension,
        ac_status(env.validate_attribute_certificate(&template.build(), None))
    );

    let mut template = AcTemplate::new(&eec);
    template.extra = vec![ext(ID_CE_NO_REV_AVAIL, false, &der::asn1::Null)];
    assert_eq!(
        Ok(()),
        env.validate_attribute_certificate(&template.build(), None)
    );
}

#[test]
fn holder_must_name_the_end_entity() {
    let eec = eec();
    let ac = AcTemplate::new(&eec).build();
    assert_eq!(Ok(()), verify_holder(&ac, &eec));

    let other = CertTemplate::new(name("CN=Bob,O=Grid,C=US"), name(CA_DN), 6, 1)
        .with_extensions(ee_extensions())
        .build();
    assert_eq!(
        Err(Error::AttributeCertificate(AcValidationStatus::HolderMismatch)),
        verify_holder(&ac, &other)
    );
}

#[test]
fn embedded_acs_are_extracted_and_validated() {
    let eec = eec();
    let good = AcTemplate::new(&eec).build_ac();
    let mut expired = AcTemplate::new(&eec);
    expired.not_after = TOI - 1;
    let expired = expired.build_ac();

    let sequence: Vec<Vec<AttributeCertificate>> = vec![vec![good.clone(), expired]];
    let proxy = rfc_proxy(
        &eec,
        2,
        3,
        None,
        vec![ext(VOMS_AC_SEQUENCE, false, &sequence)],
    );

    let extracted = attribute_certificates_from_chain(&[proxy.clone(), eec.clone()]).unwrap();
    assert_eq!(2, extracted.len());
    assert_eq!(good.to_der().unwrap(), extracted[0].encoded_ac);

    let env = environment(snapshot_with_voms_server(), settings());
    let results = env.validate_chain(&[proxy, eec]).unwrap();
    assert!(results.is_valid());
    let valid = env
        .validated_attribute_certificates(&results, None)
        .unwrap();
    assert_eq!(1, valid.len());
    assert_eq!(good, valid[0].decoded_ac);
}

#[test]
fn full_attributes_are_reported() {
    let eec = eec();
    let octets = |s: &str| OctetString::new(s.as_bytes().to_vec()).unwrap();
    let fa = FullAttributes {
        holders: vec![AttributeHolder {
            grantor: vec![GeneralName::UniformResourceIdentifier(
                der::asn1::Ia5String::new("atlas://voms.example.org:15001").unwrap(),
            )],
            attributes: vec![
                AttributeEntry {
                    name: octets("nickname"),
                    value: octets("alice"),
                    qualifier: Some(octets("/atlas")),
                },
                AttributeEntry {
                    name: octets("site"),
                    value: octets("CERN"),
                    qualifier: None,
                },
            ],
        }],
    };
    let mut template = AcTemplate::new(&eec);
    template.extra = vec![ext(VOMS_FULL_ATTRIBUTES, false, &fa)];
    let ac = template.build();

    assert_eq!(
        vec![
            GenericAttribute {
                name: "nickname".to_string(),
                value: "alice".to_string(),
                qualifier: Some("/atlas".to_string()),
            },
            GenericAttribute {
                name: "site".to_string(),
                value: "CERN".to_string(),
                qualifier: None,
            },
        ],
        ac.full_attributes().unwrap()
    );
    let env = environment(snapshot_with_voms_server(), settings());
    assert_eq!(Ok(()), env.validate_attribute_certificate(&ac, None));

    // absent extension
    assert!(AcTemplate::new(&eec).build().full_attributes().unwrap().is_empty());

    let mut template = AcTemplate::new(&eec);
    template.extra = vec![ext(VOMS_FULL_ATTRIBUTES, false, &der::asn1::Null)];
    assert_eq!(
        Err(Error::MalformedExtension(VOMS_FULL_ATTRIBUTES)),
        template.build().full_attributes()
    );
}

#[test]
fn configured_voms_server_is_the_sole_issuer_certificate() {
    let sub_dn = "CN=Sub CA,O=Grid,C=US";
    let sub = CertTemplate::new(name(sub_dn), name(CA_DN), 5, 1)
        .with_extensions(ca_extensions(None))
        .build();
    let voms = CertTemplate::new(name(VOMS_DN), name(sub_dn), 7, 5)
        .with_extensions(ee_extensions())
        .build();
    let mut snapshot = snapshot_with_ca();
    snapshot.add_anchor(sub).unwrap();
    snapshot.add_voms_server("atlas", voms).unwrap();
    let env = environment(snapshot, settings());

    let eec = eec();
    assert_eq!(
        Ok(()),
        env.validate_attribute_certificate(&AcTemplate::new(&eec).build(), None)
    );

    // a bundled expired copy of the sub CA does not displace the trusted one
    let stale_sub = CertTemplate::new(name(sub_dn), name(CA_DN), 5, 1)
        .with_extensions(ca_extensions(None))
        .with_validity(NOT_BEFORE, TOI - 1)
        .build();
    let mut template = AcTemplate::new(&eec);
    template.bundle = vec![stale_sub];
    assert_eq!(
        Ok(()),
        env.validate_attribute_certificate(&template.build(), None)
    );
}
