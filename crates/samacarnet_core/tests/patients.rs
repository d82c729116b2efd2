mod common;

use common::{create_patient, create_tenant};
use samacarnet_core::db::open_db_in_memory;
use samacarnet_core::repo::patient_repo::PatientListQuery;
use samacarnet_core::{
    EmergencyContact, Gender, MedicalHistory, MedicalHistoryType, Medication, Patient,
    PatientService, PatientServiceError, QrCodeService,
};
use std::time::Duration;

fn draft(tenant_id: i64, national_id: &str) -> Patient {
    Patient::new(
        tenant_id,
        "",
        national_id,
        "Ibrahima",
        "Sow",
        "1985-11-03",
        Gender::Male,
    )
}

#[test]
fn registration_assigns_sequential_numbers_per_tenant() {
    let conn = open_db_in_memory().unwrap();
    let first_tenant = create_tenant(&conn, "clinique-a");
    let second_tenant = create_tenant(&conn, "clinique-b");
    let service = PatientService::new(&conn);

    let first = service.register_patient(&draft(first_tenant, "111")).unwrap();
    let second = service.register_patient(&draft(first_tenant, "222")).unwrap();
    let other = service.register_patient(&draft(second_tenant, "333")).unwrap();

    assert_eq!(first.patient_number, format!("SC-{first_tenant:04}-000001"));
    assert_eq!(second.patient_number, format!("SC-{first_tenant:04}-000002"));
    assert_eq!(other.patient_number, format!("SC-{second_tenant:04}-000001"));
}

#[test]
fn generated_numbers_skip_past_manually_entered_ones() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let service = PatientService::new(&conn);

    let mut manual = draft(tenant_id, "111");
    manual.patient_number = format!("SC-{tenant_id:04}-000002");
    let manual = service.register_patient(&manual).unwrap();
    let mut free_form = draft(tenant_id, "222");
    free_form.patient_number = format!("SC-{tenant_id:04}-LEGACY");
    service.register_patient(&free_form).unwrap();
    let generated = service.register_patient(&draft(tenant_id, "333")).unwrap();

    assert_eq!(manual.patient_number, format!("SC-{tenant_id:04}-000002"));
    assert_eq!(generated.patient_number, format!("SC-{tenant_id:04}-000003"));
}

#[test]
fn structured_fields_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let service = PatientService::new(&conn);

    let mut patient = draft(tenant_id, "444");
    patient.allergies = vec!["penicillin".to_string(), "latex".to_string()];
    patient.medications = vec![Medication {
        name: "Metformin".to_string(),
        dosage: Some("500 mg".to_string()),
        frequency: None,
    }];
    patient.emergency_contact = Some(EmergencyContact {
        name: "Fatou Sow".to_string(),
        phone: "+221770000002".to_string(),
        relationship: None,
    });
    let created = service.register_patient(&patient).unwrap();

    let loaded = service.get_patient(created.id, false).unwrap();
    assert_eq!(loaded.allergies, patient.allergies);
    assert_eq!(loaded.medications, patient.medications);
    assert_eq!(loaded.emergency_contact, patient.emergency_contact);
}

#[test]
fn search_matches_name_or_number() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let service = PatientService::new(&conn);
    let sow = service.register_patient(&draft(tenant_id, "555")).unwrap();
    create_patient(&conn, tenant_id, "SC-0001-000099");

    let found = service
        .list_patients(&PatientListQuery {
            tenant_id,
            search: Some("sow".to_string()),
            ..PatientListQuery::default()
        })
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, sow.id);
}

#[test]
fn archiving_revokes_qr_codes() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let qr_codes = QrCodeService::new(&conn);
    let issued = qr_codes.issue(patient_id, None).unwrap();
    assert!(qr_codes.resolve(&issued.code).unwrap().is_some());

    let revoked = PatientService::new(&conn).archive_patient(patient_id).unwrap();

    assert_eq!(revoked, 1);
    assert!(qr_codes.resolve(&issued.code).unwrap().is_none());
    let stored = qr_codes.list_for_patient(patient_id).unwrap();
    assert!(!stored[0].is_active);
}

#[test]
fn qr_payload_embeds_patient_number_and_code() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000007");

    let issued = QrCodeService::new(&conn)
        .issue(patient_id, Some(Duration::from_secs(3_600)))
        .unwrap();

    assert_eq!(issued.code.len(), 32);
    assert_eq!(
        issued.payload,
        format!("samacarnet://patients/SC-0001-000007?code={}", issued.code)
    );
    assert!(issued.expires_at.is_some());
}

#[test]
fn expired_or_revoked_codes_do_not_resolve() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let service = QrCodeService::new(&conn);

    let expired = service.issue(patient_id, None).unwrap();
    conn.execute(
        "UPDATE qr_codes SET expires_at = 1 WHERE id = ?1;",
        [expired.id],
    )
    .unwrap();
    assert!(service.resolve(&expired.code).unwrap().is_none());

    let revoked = service.issue(patient_id, None).unwrap();
    service.revoke(revoked.id).unwrap();
    assert!(service.resolve(&revoked.code).unwrap().is_none());

    assert!(service.resolve("no-such-code").unwrap().is_none());
}

#[test]
fn medical_history_requires_live_patient() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let service = PatientService::new(&conn);

    let added = service
        .add_medical_history(&MedicalHistory::new(
            patient_id,
            MedicalHistoryType::Medication,
            "Insulin",
            "2023-02-02",
        ))
        .unwrap();
    assert_eq!(service.medical_history(patient_id, None).unwrap().len(), 1);

    service.remove_medical_history(added.id).unwrap();
    assert!(service.medical_history(patient_id, None).unwrap().is_empty());

    service.archive_patient(patient_id).unwrap();
    let err = service
        .add_medical_history(&MedicalHistory::new(
            patient_id,
            MedicalHistoryType::Condition,
            "Late entry",
            "2024-01-01",
        ))
        .unwrap_err();
    assert!(matches!(err, PatientServiceError::PatientNotFound(id) if id == patient_id));
}
