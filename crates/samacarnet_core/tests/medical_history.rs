mod common;

use common::{create_patient, create_tenant};
use samacarnet_core::db::open_db_in_memory;
use samacarnet_core::repo::medical_history_repo::{
    MedicalHistoryRepository, SqliteMedicalHistoryRepository,
};
use samacarnet_core::{MedicalHistory, MedicalHistoryType, RepoError, Severity, ValidationError};

#[test]
fn null_severity_round_trips_as_none() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let repo = SqliteMedicalHistoryRepository::new(&conn);

    let entry = MedicalHistory::new(
        patient_id,
        MedicalHistoryType::FamilyHistory,
        "Diabetes (mother)",
        "2020-01-15",
    );
    assert!(entry.severity.is_none());
    let id = repo.create_entry(&entry).unwrap();

    let loaded = repo.get_entry(id, false).unwrap().unwrap();
    assert_eq!(loaded.severity, None);
    assert_eq!(loaded.kind, MedicalHistoryType::FamilyHistory);
    assert_eq!(loaded.date_recorded, "2020-01-15");
    assert!(loaded.is_active);

    let stored: Option<String> = conn
        .query_row(
            "SELECT severity FROM medical_histories WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, None);
}

#[test]
fn severity_update_persists() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let repo = SqliteMedicalHistoryRepository::new(&conn);

    let id = repo
        .create_entry(&MedicalHistory::new(
            patient_id,
            MedicalHistoryType::Condition,
            "Asthma",
            "2015-05-05",
        ))
        .unwrap();
    let mut loaded = repo.get_entry(id, false).unwrap().unwrap();
    loaded.severity = Some(Severity::Critical);
    loaded.description = Some("Frequent attacks".to_string());
    repo.update_entry(&loaded).unwrap();

    let reloaded = repo.get_entry(id, false).unwrap().unwrap();
    assert_eq!(reloaded.severity, Some(Severity::Critical));
    assert_eq!(reloaded.description.as_deref(), Some("Frequent attacks"));
}

#[test]
fn list_filters_by_kind_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let repo = SqliteMedicalHistoryRepository::new(&conn);

    let old = repo
        .create_entry(&MedicalHistory::new(
            patient_id,
            MedicalHistoryType::Allergy,
            "Dust",
            "2001-01-01",
        ))
        .unwrap();
    let recent = repo
        .create_entry(&MedicalHistory::new(
            patient_id,
            MedicalHistoryType::Allergy,
            "Peanuts",
            "2022-03-03",
        ))
        .unwrap();
    repo.create_entry(&MedicalHistory::new(
        patient_id,
        MedicalHistoryType::Surgery,
        "Tonsillectomy",
        "2010-02-02",
    ))
    .unwrap();

    let ids: Vec<_> = repo
        .list_for_patient(patient_id, Some(MedicalHistoryType::Allergy), false)
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec![recent, old]);
    assert_eq!(repo.list_for_patient(patient_id, None, false).unwrap().len(), 3);
}

#[test]
fn entry_for_missing_patient_is_a_constraint_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMedicalHistoryRepository::new(&conn);

    let err = repo
        .create_entry(&MedicalHistory::new(
            4242,
            MedicalHistoryType::Condition,
            "Orphan",
            "2020-01-01",
        ))
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn invalid_date_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMedicalHistoryRepository::new(&conn);

    let err = repo
        .create_entry(&MedicalHistory::new(
            1,
            MedicalHistoryType::Condition,
            "Bad date",
            "15/01/2020",
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidFormat {
            field: "date_recorded",
            ..
        })
    ));
}
