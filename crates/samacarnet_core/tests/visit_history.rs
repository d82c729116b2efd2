mod common;

use common::{create_patient, create_personnel, create_tenant};
use rusqlite::Connection;
use samacarnet_core::db::open_db_in_memory;
use samacarnet_core::model::patient::PatientId;
use samacarnet_core::model::personnel::PersonnelId;
use samacarnet_core::model::tenant::TenantId;
use samacarnet_core::model::visit::NewVisitHistory;
use samacarnet_core::repo::visit_history_repo::{
    SqliteVisitHistoryRepository, VisitHistoryRepository,
};
use samacarnet_core::{
    TransitionContext, Visit, VisitAction, VisitService, VisitServiceError, VisitStatus,
    VisitUpdate,
};
use serde_json::json;

struct Fixture {
    conn: Connection,
    tenant_id: TenantId,
    patient_id: PatientId,
    doctor: PersonnelId,
}

fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let tenant_id = create_tenant(&conn, "clinique-a");
    let patient_id = create_patient(&conn, tenant_id, "SC-0001-000001");
    let doctor = create_personnel(&conn, tenant_id, "dr.diop@clinique.sn");
    Fixture {
        conn,
        tenant_id,
        patient_id,
        doctor,
    }
}

fn schedule(fx: &Fixture, scheduled_at: i64) -> Visit {
    VisitService::new(&fx.conn)
        .schedule_visit(
            &Visit::new(fx.tenant_id, fx.patient_id, fx.doctor, scheduled_at),
            TransitionContext::at(fx.doctor, 1_000),
        )
        .unwrap()
}

#[test]
fn scheduling_records_created_entry() {
    let fx = fixture();
    let visit = schedule(&fx, 50_000);

    assert_eq!(visit.status, VisitStatus::Scheduled);
    let history = VisitService::new(&fx.conn).history(visit.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, VisitAction::Created);
    assert_eq!(history[0].personnel_id, fx.doctor);
    assert_eq!(history[0].action_date, 1_000);
    assert_eq!(history[0].changes["status"]["to"], json!("scheduled"));
}

#[test]
fn each_transition_appends_exactly_one_row_and_keeps_earlier_rows() {
    let fx = fixture();
    let service = VisitService::new(&fx.conn);
    let visit = schedule(&fx, 50_000);
    let history_repo = SqliteVisitHistoryRepository::new(&fx.conn);

    let before = history_repo.list_for_visit(visit.id).unwrap();
    service
        .reschedule_visit(
            visit.id,
            90_000,
            Some("Doctor unavailable"),
            TransitionContext::at(fx.doctor, 2_000),
        )
        .unwrap();
    let after_reschedule = history_repo.list_for_visit(visit.id).unwrap();
    assert_eq!(after_reschedule.len(), before.len() + 1);
    assert_eq!(&after_reschedule[..before.len()], &before[..]);

    service
        .update_visit(
            visit.id,
            &VisitUpdate {
                notes: Some("Fasting required".to_string()),
                ..VisitUpdate::default()
            },
            TransitionContext::at(fx.doctor, 3_000),
        )
        .unwrap();
    let completed = service
        .complete_visit(visit.id, None, TransitionContext::at(fx.doctor, 4_000))
        .unwrap();
    assert_eq!(completed.status, VisitStatus::Completed);

    let history = history_repo.list_for_visit(visit.id).unwrap();
    assert_eq!(&history[..after_reschedule.len()], &after_reschedule[..]);
    let actions: Vec<_> = history.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            VisitAction::Created,
            VisitAction::Rescheduled,
            VisitAction::Updated,
            VisitAction::Completed,
        ]
    );
    assert_eq!(
        history[1].changes,
        json!({"scheduled_at": {"from": 50_000, "to": 90_000}})
    );
    assert_eq!(history[1].reason.as_deref(), Some("Doctor unavailable"));
}

#[test]
fn terminal_visits_reject_transitions_without_writing_history() {
    let fx = fixture();
    let service = VisitService::new(&fx.conn);
    let visit = schedule(&fx, 50_000);
    service
        .cancel_visit(visit.id, "Patient request", TransitionContext::at(fx.doctor, 2_000))
        .unwrap();

    let err = service
        .complete_visit(visit.id, None, TransitionContext::at(fx.doctor, 3_000))
        .unwrap_err();
    assert!(matches!(
        err,
        VisitServiceError::InvalidTransition {
            from: VisitStatus::Cancelled,
            action: VisitAction::Completed,
            ..
        }
    ));
    assert_eq!(service.history(visit.id).unwrap().len(), 2);
}

#[test]
fn cancel_requires_reason() {
    let fx = fixture();
    let service = VisitService::new(&fx.conn);
    let visit = schedule(&fx, 50_000);

    let err = service
        .cancel_visit(visit.id, "   ", TransitionContext::at(fx.doctor, 2_000))
        .unwrap_err();
    assert!(matches!(err, VisitServiceError::MissingReason));
    assert_eq!(service.get_visit(visit.id).unwrap().status, VisitStatus::Scheduled);
}

#[test]
fn empty_update_is_rejected() {
    let fx = fixture();
    let service = VisitService::new(&fx.conn);
    let visit = schedule(&fx, 50_000);

    let err = service
        .reschedule_visit(visit.id, 50_000, None, TransitionContext::at(fx.doctor, 2_000))
        .unwrap_err();
    assert!(matches!(err, VisitServiceError::NoChanges(id) if id == visit.id));
    assert_eq!(service.history(visit.id).unwrap().len(), 1);
}

#[test]
fn unknown_visit_is_reported() {
    let fx = fixture();
    let err = VisitService::new(&fx.conn)
        .complete_visit(777, None, TransitionContext::at(fx.doctor, 2_000))
        .unwrap_err();
    assert!(matches!(err, VisitServiceError::VisitNotFound(777)));
}

#[test]
fn latest_entry_breaks_action_date_ties_by_insertion_order() {
    let fx = fixture();
    let visit = schedule(&fx, 50_000);
    let repo = SqliteVisitHistoryRepository::new(&fx.conn);

    let mut entry = NewVisitHistory {
        visit_id: visit.id,
        personnel_id: fx.doctor,
        action: VisitAction::Updated,
        changes: json!({"notes": {"from": null, "to": "first"}}),
        reason: None,
        action_date: 5_000,
    };
    let first = repo.append(&entry).unwrap();
    entry.changes = json!({"notes": {"from": "first", "to": "second"}});
    let second = repo.append(&entry).unwrap();
    assert!(second > first);

    let latest = repo.latest_for_visit(visit.id).unwrap().unwrap();
    assert_eq!(latest.id, second);

    let ids: Vec<_> = repo
        .list_for_visit(visit.id)
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(&ids[1..], &[first, second]);
}

#[test]
fn older_action_date_sorts_before_newer_regardless_of_insertion() {
    let fx = fixture();
    let visit = schedule(&fx, 50_000);
    let repo = SqliteVisitHistoryRepository::new(&fx.conn);

    let backdated = repo
        .append(&NewVisitHistory {
            visit_id: visit.id,
            personnel_id: fx.doctor,
            action: VisitAction::Updated,
            changes: json!({"notes": {"from": null, "to": "late entry"}}),
            reason: Some("entered after the fact".to_string()),
            action_date: 500,
        })
        .unwrap();

    let history = repo.list_for_visit(visit.id).unwrap();
    assert_eq!(history[0].id, backdated);
    assert_eq!(history[1].action, VisitAction::Created);
    assert_eq!(
        repo.latest_for_visit(visit.id).unwrap().unwrap().action,
        VisitAction::Created
    );
}

#[test]
fn storage_rejects_history_update_and_delete() {
    let fx = fixture();
    let visit = schedule(&fx, 50_000);

    let update = fx.conn.execute(
        "UPDATE visit_histories SET reason = 'tampered' WHERE visit_id = ?1;",
        [visit.id],
    );
    let err = update.unwrap_err();
    assert!(err.to_string().contains("append-only"));

    let delete = fx
        .conn
        .execute("DELETE FROM visit_histories WHERE visit_id = ?1;", [visit.id]);
    assert!(delete.is_err());

    let repo = SqliteVisitHistoryRepository::new(&fx.conn);
    assert_eq!(repo.count_for_visit(visit.id).unwrap(), 1);
    assert!(repo.list_for_visit(visit.id).unwrap()[0].reason.is_none());
}
