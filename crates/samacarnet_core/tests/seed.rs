use samacarnet_core::db::open_db_in_memory;
use samacarnet_core::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use samacarnet_core::seed::{
    seed_demo_data_with, SeedOptions, DEMO_DOCTOR_EMAIL, DEMO_PASSWORD, DEMO_TENANT_SLUG,
};
use samacarnet_core::AuthService;

fn fast() -> SeedOptions {
    SeedOptions {
        password_iterations: 1_000,
    }
}

fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn seeding_fresh_database_inserts_everything() {
    let conn = open_db_in_memory().unwrap();

    let report = seed_demo_data_with(&conn, fast()).unwrap();

    assert_eq!(report.failed, 0);
    assert_eq!(report.inserted, report.attempted);
    assert_eq!(count(&conn, "tenants"), 1);
    assert_eq!(count(&conn, "patients"), 3);
    assert_eq!(count(&conn, "visits"), 3);
    assert_eq!(count(&conn, "super_admins"), 1);
    assert_eq!(count(&conn, "qr_codes"), 3);
    // created + one follow-up transition per visit
    assert_eq!(count(&conn, "visit_histories"), 6);
}

#[test]
fn reseeding_skips_existing_records_without_aborting() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_demo_data_with(&conn, fast()).unwrap();

    let second = seed_demo_data_with(&conn, fast()).unwrap();

    assert_eq!(second.attempted, first.attempted);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.failed, second.attempted);
    assert_eq!(count(&conn, "patients"), 3);
    assert_eq!(count(&conn, "visit_histories"), 6);
}

#[test]
fn seeded_doctor_can_log_in() {
    let conn = open_db_in_memory().unwrap();
    seed_demo_data_with(&conn, fast()).unwrap();
    let tenant = SqliteTenantRepository::new(&conn)
        .find_by_slug(DEMO_TENANT_SLUG)
        .unwrap()
        .unwrap();

    let outcome = AuthService::new(&conn)
        .login(tenant.id, DEMO_DOCTOR_EMAIL, DEMO_PASSWORD)
        .unwrap();
    assert_eq!(outcome.user.role.as_str(), "doctor");
}
