#![allow(dead_code)]

use rusqlite::Connection;
use samacarnet_core::model::patient::{Gender, Patient, PatientId};
use samacarnet_core::model::personnel::{
    Personnel, PersonnelCategory, PersonnelId, PersonnelSubcategory, PersonnelType,
};
use samacarnet_core::model::tenant::{Tenant, TenantId};
use samacarnet_core::model::user::{RoleName, User, UserId};
use samacarnet_core::password::hash_password_with_iterations;
use samacarnet_core::repo::patient_repo::{PatientRepository, SqlitePatientRepository};
use samacarnet_core::repo::personnel_repo::{PersonnelRepository, SqlitePersonnelRepository};
use samacarnet_core::repo::taxonomy_repo::{SqliteTaxonomyRepository, TaxonomyRepository};
use samacarnet_core::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use samacarnet_core::repo::user_repo::{RoleRepository, SqliteUserRepository, UserRepository};

pub const TEST_PASSWORD: &str = "correct horse";

pub fn create_tenant(conn: &Connection, slug: &str) -> TenantId {
    SqliteTenantRepository::new(conn)
        .create_tenant(&Tenant::new("Clinique Test", slug))
        .unwrap()
}

pub fn create_user(
    conn: &Connection,
    tenant_id: Option<TenantId>,
    role: RoleName,
    email: &str,
) -> UserId {
    let repo = SqliteUserRepository::new(conn);
    let role_id = repo.ensure_role(role, None).unwrap();
    let hash = hash_password_with_iterations(TEST_PASSWORD, 1_000);
    repo.create_user(&User::new(tenant_id, role_id, email, hash, "Awa", "Diop"))
        .unwrap()
}

pub fn create_patient(conn: &Connection, tenant_id: TenantId, number: &str) -> PatientId {
    let patient = Patient::new(
        tenant_id,
        number,
        format!("NID-{number}"),
        "Aminata",
        "Fall",
        "1990-04-12",
        Gender::Female,
    );
    SqlitePatientRepository::new(conn)
        .create_patient(&patient)
        .unwrap()
}

/// Creates the taxonomy chain plus a doctor bound to a fresh user.
pub fn create_personnel(conn: &Connection, tenant_id: TenantId, email: &str) -> PersonnelId {
    let taxonomy = SqliteTaxonomyRepository::new(conn);
    let category_id = match taxonomy.find_category("medical").unwrap() {
        Some(category) => category.id,
        None => taxonomy
            .create_category(&PersonnelCategory::new("medical", "Medical Staff", 0))
            .unwrap(),
    };
    let subcategory_id = match taxonomy.find_subcategory(category_id, "general").unwrap() {
        Some(subcategory) => subcategory.id,
        None => taxonomy
            .create_subcategory(&PersonnelSubcategory::new(
                category_id,
                "general",
                "General Medicine",
                0,
            ))
            .unwrap(),
    };
    let type_id = match taxonomy
        .list_personnel_types(subcategory_id, true)
        .unwrap()
        .first()
    {
        Some(personnel_type) => personnel_type.id,
        None => taxonomy
            .create_personnel_type(&PersonnelType::new(
                subcategory_id,
                "gp",
                "General Practitioner",
                1,
                0,
            ))
            .unwrap(),
    };

    let user_id = create_user(conn, Some(tenant_id), RoleName::Doctor, email);
    SqlitePersonnelRepository::new(conn)
        .create_personnel(&Personnel {
            id: 0,
            tenant_id,
            user_id,
            personnel_type_id: type_id,
            license_number: Some("SN-MED-001".to_string()),
            is_active: true,
        })
        .unwrap()
}
