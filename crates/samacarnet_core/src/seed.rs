//! Demo dataset bootstrap.
//!
//! # Responsibility
//! - Populate a fresh database with one runnable demo tenant.
//! - Exercise the same repositories and services production code uses,
//!   so visits carry a real audit trail.
//!
//! # Invariants
//! - Records are attempted one at a time; a failure is logged with `warn!`
//!   and the run continues.
//! - Records that already exist are reported as failures and reused by
//!   later steps, so re-running never aborts.
//! - Events carry step names and row ids only.

use crate::model::medical_history::{MedicalHistory, MedicalHistoryType, Severity};
use crate::model::patient::{
    format_patient_number, BloodType, EmergencyContact, Gender, Medication, Patient, PatientId,
};
use crate::model::personnel::{
    CategoryId, Personnel, PersonnelCategory, PersonnelId, PersonnelSubcategory, PersonnelType,
    PersonnelTypeId, SubcategoryId,
};
use crate::model::super_admin::SuperAdmin;
use crate::model::tenant::{SubscriptionPlan, Tenant, TenantId};
use crate::model::user::{RoleId, RoleName, User, UserId};
use crate::model::visit::Visit;
use crate::password::{hash_password_with_iterations, PBKDF2_ITERATIONS};
use crate::repo::medical_history_repo::{MedicalHistoryRepository, SqliteMedicalHistoryRepository};
use crate::repo::patient_repo::{PatientRepository, SqlitePatientRepository};
use crate::repo::personnel_repo::{PersonnelRepository, SqlitePersonnelRepository};
use crate::repo::qr_code_repo::{QrCodeRepository, SqliteQrCodeRepository};
use crate::repo::super_admin_repo::{SqliteSuperAdminRepository, SuperAdminRepository};
use crate::repo::taxonomy_repo::{SqliteTaxonomyRepository, TaxonomyRepository};
use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
use crate::repo::user_repo::{RoleRepository, SqliteUserRepository, UserRepository};
use crate::repo::visit_repo::{SqliteVisitRepository, VisitRepository};
use crate::repo::RepoError;
use crate::service::qr_code_service::QrCodeService;
use crate::service::visit_service::{TransitionContext, VisitService};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEMO_TENANT_SLUG: &str = "hopital-principal-dakar";
pub const DEMO_PASSWORD: &str = "SamaCarnet2024!";
pub const DEMO_ADMIN_EMAIL: &str = "admin@samacarnet.sn";
pub const DEMO_DOCTOR_EMAIL: &str = "dr.diop@samacarnet.sn";
pub const DEMO_SUPER_ADMIN_EMAIL: &str = "superadmin@samacarnet.sn";

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Outcome counters of one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub attempted: usize,
    pub inserted: usize,
    pub failed: usize,
}

/// Tunables for a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// PBKDF2 cost for demo user passwords.
    pub password_iterations: u32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            password_iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// A record every later step depends on could be neither created nor found.
#[derive(Debug)]
pub enum SeedError {
    MissingPrerequisite(&'static str),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrerequisite(what) => {
                write!(f, "seeding stopped: {what} is unavailable")
            }
        }
    }
}

impl Error for SeedError {}

/// Seeds the demo dataset with default options.
pub fn seed_demo_data(conn: &Connection) -> Result<SeedReport, SeedError> {
    seed_demo_data_with(conn, SeedOptions::default())
}

pub fn seed_demo_data_with(
    conn: &Connection,
    options: SeedOptions,
) -> Result<SeedReport, SeedError> {
    info!("event=seed_run module=seed status=start");
    let mut seeder = Seeder {
        conn,
        options,
        report: SeedReport::default(),
    };

    let roles = seeder.seed_roles();
    let types = seeder.seed_taxonomy();
    let tenant_id = seeder
        .seed_tenant()
        .ok_or(SeedError::MissingPrerequisite("demo tenant"))?;

    let admin_role = roles.get(RoleName::Admin);
    let doctor_role = roles.get(RoleName::Doctor);
    let admin_user = admin_role.and_then(|role_id| {
        seeder.seed_user(
            Some(tenant_id),
            role_id,
            DEMO_ADMIN_EMAIL,
            ("Awa", "Ndiaye"),
        )
    });
    let doctor_user = doctor_role.and_then(|role_id| {
        seeder.seed_user(
            Some(tenant_id),
            role_id,
            DEMO_DOCTOR_EMAIL,
            ("Moussa", "Diop"),
        )
    });

    let doctor = match (doctor_user, types.general_practitioner) {
        (Some(user_id), Some(type_id)) => seeder.seed_personnel(tenant_id, user_id, type_id),
        _ => None,
    };
    if let (Some(user_id), Some(type_id)) = (admin_user, types.receptionist) {
        seeder.seed_personnel(tenant_id, user_id, type_id);
    }

    let patients = seeder.seed_patients(tenant_id);
    seeder.seed_medical_histories(&patients);
    if let Some(doctor) = doctor {
        seeder.seed_visits(tenant_id, doctor, &patients);
    } else {
        warn!("event=seed_step module=seed status=error step=visits reason=no_personnel");
    }

    if let Some(role_id) = roles.get(RoleName::SuperAdmin) {
        if let Some(user_id) =
            seeder.seed_user(None, role_id, DEMO_SUPER_ADMIN_EMAIL, ("Fatou", "Sarr"))
        {
            seeder.seed_super_admin(user_id);
        }
    }
    seeder.seed_qr_codes(&patients);

    let report = seeder.report;
    info!(
        "event=seed_run module=seed status=ok attempted={} inserted={} failed={}",
        report.attempted, report.inserted, report.failed
    );
    Ok(report)
}

#[derive(Default)]
struct SeededRoles(Vec<(RoleName, RoleId)>);

impl SeededRoles {
    fn get(&self, name: RoleName) -> Option<RoleId> {
        self.0
            .iter()
            .find(|(role, _)| *role == name)
            .map(|(_, id)| *id)
    }
}

#[derive(Default)]
struct SeededTypes {
    general_practitioner: Option<PersonnelTypeId>,
    receptionist: Option<PersonnelTypeId>,
}

struct TypeSeed {
    name: &'static str,
    display_name: &'static str,
    level: i64,
}

struct SubcategorySeed {
    name: &'static str,
    display_name: &'static str,
    types: &'static [TypeSeed],
}

struct CategorySeed {
    name: &'static str,
    display_name: &'static str,
    subcategories: &'static [SubcategorySeed],
}

const TAXONOMY: &[CategorySeed] = &[
    CategorySeed {
        name: "medical",
        display_name: "Medical Staff",
        subcategories: &[
            SubcategorySeed {
                name: "general_medicine",
                display_name: "General Medicine",
                types: &[
                    TypeSeed {
                        name: "general_practitioner",
                        display_name: "General Practitioner",
                        level: 1,
                    },
                    TypeSeed {
                        name: "chief_physician",
                        display_name: "Chief Physician",
                        level: 2,
                    },
                ],
            },
            SubcategorySeed {
                name: "pediatrics",
                display_name: "Pediatrics",
                types: &[TypeSeed {
                    name: "pediatrician",
                    display_name: "Pediatrician",
                    level: 1,
                }],
            },
        ],
    },
    CategorySeed {
        name: "paramedical",
        display_name: "Paramedical Staff",
        subcategories: &[
            SubcategorySeed {
                name: "nursing",
                display_name: "Nursing",
                types: &[
                    TypeSeed {
                        name: "nurse",
                        display_name: "Nurse",
                        level: 1,
                    },
                    TypeSeed {
                        name: "head_nurse",
                        display_name: "Head Nurse",
                        level: 2,
                    },
                ],
            },
            SubcategorySeed {
                name: "laboratory",
                display_name: "Laboratory",
                types: &[TypeSeed {
                    name: "lab_technician",
                    display_name: "Lab Technician",
                    level: 1,
                }],
            },
        ],
    },
    CategorySeed {
        name: "administrative",
        display_name: "Administrative Staff",
        subcategories: &[SubcategorySeed {
            name: "reception",
            display_name: "Reception",
            types: &[TypeSeed {
                name: "receptionist",
                display_name: "Receptionist",
                level: 1,
            }],
        }],
    },
];

struct PatientSeed {
    national_id: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    date_of_birth: &'static str,
    gender: Gender,
    blood_type: BloodType,
    allergies: &'static [&'static str],
}

const PATIENTS: &[PatientSeed] = &[
    PatientSeed {
        national_id: "1751199000123",
        first_name: "Aminata",
        last_name: "Fall",
        date_of_birth: "1990-04-12",
        gender: Gender::Female,
        blood_type: BloodType::OPositive,
        allergies: &["penicillin"],
    },
    PatientSeed {
        national_id: "1851985000456",
        first_name: "Ibrahima",
        last_name: "Sow",
        date_of_birth: "1985-11-03",
        gender: Gender::Male,
        blood_type: BloodType::APositive,
        allergies: &[],
    },
    PatientSeed {
        national_id: "2012015000789",
        first_name: "Khady",
        last_name: "Ba",
        date_of_birth: "2015-07-21",
        gender: Gender::Female,
        blood_type: BloodType::BNegative,
        allergies: &["peanuts", "dust"],
    },
];

struct Seeder<'conn> {
    conn: &'conn Connection,
    options: SeedOptions,
    report: SeedReport,
}

impl Seeder<'_> {
    /// Attempts one record: reuse an existing row (counted as failed),
    /// otherwise insert it.
    fn record<F, I>(&mut self, step: &'static str, find: F, insert: I) -> Option<i64>
    where
        F: FnOnce() -> Result<Option<i64>, RepoError>,
        I: FnOnce() -> Result<i64, RepoError>,
    {
        self.report.attempted += 1;
        match find() {
            Ok(Some(id)) => {
                self.report.failed += 1;
                warn!(
                    "event=seed_step module=seed status=error step={step} reason=already_exists id={id}"
                );
                return Some(id);
            }
            Ok(None) => {}
            Err(err) => {
                self.report.failed += 1;
                warn!("event=seed_step module=seed status=error step={step} error={err}");
                return None;
            }
        }
        match insert() {
            Ok(id) => {
                self.report.inserted += 1;
                info!("event=seed_step module=seed status=ok step={step} id={id}");
                Some(id)
            }
            Err(err) => {
                self.report.failed += 1;
                warn!("event=seed_step module=seed status=error step={step} error={err}");
                None
            }
        }
    }

    fn seed_roles(&mut self) -> SeededRoles {
        let conn = self.conn;
        let mut roles = SeededRoles::default();
        for role in RoleName::ALL {
            let repo = SqliteUserRepository::new(conn);
            let id = self.record(
                "role",
                || Ok(repo.find_role(*role)?.map(|found| found.id)),
                || repo.ensure_role(*role, None),
            );
            if let Some(id) = id {
                roles.0.push((*role, id));
            }
        }
        roles
    }

    fn seed_taxonomy(&mut self) -> SeededTypes {
        let repo = SqliteTaxonomyRepository::new(self.conn);
        let mut seeded = SeededTypes::default();
        for (category_order, category) in (0_i64..).zip(TAXONOMY) {
            let Some(category_id) = self.seed_category(&repo, category, category_order) else {
                continue;
            };
            for (sub_order, subcategory) in (0_i64..).zip(category.subcategories) {
                let Some(subcategory_id) =
                    self.seed_subcategory(&repo, category_id, subcategory, sub_order)
                else {
                    continue;
                };
                for (type_order, personnel_type) in (0_i64..).zip(subcategory.types) {
                    let id = self.record(
                        "personnel_type",
                        || {
                            Ok(repo
                                .list_personnel_types(subcategory_id, true)?
                                .into_iter()
                                .find(|found| found.name == personnel_type.name)
                                .map(|found| found.id))
                        },
                        || {
                            repo.create_personnel_type(&PersonnelType::new(
                                subcategory_id,
                                personnel_type.name,
                                personnel_type.display_name,
                                personnel_type.level,
                                type_order,
                            ))
                        },
                    );
                    match personnel_type.name {
                        "general_practitioner" => seeded.general_practitioner = id,
                        "receptionist" => seeded.receptionist = id,
                        _ => {}
                    }
                }
            }
        }
        seeded
    }

    fn seed_category(
        &mut self,
        repo: &SqliteTaxonomyRepository<'_>,
        category: &CategorySeed,
        sort_order: i64,
    ) -> Option<CategoryId> {
        self.record(
            "personnel_category",
            || Ok(repo.find_category(category.name)?.map(|found| found.id)),
            || {
                repo.create_category(&PersonnelCategory::new(
                    category.name,
                    category.display_name,
                    sort_order,
                ))
            },
        )
    }

    fn seed_subcategory(
        &mut self,
        repo: &SqliteTaxonomyRepository<'_>,
        category_id: CategoryId,
        subcategory: &SubcategorySeed,
        sort_order: i64,
    ) -> Option<SubcategoryId> {
        self.record(
            "personnel_subcategory",
            || {
                Ok(repo
                    .find_subcategory(category_id, subcategory.name)?
                    .map(|found| found.id))
            },
            || {
                repo.create_subcategory(&PersonnelSubcategory::new(
                    category_id,
                    subcategory.name,
                    subcategory.display_name,
                    sort_order,
                ))
            },
        )
    }

    fn seed_tenant(&mut self) -> Option<TenantId> {
        let repo = SqliteTenantRepository::new(self.conn);
        self.record(
            "tenant",
            || Ok(repo.find_by_slug(DEMO_TENANT_SLUG)?.map(|found| found.id)),
            || {
                let mut tenant = Tenant::new("Hôpital Principal de Dakar", DEMO_TENANT_SLUG);
                tenant.subscription_plan = SubscriptionPlan::Premium;
                repo.create_tenant(&tenant)
            },
        )
    }

    fn seed_user(
        &mut self,
        tenant_id: Option<TenantId>,
        role_id: RoleId,
        email: &str,
        (first_name, last_name): (&str, &str),
    ) -> Option<UserId> {
        let repo = SqliteUserRepository::new(self.conn);
        let iterations = self.options.password_iterations;
        self.record(
            "user",
            || Ok(repo.find_by_email(tenant_id, email)?.map(|found| found.id)),
            || {
                repo.create_user(&User::new(
                    tenant_id,
                    role_id,
                    email,
                    hash_password_with_iterations(DEMO_PASSWORD, iterations),
                    first_name,
                    last_name,
                ))
            },
        )
    }

    fn seed_personnel(
        &mut self,
        tenant_id: TenantId,
        user_id: UserId,
        personnel_type_id: PersonnelTypeId,
    ) -> Option<PersonnelId> {
        let repo = SqlitePersonnelRepository::new(self.conn);
        self.record(
            "personnel",
            || Ok(repo.find_by_user(user_id)?.map(|found| found.id)),
            || {
                repo.create_personnel(&Personnel {
                    id: 0,
                    tenant_id,
                    user_id,
                    personnel_type_id,
                    license_number: None,
                    is_active: true,
                })
            },
        )
    }

    fn seed_patients(&mut self, tenant_id: TenantId) -> Vec<PatientId> {
        let repo = SqlitePatientRepository::new(self.conn);
        let mut ids = Vec::new();
        for (sequence, seed) in (1_i64..).zip(PATIENTS) {
            let number = format_patient_number(tenant_id, sequence);
            let id = self.record(
                "patient",
                || Ok(repo.find_by_number(tenant_id, &number)?.map(|found| found.id)),
                || {
                    let mut patient = Patient::new(
                        tenant_id,
                        number.as_str(),
                        seed.national_id,
                        seed.first_name,
                        seed.last_name,
                        seed.date_of_birth,
                        seed.gender,
                    );
                    patient.blood_type = Some(seed.blood_type);
                    patient.allergies = seed.allergies.iter().map(|a| a.to_string()).collect();
                    if sequence == 1 {
                        patient.medications = vec![Medication {
                            name: "Amlodipine".to_string(),
                            dosage: Some("5 mg".to_string()),
                            frequency: Some("daily".to_string()),
                        }];
                        patient.emergency_contact = Some(EmergencyContact {
                            name: "Mamadou Fall".to_string(),
                            phone: "+221770000001".to_string(),
                            relationship: Some("brother".to_string()),
                        });
                    }
                    repo.create_patient(&patient)
                },
            );
            ids.extend(id);
        }
        ids
    }

    fn seed_medical_histories(&mut self, patients: &[PatientId]) {
        let repo = SqliteMedicalHistoryRepository::new(self.conn);
        let entries: [(MedicalHistoryType, &str, &str, Option<Severity>); 3] = [
            (
                MedicalHistoryType::Condition,
                "Hypertension",
                "2019-03-10",
                Some(Severity::Medium),
            ),
            (
                MedicalHistoryType::Allergy,
                "Penicillin allergy",
                "2012-06-01",
                Some(Severity::High),
            ),
            (
                MedicalHistoryType::FamilyHistory,
                "Diabetes (mother)",
                "2020-01-15",
                None,
            ),
        ];
        let Some(&patient_id) = patients.first() else {
            return;
        };
        for (kind, title, date_recorded, severity) in entries {
            self.record(
                "medical_history",
                || {
                    Ok(repo
                        .list_for_patient(patient_id, Some(kind), true)?
                        .into_iter()
                        .find(|found| found.title == title)
                        .map(|found| found.id))
                },
                || {
                    let mut entry = MedicalHistory::new(patient_id, kind, title, date_recorded);
                    entry.severity = severity;
                    repo.create_entry(&entry)
                },
            );
        }
    }

    fn seed_visits(&mut self, tenant_id: TenantId, doctor: PersonnelId, patients: &[PatientId]) {
        let conn = self.conn;
        let visits = SqliteVisitRepository::new(conn);
        let service = VisitService::new(conn);
        let base = crate::now_epoch_ms();

        for (index, &patient_id) in (0_i64..).zip(patients) {
            self.record(
                "visit",
                || {
                    Ok(visits
                        .list_for_patient(patient_id, None)?
                        .first()
                        .map(|found| found.id))
                },
                || {
                    let scheduled_at = base + (index + 1) * DAY_MS;
                    let mut draft = Visit::new(tenant_id, patient_id, doctor, scheduled_at);
                    draft.reason = Some("Routine consultation".to_string());
                    let ctx = TransitionContext::at(doctor, base);
                    let visit = service
                        .schedule_visit(&draft, ctx)
                        .map_err(visit_error)?;
                    let later = TransitionContext::at(doctor, base + HOUR_MS);
                    match index {
                        0 => service
                            .complete_visit(visit.id, Some("Blood pressure stable"), later)
                            .map_err(visit_error)?,
                        1 => service
                            .reschedule_visit(
                                visit.id,
                                scheduled_at + DAY_MS,
                                Some("Doctor unavailable"),
                                later,
                            )
                            .map_err(visit_error)?,
                        _ => service
                            .cancel_visit(visit.id, "Patient request", later)
                            .map_err(visit_error)?,
                    };
                    Ok(visit.id)
                },
            );
        }
    }

    fn seed_super_admin(&mut self, user_id: UserId) {
        let repo = SqliteSuperAdminRepository::new(self.conn);
        self.record(
            "super_admin",
            || Ok(repo.find_by_user(user_id)?.map(|found| found.id)),
            || repo.create_super_admin(&SuperAdmin::new(user_id)),
        );
    }

    fn seed_qr_codes(&mut self, patients: &[PatientId]) {
        let conn = self.conn;
        let repo = SqliteQrCodeRepository::new(conn);
        let service = QrCodeService::new(conn);
        for &patient_id in patients {
            self.record(
                "qr_code",
                || {
                    Ok(repo
                        .list_for_patient(patient_id)?
                        .first()
                        .map(|found| found.id))
                },
                || {
                    service
                        .issue(patient_id, Some(Duration::from_secs(365 * 24 * 60 * 60)))
                        .map(|qr_code| qr_code.id)
                        .map_err(|err| RepoError::InvalidData(err.to_string()))
                },
            );
        }
    }
}

fn visit_error(err: crate::service::visit_service::VisitServiceError) -> RepoError {
    match err {
        crate::service::visit_service::VisitServiceError::Repo(inner) => inner,
        other => RepoError::InvalidData(other.to_string()),
    }
}
