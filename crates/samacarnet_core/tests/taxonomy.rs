use samacarnet_core::db::open_db_in_memory;
use samacarnet_core::model::personnel::{
    CategoryId, PersonnelCategory, PersonnelSubcategory, PersonnelType,
};
use samacarnet_core::repo::taxonomy_repo::{SqliteTaxonomyRepository, TaxonomyRepository};
use samacarnet_core::{TaxonomyError, TaxonomyService};

fn add_subcategory(
    repo: &SqliteTaxonomyRepository<'_>,
    category_id: CategoryId,
    name: &str,
    display_name: &str,
    sort_order: i64,
) -> i64 {
    repo.create_subcategory(&PersonnelSubcategory::new(
        category_id,
        name,
        display_name,
        sort_order,
    ))
    .unwrap()
}

#[test]
fn active_subcategories_are_filtered_and_ordered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::new(&conn);
    let medical = repo
        .create_category(&PersonnelCategory::new("medical", "Medical Staff", 0))
        .unwrap();
    let other = repo
        .create_category(&PersonnelCategory::new("admin", "Administrative Staff", 1))
        .unwrap();

    let surgery = add_subcategory(&repo, medical, "surgery", "Surgery", 2);
    let general = add_subcategory(&repo, medical, "general", "General Medicine", 1);
    let pediatrics = add_subcategory(&repo, medical, "pediatrics", "Pediatrics", 2);
    let retired = add_subcategory(&repo, medical, "retired", "Retired", 0);
    add_subcategory(&repo, other, "reception", "Reception", 0);
    repo.set_subcategory_active(retired, false).unwrap();

    let service = TaxonomyService::new(SqliteTaxonomyRepository::new(&conn));
    let listed = service.list_active_subcategories(medical).unwrap();

    let ids: Vec<_> = listed.iter().map(|sub| sub.id).collect();
    assert_eq!(ids, vec![general, surgery, pediatrics]);
    assert!(listed.iter().all(|sub| sub.is_active && sub.category_id == medical));
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].sort_order <= pair[1].sort_order));
}

#[test]
fn unknown_category_lists_no_subcategories() {
    let conn = open_db_in_memory().unwrap();
    let service = TaxonomyService::new(SqliteTaxonomyRepository::new(&conn));

    assert!(service.list_active_subcategories(404).unwrap().is_empty());
}

#[test]
fn personnel_types_order_by_level_then_sort_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::new(&conn);
    let category = repo
        .create_category(&PersonnelCategory::new("paramedical", "Paramedical Staff", 0))
        .unwrap();
    let nursing = add_subcategory(&repo, category, "nursing", "Nursing", 0);

    let head = repo
        .create_personnel_type(&PersonnelType::new(nursing, "head_nurse", "Head Nurse", 2, 0))
        .unwrap();
    let aide = repo
        .create_personnel_type(&PersonnelType::new(nursing, "aide", "Nursing Aide", 1, 5))
        .unwrap();
    let nurse = repo
        .create_personnel_type(&PersonnelType::new(nursing, "nurse", "Nurse", 1, 1))
        .unwrap();

    let service = TaxonomyService::new(SqliteTaxonomyRepository::new(&conn));
    let ids: Vec<_> = service
        .list_personnel_types(nursing)
        .unwrap()
        .into_iter()
        .map(|personnel_type| personnel_type.id)
        .collect();
    assert_eq!(ids, vec![nurse, aide, head]);
}

#[test]
fn full_path_joins_display_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::new(&conn);
    let category = repo
        .create_category(&PersonnelCategory::new("medical", "Medical Staff", 0))
        .unwrap();
    let sub = add_subcategory(&repo, category, "cardiology", "Cardiology", 0);

    let service = TaxonomyService::new(repo);
    assert_eq!(service.full_path(sub).unwrap(), "Medical Staff > Cardiology");
}

#[test]
fn full_path_of_missing_subcategory_is_an_error() {
    let conn = open_db_in_memory().unwrap();
    let service = TaxonomyService::new(SqliteTaxonomyRepository::new(&conn));

    let err = service.full_path(99).unwrap_err();
    assert!(matches!(err, TaxonomyError::SubcategoryNotFound(99)));
}

#[test]
fn subcategory_names_are_unique_per_category() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::new(&conn);
    let first = repo
        .create_category(&PersonnelCategory::new("medical", "Medical Staff", 0))
        .unwrap();
    let second = repo
        .create_category(&PersonnelCategory::new("paramedical", "Paramedical Staff", 1))
        .unwrap();

    add_subcategory(&repo, first, "general", "General", 0);
    add_subcategory(&repo, second, "general", "General", 0);
    let err = repo
        .create_subcategory(&PersonnelSubcategory::new(first, "general", "General", 1))
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn tree_nests_only_active_nodes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaxonomyRepository::new(&conn);
    let category = repo
        .create_category(&PersonnelCategory::new("medical", "Medical Staff", 0))
        .unwrap();
    let general = add_subcategory(&repo, category, "general", "General Medicine", 0);
    let hidden = add_subcategory(&repo, category, "hidden", "Hidden", 1);
    repo.set_subcategory_active(hidden, false).unwrap();
    repo.create_personnel_type(&PersonnelType::new(general, "gp", "GP", 1, 0))
        .unwrap();

    let tree = TaxonomyService::new(repo).tree().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].subcategories.len(), 1);
    assert_eq!(tree[0].subcategories[0].subcategory.id, general);
    assert_eq!(tree[0].subcategories[0].personnel_types.len(), 1);
}
