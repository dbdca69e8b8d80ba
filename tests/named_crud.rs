use anyhow::Result;
use ludoteca::{CognitiveCategory, CognitiveFunction, Store, StoreError};

fn store() -> Store {
    Store::open_in_memory().expect("open in-memory store")
}

#[test]
fn add_and_get_category() -> Result<()> {
    let mut store = store();
    let created = store.add_category(&CognitiveCategory::new("Memory"))?;
    assert!(created.id.is_some());

    let by_name = store.category_by_name("Memory")?;
    assert_eq!(by_name, created);

    let by_id = store.category_by_id(created.id.unwrap())?;
    assert_eq!(by_id.name, "Memory");
    Ok(())
}

#[test]
fn duplicate_name_fails_second_insert() -> Result<()> {
    let mut store = store();
    store.add_category(&CognitiveCategory::new("Memory"))?;
    let err = store
        .add_category(&CognitiveCategory::new("Memory"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { .. }));
    Ok(())
}

#[test]
fn names_differing_in_case_are_distinct() -> Result<()> {
    let mut store = store();
    store.add_category(&CognitiveCategory::new("Memory"))?;
    store.add_category(&CognitiveCategory::new("memory"))?;
    assert_eq!(store.categories()?.len(), 2);
    Ok(())
}

#[test]
fn empty_name_is_rejected() -> Result<()> {
    let mut store = store();
    let err = store
        .add_category(&CognitiveCategory::new("   "))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    Ok(())
}

#[test]
fn update_renames_in_place() -> Result<()> {
    let mut store = store();
    let mut category = store.add_category(&CognitiveCategory::new("Memory"))?;
    category.name = "Working Memory".to_string();
    store.update_category(&category)?;

    assert_eq!(
        store.category_by_id(category.id.unwrap())?.name,
        "Working Memory"
    );
    let err = store.category_by_name("Memory").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[test]
fn update_requires_positive_id() -> Result<()> {
    let mut store = store();
    let err = store
        .update_category(&CognitiveCategory::new("Memory"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store
        .update_category(&CognitiveCategory {
            id: Some(0),
            name: "Memory".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    Ok(())
}

#[test]
fn update_of_missing_row_is_not_found() -> Result<()> {
    let mut store = store();
    let err = store
        .update_category(&CognitiveCategory {
            id: Some(99),
            name: "Memory".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[test]
fn delete_requires_positive_id_and_existing_row() -> Result<()> {
    let mut store = store();
    let err = store.delete_category(-1).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = store.delete_category(99).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[test]
fn lookup_misses_are_not_found() -> Result<()> {
    let store = store();
    let err = store.category_by_id(999).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    let err = store.function_by_name("Attention").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}

#[test]
fn search_is_substring_and_never_raises() -> Result<()> {
    let mut store = store();
    store.add_function(&CognitiveFunction::new("Attention"))?;
    store.add_function(&CognitiveFunction::new("Sustained Attention"))?;
    store.add_function(&CognitiveFunction::new("Planning"))?;

    let hits = store.search_functions("Attention")?;
    assert_eq!(hits.len(), 2);

    let none = store.search_functions("Nonexistent")?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn listing_keeps_insertion_order() -> Result<()> {
    let mut store = store();
    store.add_category(&CognitiveCategory::new("Memory"))?;
    store.add_category(&CognitiveCategory::new("Language"))?;
    store.add_category(&CognitiveCategory::new("Attention"))?;

    let names: Vec<String> = store.categories()?.into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Memory", "Language", "Attention"]);
    Ok(())
}

#[test]
fn functions_mirror_category_behavior() -> Result<()> {
    let mut store = store();
    let mut function = store.add_function(&CognitiveFunction::new("Attention"))?;
    let err = store
        .add_function(&CognitiveFunction::new("Attention"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { .. }));

    function.name = "Updated Attention".to_string();
    store.update_function(&function)?;
    assert_eq!(
        store.function_by_name("Updated Attention")?.id,
        function.id
    );

    store.delete_function(function.id.unwrap())?;
    let err = store.function_by_id(function.id.unwrap()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    Ok(())
}
