use anyhow::Result;
use ludoteca::{CognitiveCategory, CognitiveFunction, Game, Store};

#[test]
fn setup_twice_is_idempotent() -> Result<()> {
    let mut store = Store::open_in_memory()?;
    store.setup()?;
    store.setup()?;

    // All three tables are usable afterwards.
    store.add_category(&CognitiveCategory::new("Memory"))?;
    store.add_function(&CognitiveFunction::new("Attention"))?;
    store.add_game(&Game::new("Probe"))?;
    Ok(())
}

#[test]
fn reopening_a_file_store_is_a_no_op_and_keeps_data() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("catalog.sqlite3");

    let mut store = Store::open(&path)?;
    store.add_category(&CognitiveCategory::new("Memory"))?;
    store.close()?;

    // Second open re-runs schema initialization against existing tables.
    let store = Store::open(&path)?;
    let found = store.category_by_name("Memory")?;
    assert_eq!(found.name, "Memory");
    assert!(found.id.is_some());
    store.close()?;
    Ok(())
}

#[test]
fn open_creates_missing_parent_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("deeper").join("catalog.sqlite3");
    let store = Store::open(&path)?;
    store.close()?;
    assert!(path.exists());
    Ok(())
}
