//! Saved plans and the active plan record on an on-disk database.

use flexworkout_core::plan::{default_plan, Plan, Section, Step};
use flexworkout_core::{Database, PlanStore};

fn tiny_plan(name: &str) -> Plan {
    Plan::new(vec![Section {
        name: name.into(),
        tips: String::new(),
        allow_rounds: false,
        default_rounds: 1,
        max_rounds: 1,
        steps: vec![Step::new("Hold", "", 10)],
    }])
}

#[test]
fn test_saved_plans_survive_reopen_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flexworkout.db");

    let (first, second) = {
        let db = Database::open_at(&path).unwrap();
        let first = db.save_plan("Morning", &tiny_plan("A")).unwrap();
        let second = db.save_plan("Evening", &tiny_plan("B")).unwrap();
        (first, second)
    };
    assert_ne!(first.id, second.id);

    let db = Database::open_at(&path).unwrap();
    let plans = db.list_saved_plans().unwrap();
    let ids: Vec<_> = plans.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    assert_eq!(plans[1].data, tiny_plan("A"));
    assert_eq!(db.get_saved_plan(&first.id).unwrap(), Some(first));
}

#[test]
fn test_active_plan_record_lifecycle() {
    let db = Database::open_memory().unwrap();
    assert_eq!(db.load_active_plan().unwrap(), None);

    let saved = db.save_plan("Full", &default_plan()).unwrap();
    db.save_active_plan(&saved.data, Some(&saved.id)).unwrap();
    let record = db.load_active_plan().unwrap().unwrap();
    assert_eq!(record.id.as_deref(), Some(saved.id.as_str()));
    assert_eq!(record.plan, default_plan());

    // Deleting the saved plan leaves a dangling id, which reads back as none.
    db.delete_plan(&saved.id).unwrap();
    let record = db.load_active_plan().unwrap().unwrap();
    assert_eq!(record.id, None);
    assert_eq!(record.plan, default_plan());

    db.save_active_plan(&tiny_plan("X"), None).unwrap();
    assert_eq!(db.load_active_plan().unwrap().unwrap().plan, tiny_plan("X"));

    db.clear_active_plan().unwrap();
    db.clear_active_plan().unwrap();
    assert_eq!(db.load_active_plan().unwrap(), None);
}

#[test]
fn test_delete_is_idempotent() {
    let db = Database::open_memory().unwrap();
    let keep = db.save_plan("Keep", &tiny_plan("K")).unwrap();
    let gone = db.save_plan("Gone", &tiny_plan("G")).unwrap();

    db.delete_plan(&gone.id).unwrap();
    db.delete_plan(&gone.id).unwrap();
    db.delete_plan("missing").unwrap();

    let ids: Vec<_> = db.list_saved_plans().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![keep.id]);
    assert_eq!(db.get_saved_plan(&gone.id).unwrap(), None);
}
