//! Integration tests for environments and transactions.

mod common;

use modelkit_core::proto::{Condition, Value};
use modelkit_core::{Context, Error, TransactionStatus};

#[test]
fn test_with_context_never_touches_source() {
    let env = common::env();
    let derived = env.with_context("key", "value");

    assert_eq!(derived.context().get("key"), Some(&Value::Text("value".into())));
    assert!(!env.context().has_key("key"));

    let chained = derived.with_context("other", 1);
    assert!(!derived.context().has_key("other"));
    assert_eq!(chained.context().len(), 2);
}

#[test]
fn test_with_new_context_replaces_context() {
    let env = common::env().with_context("key", "value");
    let replaced = env.with_new_context(Context::new().with_key("fresh", true));
    assert!(!replaced.context().has_key("key"));
    assert!(replaced.context().has_key("fresh"));
    assert!(env.context().has_key("key"));
}

#[test]
fn test_sudo_identity() {
    let env = common::env();
    assert_eq!(env.uid(), 2);

    let other = env.sudo_as(5);
    assert_eq!(other.uid(), 5);
    assert_eq!(env.uid(), 2);

    let users = env.pool("User").unwrap();
    assert_eq!(users.sudo_as(2).env().uid(), 2);
    assert_eq!(users.sudo_as(2).sudo().env().uid(), 1);
    assert_eq!(users.env().uid(), 2);
}

#[test]
fn test_derived_environments_share_writes() {
    let env = common::env();
    let blog = common::seed(&env);

    let admin = env.sudo();
    blog.jane.with_env(admin.clone()).set("Age", 25).unwrap();

    let age = blog.jane.get("Age").unwrap();
    assert_eq!(age.as_value(), Some(&Value::Integer(25)));
    assert!(admin.shares_transaction(&env));
}

#[test]
fn test_with_env_moves_collection_across_identities() {
    let env = common::env();
    let blog = common::seed(&env);
    let fresh = env.in_new_transaction();

    let moved = blog.jane.with_env(fresh.clone());
    assert_eq!(moved.ids().unwrap(), blog.jane.ids().unwrap());
    assert!(moved.env().shares_transaction(&fresh));
    // The new transaction does not see uncommitted records.
    assert!(matches!(moved.get("Name"), Err(Error::Transaction(_))));
}

#[test]
fn test_commit_makes_records_visible_to_new_transactions() {
    let db = common::database();
    let env = db.environment(2);
    common::seed(&env);
    env.commit().unwrap();
    assert_eq!(env.transaction().status(), TransactionStatus::Committed);

    let later = db.environment(2);
    let users = later.pool("User").unwrap().search(Condition::like("Name", "%Smith"));
    assert_eq!(users.len().unwrap(), 2);
}

#[test]
fn test_rollback_is_idempotent_and_final() {
    let db = common::database();
    let env = db.environment(2);
    common::seed(&env);

    env.rollback().unwrap();
    env.rollback().unwrap();
    env.commit().unwrap();
    assert_eq!(env.transaction().status(), TransactionStatus::RolledBack);

    let users = env.pool("User").unwrap();
    let result = users.create([("Name", "late")]);
    assert!(matches!(result, Err(Error::Transaction(_))));
    assert!(result.err().unwrap().is_execution_failure());

    let later = db.environment(2);
    assert!(later.pool("User").unwrap().search_all().is_empty().unwrap());
}

#[test]
fn test_simulate_discards_work() {
    let db = common::database();
    let count = db
        .simulate(2, |env| {
            common::seed(env);
            env.pool("User")?.search_all().len()
        })
        .unwrap();
    assert_eq!(count, 2);
    assert!(db
        .environment(2)
        .pool("User")
        .unwrap()
        .search_all()
        .is_empty()
        .unwrap());
}
