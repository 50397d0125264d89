//! Integration tests for record collections.

mod common;

use std::collections::BTreeMap;

use modelkit_core::proto::{Condition, Value};
use modelkit_core::{Error, FieldType, FieldValue};

#[test]
fn test_set_algebra() {
    let env = common::env();
    let blog = common::seed(&env);
    let a = blog.jane.clone();
    let b = blog.will.union(&blog.jane).unwrap();

    let left = a.union(&b).unwrap().subtract(&a).unwrap();
    let right = b.subtract(&a).unwrap();
    assert!(left.equals(&right).unwrap());
    assert!(right.equals(&blog.will).unwrap());

    assert!(a.intersect(&b).unwrap().equals(&a).unwrap());
    assert_eq!(a.union(&a).unwrap().len().unwrap(), 1);
}

#[test]
fn test_union_keeps_receiver_order() {
    let env = common::env();
    let blog = common::seed(&env);
    let users = blog.will.union(&blog.jane).unwrap();

    let expected: Vec<_> = blog
        .will
        .ids()
        .unwrap()
        .into_iter()
        .chain(blog.jane.ids().unwrap())
        .collect();
    assert_eq!(users.ids().unwrap(), expected);
}

#[test]
fn test_set_operations_reject_other_models() {
    let env = common::env();
    let blog = common::seed(&env);

    for result in [
        blog.jane.union(&blog.jane_posts),
        blog.jane.subtract(&blog.jane_posts),
        blog.jane.intersect(&blog.jane_posts),
    ] {
        match result {
            Err(Error::InvalidOperand { left, right }) => {
                assert_eq!(left, "User");
                assert_eq!(right, "Post");
            }
            other => panic!("expected InvalidOperand, got {:?}", other),
        }
    }
    assert!(blog.jane.equals(&blog.jane_posts).is_err());
}

#[test]
fn test_read_returns_requested_keys_and_id() {
    let env = common::env();
    let blog = common::seed(&env);

    let maps = blog.jane.read(&["Name", "Age", "Posts", "Profile"]).unwrap();
    assert_eq!(maps.len(), 1);
    let map = &maps[0];

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["age", "id", "name", "posts", "profile"]);

    assert_eq!(common::scalar(map, "name"), Value::Text("Jane Smith".into()));
    assert_eq!(common::scalar(map, "age"), Value::Integer(24));
    assert_eq!(
        common::scalar(map, "id"),
        Value::Integer(blog.jane.ensure_one().unwrap())
    );

    let posts = map["posts"].as_records().unwrap();
    assert_eq!(posts.model(), "Post");
    assert!(posts.equals(&blog.jane_posts).unwrap());

    let profile = map["profile"].as_records().unwrap();
    assert!(profile.equals(&blog.jane_profile).unwrap());
}

#[test]
fn test_read_all_fields() {
    let env = common::env();
    let blog = common::seed(&env);

    let maps = blog.will.read::<&str>(&[]).unwrap();
    let map = &maps[0];
    assert_eq!(common::scalar(map, "decorated_name"), Value::Text("User: Will Smith".into()));
    assert_eq!(common::scalar(map, "p_month"), Value::Null);
    assert_eq!(common::scalar(map, "nums"), Value::Integer(3));
    assert!(map["profile"].as_records().unwrap().is_empty().unwrap());
    assert!(map.contains_key("best_post_title"));
}

#[test]
fn test_read_unknown_field() {
    let env = common::env();
    let blog = common::seed(&env);
    assert!(matches!(
        blog.jane.read(&["Nope"]),
        Err(Error::UnresolvedPath { .. })
    ));
}

#[test]
fn test_get_values_and_relations() {
    let env = common::env();
    let blog = common::seed(&env);

    let name = blog.jane.get("DecoratedName").unwrap();
    assert_eq!(name.as_value(), Some(&Value::Text("User: Jane Smith".into())));

    match blog.jane_profile.get("User").unwrap() {
        FieldValue::Records(user) => assert!(user.equals(&blog.jane).unwrap()),
        other => panic!("expected records, got {:?}", other),
    }

    let users = blog.jane.union(&blog.will).unwrap();
    assert!(matches!(
        users.get("Name"),
        Err(Error::NotSingleton { len: 2, .. })
    ));
}

#[test]
fn test_create_applies_defaults_and_required() {
    let env = common::env();
    let users = env.pool("User").unwrap();

    let bob = users.create([("Name", "Bob")]).unwrap();
    assert_eq!(bob.get("IsStaff").unwrap().as_value(), Some(&Value::Bool(false)));
    assert_eq!(bob.get("Nums").unwrap().as_value(), Some(&Value::Integer(3)));

    assert!(matches!(
        users.create([("Age", 3)]),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        users.create([("Name", Value::Null)]),
        Err(Error::InvalidValue(_))
    ));
}

#[test]
fn test_default_get() {
    let env = common::env();
    let defaults = env.pool("User").unwrap().default_get().unwrap();
    let expected: BTreeMap<String, Value> = [
        ("is_staff".to_string(), Value::Bool(false)),
        ("nums".to_string(), Value::Integer(3)),
    ]
    .into_iter()
    .collect();
    assert_eq!(defaults, expected);
}

#[test]
fn test_write_rejects_invalid_fields() {
    let env = common::env();
    let blog = common::seed(&env);

    for field in ["DecoratedName", "PMonth", "Posts", "ID"] {
        assert!(
            matches!(blog.jane.set(field, 1), Err(Error::InvalidValue(_))),
            "{} should not be writable",
            field
        );
    }
    assert!(matches!(
        blog.jane.set("Age", "old"),
        Err(Error::InvalidValue(_))
    ));
    assert!(matches!(
        blog.jane.set("Nope", 1),
        Err(Error::UnresolvedPath { .. })
    ));

    // Jane's profile cannot be shared.
    let profile = blog.jane_profile.to_value().unwrap();
    assert!(matches!(
        blog.will.set("Profile", profile),
        Err(Error::InvalidValue(_))
    ));
    // Pointing at a record that does not exist.
    assert!(matches!(
        blog.will.set("Profile", 999_999),
        Err(Error::InvalidValue(_))
    ));
}

#[test]
fn test_write_by_wire_name() {
    let env = common::env();
    let blog = common::seed(&env);

    blog.jane
        .write([("email", Value::from("jane@example.com")), ("age", Value::from(25))])
        .unwrap();
    assert_eq!(
        blog.jane.get("Email").unwrap().as_value(),
        Some(&Value::Text("jane@example.com".into()))
    );
    assert_eq!(blog.jane.get("age").unwrap().as_value(), Some(&Value::Integer(25)));
}

#[test]
fn test_copy_skips_sensitive_and_reverse_fields() {
    let env = common::env();
    let blog = common::seed(&env);
    blog.jane.set("Email2", "alt@example.com").unwrap();

    let copied = blog.jane.copy([("Name", "Jane Copy")]).unwrap();
    assert!(!copied.equals(&blog.jane).unwrap());

    let map = copied
        .read(&["Name", "Email", "Email2", "Password", "Age", "Nums", "Posts", "Profile"])
        .unwrap()
        .remove(0);
    assert_eq!(common::scalar(&map, "name"), Value::Text("Jane Copy".into()));
    assert_eq!(common::scalar(&map, "email"), Value::Text("jsmith@example.com".into()));
    assert_eq!(common::scalar(&map, "email2"), Value::Null);
    assert_eq!(common::scalar(&map, "password"), Value::Null);
    assert_eq!(common::scalar(&map, "age"), Value::Integer(24));
    assert_eq!(common::scalar(&map, "nums"), Value::Integer(3));
    assert!(map["posts"].as_records().unwrap().is_empty().unwrap());
    assert!(map["profile"].as_records().unwrap().is_empty().unwrap());

    // The source keeps its posts.
    assert_eq!(blog.jane.get("Posts").unwrap().as_records().unwrap().len().unwrap(), 2);
}

#[test]
fn test_search_order_and_paging() {
    let env = common::env();
    let blog = common::seed(&env);
    let posts = env.pool("Post").unwrap();

    let ordered = posts.search_all().order_by("Title desc");
    let ids = ordered.ids().unwrap();
    let mut expected = blog.jane_posts.ids().unwrap();
    expected.reverse();
    assert_eq!(ids, expected);

    let page = ordered.offset(1).limit(1);
    assert_eq!(page.ids().unwrap(), vec![expected[1]]);
    assert_eq!(page.search_count().unwrap(), 2);

    let limited = posts.search_limited(Condition::like("Title", "%post"), None);
    assert_eq!(limited.len().unwrap(), 2);
    let limited = posts.search_limited(Condition::like("Title", "%post"), Some(1));
    assert_eq!(limited.len().unwrap(), 1);
}

#[test]
fn test_search_through_relations() {
    let env = common::env();
    let blog = common::seed(&env);
    let users = env.pool("User").unwrap();

    let authors = users.search(Condition::like("Posts.Title", "1st%"));
    assert!(authors.equals(&blog.jane).unwrap());

    let posts = env
        .pool("Post")
        .unwrap()
        .search(Condition::ilike("User.Name", "jane%"));
    assert!(posts.equals(&blog.jane_posts).unwrap());

    let staff = users.search(Condition::eq("IsStaff", true));
    assert!(staff.is_empty().unwrap());

    let adults = users.search(Condition::is_in("Age", [24, 36]));
    assert_eq!(adults.len().unwrap(), 2);
}

#[test]
fn test_filtered_narrows_collection() {
    let env = common::env();
    let blog = common::seed(&env);
    let users = blog.jane.union(&blog.will).unwrap();

    let older = users.filtered(Condition::gt("Age", 30)).unwrap();
    assert!(older.equals(&blog.will).unwrap());

    // Filtering a paged search narrows the page, not the model.
    let first = env.pool("User").unwrap().search_all().limit(1);
    let narrowed = first.filtered(Condition::gt("Age", 30)).unwrap();
    assert!(narrowed.is_empty().unwrap());
}

#[test]
fn test_load_materializes_search() {
    let env = common::env();
    let blog = common::seed(&env);

    let loaded = env
        .pool("User")
        .unwrap()
        .search(Condition::lt("Age", 30))
        .load(&["Name", "PMonth"])
        .unwrap();
    assert_eq!(loaded.ids().unwrap(), blog.jane.ids().unwrap());

    // Later writes do not change the loaded set.
    blog.jane.set("Age", 40).unwrap();
    assert_eq!(loaded.len().unwrap(), 1);

    assert!(env
        .pool("User")
        .unwrap()
        .search_all()
        .load(&["Nope"])
        .is_err());
}

#[test]
fn test_records_and_unlink() {
    let env = common::env();
    let blog = common::seed(&env);

    let singles = blog.jane_posts.records().unwrap();
    assert_eq!(singles.len(), 2);
    assert_eq!(singles[0].len().unwrap(), 1);

    assert_eq!(singles[0].unlink().unwrap(), 1);
    let remaining = blog.jane.get("Posts").unwrap();
    assert!(remaining.as_records().unwrap().equals(&singles[1]).unwrap());
}

#[test]
fn test_browse_dedups() {
    let env = common::env();
    let blog = common::seed(&env);
    let id = blog.jane.ensure_one().unwrap();

    let users = env.pool("User").unwrap().browse([id, id, id]);
    assert_eq!(users.ids().unwrap(), vec![id]);
    assert!(env.pool("User").unwrap().is_empty().unwrap());
}

#[test]
fn test_unlink_clears_links_to_deleted_records() {
    let env = common::env();
    let tags = env.pool("Tag").unwrap();
    let parent = tags.create([("Name", "Parent")]).unwrap();
    let child = tags
        .create([("Name", Value::from("Child")), ("Parent", parent.to_value().unwrap())])
        .unwrap();

    assert_eq!(parent.unlink().unwrap(), 1);
    assert!(child.get("Parent").unwrap().as_records().unwrap().is_empty().unwrap());
    assert_eq!(child.get("ParentName").unwrap().as_value(), Some(&Value::Null));
    assert!(tags.search(Condition::is_null("Parent")).equals(&child).unwrap());
}

#[test]
fn test_unlink_clears_links_from_other_models() {
    let env = common::env();
    let blog = common::seed(&env);
    let posts = blog.jane.get("Posts").unwrap().as_records().unwrap().clone();

    assert_eq!(blog.jane.unlink().unwrap(), 1);
    for post in posts.records().unwrap() {
        assert!(post.get("User").unwrap().as_records().unwrap().is_empty().unwrap());
    }
    assert!(blog.jane_profile.get("User").unwrap().as_records().unwrap().is_empty().unwrap());
    // The profile's own link to a surviving post is untouched.
    assert_eq!(
        blog.jane_profile.get("BestPostTitle").unwrap().as_value(),
        Some(&Value::Text("2nd post".into()))
    );
}

#[test]
fn test_audit_timestamps() {
    let env = common::env();
    let tag = env.pool("Tag").unwrap().create([("Name", "Audited")]).unwrap();
    let timestamp = |field: &str| tag.get(field).unwrap().as_value().cloned().unwrap();

    let created = timestamp("CreateDate").as_timestamp().unwrap();
    assert_eq!(timestamp("WriteDate"), Value::Null);
    assert_eq!(timestamp("LastUpdate"), Value::Timestamp(created));

    tag.set("Name", "Rewritten").unwrap();
    let written = timestamp("write_date").as_timestamp().unwrap();
    assert!(written >= created);
    assert_eq!(timestamp("LastUpdate"), Value::Timestamp(written));
    assert_eq!(timestamp("CreateDate"), Value::Timestamp(created));

    for field in ["CreateDate", "WriteDate", "LastUpdate"] {
        assert!(matches!(
            tag.set(field, Value::Timestamp(0)),
            Err(Error::InvalidValue(_))
        ));
    }

    let copied = tag.copy([("Name", "Copy")]).unwrap();
    assert_eq!(copied.get("WriteDate").unwrap().as_value(), Some(&Value::Null));
    assert!(copied.get("CreateDate").unwrap().as_value().unwrap().as_timestamp().unwrap() >= created);
}

#[test]
fn test_display_names() {
    let env = common::env();
    let blog = common::seed(&env);

    assert_eq!(blog.jane.display_name().unwrap(), "Jane Smith");
    let profile_id = blog.jane_profile.ensure_one().unwrap();
    assert_eq!(
        blog.jane_profile.display_name().unwrap(),
        format!("Profile({})", profile_id)
    );

    let names = blog.jane.union(&blog.will).unwrap().name_get().unwrap();
    let names: Vec<&str> = names.iter().map(|(_, name)| name.as_str()).collect();
    assert_eq!(names, vec!["Jane Smith", "Will Smith"]);

    let unnamed = env.pool("Tag").unwrap().create([("Name", "")]).unwrap();
    let id = unnamed.ensure_one().unwrap();
    assert_eq!(unnamed.display_name().unwrap(), format!("Tag({})", id));

    let users = blog.jane.union(&blog.will).unwrap();
    assert!(matches!(users.display_name(), Err(Error::NotSingleton { len: 2, .. })));
}

#[test]
fn test_field_metadata() {
    let env = common::env();
    let users = env.pool("User").unwrap();

    let name = users.field_get("Name").unwrap();
    assert_eq!(name.json_name, "name");
    assert_eq!(name.field_type, FieldType::Char);
    assert!(name.required && !name.readonly);

    let all = users.fields_get::<&str>(&[]).unwrap();
    assert_eq!(all.len(), 16);
    assert!(all["p_month"].readonly);
    assert_eq!(all["p_month"].related.as_deref(), Some("Profile.Month"));
    assert_eq!(all["posts"].target_model.as_deref(), Some("Post"));
    assert!(all["create_date"].readonly && all["create_date"].stored);

    let some = users.fields_get(&["IsStaff", "profile"]).unwrap();
    let keys: Vec<&str> = some.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["is_staff", "profile"]);
    assert_eq!(some["is_staff"].default, Some(Value::Bool(false)));

    assert!(matches!(users.field_get("Nope"), Err(Error::UnresolvedPath { .. })));
}
