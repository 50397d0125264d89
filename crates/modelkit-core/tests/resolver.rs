//! Integration tests for related-field resolution.

mod common;

use modelkit_core::proto::{Condition, FieldPath, Value};
use modelkit_core::{Error, PathResolver};

#[test]
fn test_chained_alias_resolves_to_real_field() {
    let registry = common::registry();
    let resolver = PathResolver::new(&registry, 32);

    // BestPostTitle -> Profile.BestPostTitle -> Profile.BestPost.Title
    let resolved = resolver
        .resolve("User", &FieldPath::from("BestPostTitle"))
        .unwrap();
    assert_eq!(resolved.path.join(), "profile.best_post.title");
    assert_eq!(resolved.substitutions, 2);

    let (_, owner, field) = resolver
        .terminal("User", &FieldPath::from("BestPostTitle"))
        .unwrap();
    assert_eq!(owner.name, "Post");
    assert_eq!(field.name, "Title");
    assert!(!field.is_related());
}

#[test]
fn test_condition_and_field_list_agree() {
    let registry = common::registry();
    let resolver = PathResolver::new(&registry, 32);

    let condition = Condition::eq("BestPostTitle", "2nd post").and(Condition::gt("Age", 20));
    let substituted = resolver.substitute("User", &condition).unwrap();
    let paths: Vec<String> = substituted.field_paths().iter().map(|p| p.join()).collect();
    assert_eq!(paths, vec!["profile.best_post.title", "age"]);

    let expanded = resolver.expand_fields("User", &["BestPostTitle"]).unwrap();
    assert!(expanded.contains(&paths[0]));
}

#[test]
fn test_expansion_has_no_duplicates() {
    let registry = common::registry();
    let resolver = PathResolver::new(&registry, 32);

    let expanded = resolver
        .expand_fields("User", &["PMonth", "Profile", "Profile.Month", "profile"])
        .unwrap();
    let expanded: Vec<&str> = expanded.iter().map(String::as_str).collect();
    assert_eq!(expanded, vec!["profile", "profile.month"]);
}

#[test]
fn test_unknown_path_reports_caller_path() {
    let registry = common::registry();
    let resolver = PathResolver::new(&registry, 32);

    match resolver.resolve("User", &FieldPath::from("Profile.Nope")) {
        Err(Error::UnresolvedPath { model, path }) => {
            assert_eq!(model, "User");
            assert_eq!(path, "Profile.Nope");
        }
        other => panic!("expected UnresolvedPath, got {:?}", other),
    }
}

#[test]
fn test_alias_bound_is_configuration_error() {
    let registry = common::registry();
    let resolver = PathResolver::new(&registry, 1);

    assert!(resolver.resolve("User", &FieldPath::from("PMonth")).is_ok());
    assert!(matches!(
        resolver.resolve("User", &FieldPath::from("BestPostTitle")),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_search_through_alias_matches_expanded_path() {
    let env = common::env();
    let blog = common::seed(&env);
    let users = env.pool("User").unwrap();

    let by_alias = users.search(Condition::eq("PMonth", 7));
    let by_path = users.search(Condition::eq("Profile.Month", 7));
    assert!(by_alias.equals(&by_path).unwrap());
    assert!(by_alias.equals(&blog.jane).unwrap());

    let by_title = users.search(Condition::like("BestPostTitle", "2nd%"));
    assert_eq!(by_title.ids().unwrap(), blog.jane.ids().unwrap());

    let nobody = users.search(Condition::eq("BestPostTitle", "1st post"));
    assert!(nobody.is_empty().unwrap());
}

#[test]
fn test_negated_alias_condition() {
    let env = common::env();
    let blog = common::seed(&env);
    let users = env.pool("User").unwrap();

    // Will has no profile, so his month is null.
    let others = users.search(!Condition::eq("PMonth", 7));
    assert!(others.equals(&blog.will).unwrap());

    let without = users.search(Condition::is_null("PMonth"));
    assert!(without.equals(&blog.will).unwrap());
}

#[test]
fn test_order_by_alias() {
    let env = common::env();
    let blog = common::seed(&env);
    let profile = env.pool("Profile").unwrap().create([("Month", 3)]).unwrap();
    blog.will.set("Profile", profile.to_value().unwrap()).unwrap();

    let ordered = env.pool("User").unwrap().search_all().order_by("PMonth desc");
    let expected = blog.jane.union(&blog.will).unwrap();
    assert_eq!(ordered.ids().unwrap(), expected.ids().unwrap());

    let ascending = env.pool("User").unwrap().search_all().order_by("PMonth");
    let expected = blog.will.union(&blog.jane).unwrap();
    assert_eq!(ascending.ids().unwrap(), expected.ids().unwrap());
}

#[test]
fn test_related_values_read_back() {
    let env = common::env();
    let blog = common::seed(&env);

    let maps = blog.jane.read(&["PMonth", "BestPostTitle"]).unwrap();
    assert_eq!(maps.len(), 1);
    assert_eq!(common::scalar(&maps[0], "p_month"), Value::Integer(7));
    assert_eq!(
        common::scalar(&maps[0], "best_post_title"),
        Value::Text("2nd post".into())
    );

    let title = blog.jane_profile.get("BestPostTitle").unwrap();
    assert_eq!(title.as_value(), Some(&Value::Text("2nd post".into())));
}
