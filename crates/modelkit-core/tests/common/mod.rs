//! Shared fixture: a small blog with users, profiles, posts and tags.

#![allow(dead_code)]

use modelkit_core::proto::Value;
use modelkit_core::{
    Database, Environment, FieldDef, FieldType, ModelDef, OrmConfig, RecordCollection, Registry,
};

pub fn registry() -> Registry {
    let user = ModelDef::new("User")
        .with_field(FieldDef::new("Name", FieldType::Char).required())
        .with_field(FieldDef::new("Email", FieldType::Char))
        .with_field(FieldDef::new("Email2", FieldType::Char).no_copy())
        .with_field(FieldDef::new("Password", FieldType::Char).sensitive())
        .with_field(FieldDef::new("Age", FieldType::Integer))
        .with_field(FieldDef::new("IsStaff", FieldType::Boolean).with_default(false))
        .with_field(FieldDef::new("Nums", FieldType::Integer).with_default(3))
        .with_field(FieldDef::one2one("Profile", "Profile"))
        .with_field(FieldDef::one2many("Posts", "Post", "User"))
        .with_field(FieldDef::computed("DecoratedName", FieldType::Char, |row| {
            match row.get("name").and_then(Value::as_str) {
                Some(name) => Value::Text(format!("User: {}", name)),
                None => Value::Null,
            }
        }))
        .with_field(FieldDef::related("PMonth", FieldType::Integer, "Profile.Month"))
        .with_field(FieldDef::related("BestPostTitle", FieldType::Char, "Profile.BestPostTitle"));

    let profile = ModelDef::new("Profile")
        .with_field(FieldDef::new("Age", FieldType::Integer))
        .with_field(FieldDef::new("Month", FieldType::Integer))
        .with_field(FieldDef::many2one("BestPost", "Post"))
        .with_field(FieldDef::related("BestPostTitle", FieldType::Char, "BestPost.Title"))
        .with_field(FieldDef::rev2one("User", "User", "Profile"));

    let post = ModelDef::new("Post")
        .with_field(FieldDef::many2one("User", "User"))
        .with_field(FieldDef::new("Title", FieldType::Char))
        .with_field(FieldDef::new("Content", FieldType::Text));

    let tag = ModelDef::new("Tag")
        .with_field(FieldDef::new("Name", FieldType::Char))
        .with_field(FieldDef::many2one("Parent", "Tag"))
        .with_field(FieldDef::related("ParentName", FieldType::Char, "Parent.Name"));

    Registry::builder()
        .with_model(user)
        .with_model(profile)
        .with_model(post)
        .with_model(tag)
        .build()
        .unwrap()
}

pub fn database() -> Database {
    Database::open(OrmConfig::temporary(), registry()).unwrap()
}

pub fn env() -> Environment {
    database().environment(2)
}

/// Records created by [`seed`].
pub struct Blog {
    pub jane: RecordCollection,
    pub will: RecordCollection,
    pub jane_profile: RecordCollection,
    pub jane_posts: RecordCollection,
}

/// Create two users; Jane has a profile and two posts, the second being her
/// best post.
pub fn seed(env: &Environment) -> Blog {
    let users = env.pool("User").unwrap();
    let posts = env.pool("Post").unwrap();
    let profiles = env.pool("Profile").unwrap();

    let jane = users
        .create([
            ("Name", Value::from("Jane Smith")),
            ("Email", Value::from("jsmith@example.com")),
            ("Password", Value::from("secret")),
            ("Age", Value::from(24)),
        ])
        .unwrap();
    let will = users
        .create([("Name", Value::from("Will Smith")), ("Age", Value::from(36))])
        .unwrap();

    let first = posts
        .create([
            ("User", jane.to_value().unwrap()),
            ("Title", Value::from("1st post")),
        ])
        .unwrap();
    let second = posts
        .create([
            ("User", jane.to_value().unwrap()),
            ("Title", Value::from("2nd post")),
        ])
        .unwrap();

    let jane_profile = profiles
        .create([
            ("Age", Value::from(24)),
            ("Month", Value::from(7)),
            ("BestPost", second.to_value().unwrap()),
        ])
        .unwrap();
    jane.set("Profile", jane_profile.to_value().unwrap()).unwrap();

    Blog {
        jane_posts: first.union(&second).unwrap(),
        jane,
        will,
        jane_profile,
    }
}

/// Scalar value of a field map entry.
pub fn scalar(map: &modelkit_core::FieldMap, key: &str) -> Value {
    map[key].as_value().cloned().unwrap()
}
