//! Integration tests for unique constraints enforced with tag probes.

use serde_json::json;
use stratus::codec::hash_str;
use stratus::doc;
use stratus::errors::ErrorKind;
use stratus::index::{hashed_unique_index, unique_index};
use stratus_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_duplicate_unique_value_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;

            users.create(doc! {"firstName": "John", "email": "a@b"})?;
            let result = users.create(doc! {"firstName": "Jim", "email": "a@b"});

            assert!(result.is_err());
            assert_eq!(
                result.unwrap_err().kind(),
                &ErrorKind::UniqueConstraintViolation
            );
            // the rejected write left nothing behind
            assert_eq!(users.count(&json!({}))?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_distinct_unique_values_accepted() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create(doc! {"email": "a@b"})?;
            users.create(doc! {"email": "c@d"})?;
            assert_eq!(users.count(&json!({}))?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_equality_lookup_uses_tag_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create_with_id("u1", doc! {"email": "a@b"})?;

            let hits = users.find(
                &json!({"email": "a@b"}),
                &stratus::collection::FindOptions::new(),
            )?;
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].id(), Some("u1"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_hashed_unique_tag_equals_sha256_of_value() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &hashed_unique_index())?;
            users.create_with_id("u1", doc! {"email": "X@Y.com"})?;

            // the stored tag is the lowercase hex digest, probed directly
            // against the store
            let digest = hash_str("X@Y.com");
            let hits: Vec<String> = ctx
                .raw_store()
                .find_by_tags("users", &format!("\"email\" = '{}'", digest))?
                .collect::<Result<_, _>>()?;
            assert_eq!(hits, vec!["u1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_hashed_unique_constraint_still_enforced() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &hashed_unique_index())?;
            users.create(doc! {"email": "X@Y.com"})?;
            let result = users.create(doc! {"email": "X@Y.com"});
            assert!(result.is_err());
            assert_eq!(
                result.unwrap_err().kind(),
                &ErrorKind::UniqueConstraintViolation
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_keeping_unique_value_excludes_self() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create_with_id("u1", doc! {"email": "a@b", "visits": 1})?;

            // the unique value is unchanged; the document's own tag must
            // not count as a violation
            users.update("u1", doc! {"email": "a@b", "visits": 2})?;
            assert_eq!(users.read("u1")?.get("visits"), Some(&json!(2)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_to_taken_unique_value_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create_with_id("u1", doc! {"email": "a@b"})?;
            users.create_with_id("u2", doc! {"email": "c@d"})?;

            let result = users.update("u2", doc! {"email": "a@b"});
            assert!(result.is_err());
            assert_eq!(
                result.unwrap_err().kind(),
                &ErrorKind::UniqueConstraintViolation
            );
            // u2 is untouched
            assert_eq!(users.read("u2")?.get("email"), Some(&json!("c@d")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_to_freed_unique_value_accepted() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create_with_id("u1", doc! {"email": "a@b"})?;
            users.create_with_id("u2", doc! {"email": "c@d"})?;

            users.delete("u1")?;
            // the value is free again once its holder is gone
            users.update("u2", doc! {"email": "a@b"})?;
            assert_eq!(users.read("u2")?.get("email"), Some(&json!("a@b")));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_documents_without_unique_field_coexist() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.db().collection("users")?;
            users.create_index(&["email"], &unique_index())?;
            users.create(doc! {"name": "NoEmail1"})?;
            users.create(doc! {"name": "NoEmail2"})?;
            assert_eq!(users.count(&json!({}))?, 2);
            Ok(())
        },
        cleanup,
    )
}
