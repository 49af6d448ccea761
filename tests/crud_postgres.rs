//! Data layer and services against a real PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` to run these; without it every test returns early.
//! Each test works in a fresh schema inside a transaction that is never committed.

use boilerplate_api::data::{DataService, Filter, UserDataService};
use boilerplate_api::models::{UserCreate, UserUpdate};
use boilerplate_api::{apply_schema, CrudError, ErrorStatus, PageRequest, SortDirection, UserService};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    Some(pool)
}

async fn fresh_schema(conn: &mut PgConnection) -> String {
    let schema = format!("test_{}", Uuid::new_v4().simple());
    apply_schema(conn, &schema).await.expect("schema");
    schema
}

fn user(username: &str) -> UserCreate {
    UserCreate {
        first_name: "Test".into(),
        last_name: username.to_uppercase(),
        username: username.into(),
        email: format!("{}@x.com", username),
        is_active: true,
    }
}

#[tokio::test]
async fn user_lifecycle() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;

    let ann = UserService::for_connection(&mut tx, &schema)
        .create(
            UserCreate {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                username: "ann".into(),
                email: "ann@x.com".into(),
                is_active: true,
            },
            "system",
        )
        .await
        .expect("create ann");
    assert!(ann.is_active);
    assert_eq!(ann.created_by_user_id, "system");
    assert_eq!(ann.last_modified_by_user_id, "system");

    // A failed statement aborts the transaction, so the duplicate runs in a savepoint.
    {
        let mut sp = Connection::begin(&mut *tx).await.expect("savepoint");
        let mut dup = user("ann2");
        dup.email = "ann@x.com".into();
        let err = UserService::for_connection(&mut sp, &schema)
            .create(dup, "system")
            .await
            .expect_err("duplicate email");
        assert_eq!(err.status, ErrorStatus::Conflict);
        assert_eq!(
            err.details,
            "Failed to create new User - User with given username or email already exists"
        );
        sp.rollback().await.expect("rollback savepoint");
    }

    let mut service = UserService::for_connection(&mut tx, &schema);
    let page = service.list_users(PageRequest::default(), None).await.expect("page");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].email, "ann@x.com");

    service.delete(ann.id, "admin").await.expect("delete");
    let err = service.get_by_id(ann.id).await.expect_err("deleted");
    assert_eq!(err.status, ErrorStatus::NotFound);
    assert_eq!(err.details, format!("User with id {} not found", ann.id));
    let err = service.delete(ann.id, "admin").await.expect_err("second delete");
    assert_eq!(err.status, ErrorStatus::NotFound);
}

#[tokio::test]
async fn pages_partition_the_matches() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    for i in 0..7 {
        service.create(user(&format!("user{}", i)), "system").await.expect("create");
    }

    let mut seen = Vec::new();
    for (page_number, expected) in [(1, 3), (2, 3), (3, 1), (4, 0)] {
        let page = service
            .list_users(PageRequest::new(page_number, 3), None)
            .await
            .expect("page");
        assert_eq!(page.total, 7);
        assert_eq!(page.items.len(), expected, "page {}", page_number);
        seen.extend(page.items.into_iter().map(|u| u.id));
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 7);

    let all = service
        .list_users(PageRequest::new(2, 3).unpaginated(), None)
        .await
        .expect("all");
    assert_eq!(all.items.len(), 7);
}

#[tokio::test]
async fn descending_sort_reverses_ascending() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    for name in ["carol", "ann", "bob"] {
        service.create(user(name), "system").await.expect("create");
    }

    let names = |page: boilerplate_api::Page<boilerplate_api::models::User>| -> Vec<String> {
        page.items.into_iter().map(|u| u.username).collect()
    };
    let asc = service
        .list_users(PageRequest::default().sorted_by("username", SortDirection::Ascending), None)
        .await
        .expect("asc");
    let desc = service
        .list_users(PageRequest::default().sorted_by("username", SortDirection::Descending), None)
        .await
        .expect("desc");
    let asc = names(asc);
    let mut desc = names(desc);
    assert_eq!(asc, ["ann", "bob", "carol"]);
    desc.reverse();
    assert_eq!(asc, desc);

    let err = service
        .list_users(PageRequest::default().sorted_by("password", SortDirection::Ascending), None)
        .await
        .expect_err("unknown field");
    assert_eq!(err.status, ErrorStatus::BadRequest);
}

#[tokio::test]
async fn update_changes_only_present_fields() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    let ann = service.create(user("ann"), "system").await.expect("create");

    let updated = service
        .update(
            ann.id,
            UserUpdate {
                last_name: Some("Smith".into()),
                ..Default::default()
            },
            "editor",
        )
        .await
        .expect("update");
    assert_eq!(updated.last_name, "Smith");
    assert_eq!(updated.first_name, ann.first_name);
    assert_eq!(updated.email, ann.email);
    assert_eq!(updated.created_by_user_id, "system");
    assert_eq!(updated.last_modified_by_user_id, "editor");

    let read = service.get_by_id(ann.id).await.expect("read");
    assert_eq!(read, updated);

    let err = service
        .update(Uuid::new_v4(), UserUpdate::default(), "editor")
        .await
        .expect_err("missing");
    assert_eq!(err.status, ErrorStatus::NotFound);
}

#[tokio::test]
async fn soft_deleted_keys_can_be_reused() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    let first = service.create(user("ann"), "system").await.expect("create");
    service.delete(first.id, "system").await.expect("delete");
    let second = service.create(user("ann"), "system").await.expect("recreate");
    assert_ne!(first.id, second.id);

    let inactive = service
        .list_users(PageRequest::default(), Some(false))
        .await
        .expect("inactive");
    assert_eq!(inactive.total, 1);
    assert_eq!(inactive.items[0].id, first.id);
    assert!(!inactive.items[0].is_active);
}

#[tokio::test]
async fn crud_filters_combine_with_and() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut data = UserDataService::users(&mut tx, &schema);
    for name in ["ann", "anna", "bob", "Annette"] {
        data.create(user(name), "system").await.expect("create");
    }

    let (items, total) = data
        .get_page(&PageRequest::default().with_filter(Filter::contains("username", "ann")))
        .await
        .expect("contains");
    assert_eq!(total, 2);
    assert!(items.iter().all(|u| u.username.contains("ann")));

    let (_, total) = data
        .get_page(&PageRequest::default().with_filter(Filter::icontains("username", "ANN")))
        .await
        .expect("icontains");
    assert_eq!(total, 3);

    let (_, total) = data
        .get_page(
            &PageRequest::default()
                .with_filter(Filter::icontains("username", "ann"))
                .with_filter(Filter::not_equals("username", "anna")),
        )
        .await
        .expect("conjunction");
    assert_eq!(total, 2);

    let (items, _) = data
        .get_page(&PageRequest::default().with_filter(Filter::in_set("username", ["bob", "zed"])))
        .await
        .expect("in set");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].username, "bob");

    let (_, total) = data
        .get_page(&PageRequest::default().with_filter(Filter::in_set("username", Vec::<String>::new())))
        .await
        .expect("empty set");
    assert_eq!(total, 0);

    let (_, total) = data
        .get_page(&PageRequest::default().with_filter(Filter::range(
            "created_date",
            Some(json!("2000-01-01T00:00:00Z")),
            None,
        )))
        .await
        .expect("range");
    assert_eq!(total, 4);
}

#[tokio::test]
async fn pages_past_the_bigint_range_are_empty() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    service.create(user("ann"), "system").await.expect("create");

    for (page_number, page_size) in [(u64::MAX, u64::MAX), (3_000_000_000, 4_000_000_000), (2, 1 << 63)] {
        let page = service
            .list_users(PageRequest::new(page_number, page_size), None)
            .await
            .expect("far page");
        assert!(page.items.is_empty(), "page {} size {}", page_number, page_size);
        assert_eq!(page.total, 1);
    }

    let everything = service
        .list_users(PageRequest::new(1, u64::MAX), None)
        .await
        .expect("huge size");
    assert_eq!(everything.items.len(), 1);
}

#[tokio::test]
async fn condition_exists_follows_filters() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut data = UserDataService::users(&mut tx, &schema);
    let ann = data.create(user("ann"), "system").await.expect("create");

    assert!(data.condition_exists(&[]).await.expect("any"));
    assert!(data
        .condition_exists(&[Filter::equals("email", "ann@x.com")])
        .await
        .expect("email"));
    assert!(!data
        .condition_exists(&[Filter::equals("email", "bob@x.com")])
        .await
        .expect("other email"));

    data.delete(ann.audit.id, "system").await.expect("delete");
    assert!(!data
        .condition_exists(&[Filter::equals("username", "ann")])
        .await
        .expect("deleted"));
    assert!(data
        .condition_exists(&[Filter::equals("username", "ann"), Filter::equals("is_active", false)])
        .await
        .expect("inactive"));

    let err = data
        .condition_exists(&[Filter::equals("password", "x")])
        .await
        .expect_err("unknown field");
    assert!(matches!(err, CrudError::InvalidFilterField(_)));
}

#[tokio::test]
async fn condition_delete_soft_deletes_matches_only() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut data = UserDataService::users(&mut tx, &schema);
    for name in ["ann", "anna", "bob"] {
        data.create(user(name), "system").await.expect("create");
    }

    let deleted = data
        .condition_delete(&[Filter::contains("username", "ann")], "cleaner")
        .await
        .expect("delete");
    assert_eq!(deleted, 2);

    let (remaining, total) = data.get_page(&PageRequest::default()).await.expect("active");
    assert_eq!(total, 1);
    assert_eq!(remaining[0].username, "bob");

    let (gone, _) = data
        .get_page(&PageRequest::default().with_filter(Filter::equals("is_active", false)))
        .await
        .expect("inactive");
    assert_eq!(gone.len(), 2);
    assert!(gone.iter().all(|u| u.audit.last_modified_by_user_id == "cleaner"));

    let again = data
        .condition_delete(&[Filter::contains("username", "ann")], "cleaner")
        .await
        .expect("repeat");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn locked_row_blocks_a_concurrent_update() {
    let Some(pool) = test_pool().await else { return };
    // Two sessions must see the table, so this schema is committed and dropped at the end.
    let schema = {
        let mut conn = pool.acquire().await.expect("acquire");
        fresh_schema(&mut conn).await
    };
    let ann = {
        let mut conn = pool.acquire().await.expect("acquire");
        UserDataService::users(&mut conn, &schema)
            .create(user("ann"), "system")
            .await
            .expect("create")
    };

    let mut holder = pool.begin().await.expect("begin");
    let locked = UserDataService::users(&mut holder, &schema)
        .get_by_id_for_update(ann.audit.id)
        .await
        .expect("lock")
        .expect("row");
    assert_eq!(locked.username, "ann");

    let mut other = pool.acquire().await.expect("acquire");
    sqlx::query("SET lock_timeout = '200ms'")
        .execute(&mut *other)
        .await
        .expect("lock timeout");
    let rename = || UserUpdate {
        last_name: Some("Blocked".into()),
        ..Default::default()
    };
    let err = UserDataService::users(&mut other, &schema)
        .update(ann.audit.id, rename(), "other")
        .await
        .expect_err("row is locked");
    assert!(matches!(err, CrudError::Database { .. }));

    holder.rollback().await.expect("release");
    let updated = UserDataService::users(&mut other, &schema)
        .update(ann.audit.id, rename(), "other")
        .await
        .expect("update after release")
        .expect("row");
    assert_eq!(updated.last_name, "Blocked");
    drop(other);

    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(&pool)
        .await
        .expect("drop schema");
}

#[tokio::test]
async fn check_constraint_failures_are_integrity_violations() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    sqlx::query(&format!(
        "ALTER TABLE \"{}\".\"user\" ADD CONSTRAINT \"ck_user_username_short\" CHECK (char_length(\"username\") <= 8)",
        schema
    ))
    .execute(&mut *tx)
    .await
    .expect("add check");

    {
        let mut sp = Connection::begin(&mut *tx).await.expect("savepoint");
        let err = UserDataService::users(&mut sp, &schema)
            .create(user("much_too_long"), "system")
            .await
            .expect_err("check violated");
        assert!(matches!(err, CrudError::IntegrityViolation(ref msg) if msg == "Failed to create new entity User"));
        sp.rollback().await.expect("rollback savepoint");
    }
    {
        let mut sp = Connection::begin(&mut *tx).await.expect("savepoint");
        let err = UserService::for_connection(&mut sp, &schema)
            .create(user("much_too_long"), "system")
            .await
            .expect_err("check violated");
        assert_eq!(err.status, ErrorStatus::InternalError);
        assert_eq!(err.details, "Failed to create new entity User");
        sp.rollback().await.expect("rollback savepoint");
    }

    UserService::for_connection(&mut tx, &schema)
        .create(user("short"), "system")
        .await
        .expect("within the check");
}

#[tokio::test]
async fn update_to_a_taken_email_is_a_conflict() {
    let Some(pool) = test_pool().await else { return };
    let mut tx = pool.begin().await.expect("begin");
    let schema = fresh_schema(&mut tx).await;
    let mut service = UserService::for_connection(&mut tx, &schema);
    service.create(user("ann"), "system").await.expect("create ann");
    let bob = service.create(user("bob"), "system").await.expect("create bob");

    {
        let mut sp = Connection::begin(&mut *tx).await.expect("savepoint");
        let err = UserService::for_connection(&mut sp, &schema)
            .update(
                bob.id,
                UserUpdate {
                    email: Some("ann@x.com".into()),
                    ..Default::default()
                },
                "editor",
            )
            .await
            .expect_err("email taken");
        assert_eq!(err.status, ErrorStatus::Conflict);
        assert_eq!(
            err.details,
            format!(
                "Failed to update User with id {} - User with given username or email already exists",
                bob.id
            )
        );
        sp.rollback().await.expect("rollback savepoint");
    }

    let unchanged = UserService::for_connection(&mut tx, &schema)
        .get_by_id(bob.id)
        .await
        .expect("bob");
    assert_eq!(unchanged.email, "bob@x.com");
}
