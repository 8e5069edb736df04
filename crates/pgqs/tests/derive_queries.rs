//! SQL produced by the derived per-table query and update builders.

mod common;

use common::{Comment, POST_COLUMNS, Post, Tag};
use pgqs::mock::MockClient;
use pgqs::{Entity, Value};

#[test]
fn entity_column_lists() {
    assert_eq!(Post::TABLE, "post");
    assert_eq!(Post::PRIMARY_KEY, "id");
    assert!(Post::PRIMARY_KEY_AUTOGENERATED);
    assert_eq!(
        Post::INSERT_COLUMNS,
        ["author_id", "title", "published", "score", "tags"]
    );
    assert_eq!(Post::UPDATE_COLUMNS, Post::INSERT_COLUMNS);
    assert_eq!(Post::RETURNING_COLUMNS, ["id", "created_at"]);

    assert!(!Tag::PRIMARY_KEY_AUTOGENERATED);
    assert_eq!(Tag::INSERT_COLUMNS, ["slug", "label"]);
    assert_eq!(Tag::UPDATE_COLUMNS, ["label"]);
    assert!(Tag::RETURNING_COLUMNS.is_empty());
}

#[test]
fn filters_and_order() {
    let (sql, params) = Post::query()
        .title_eq("x")
        .tags_is_null()
        .order_by_id_desc()
        .to_select_sql();
    assert_eq!(
        sql,
        format!(
            r#"SELECT {POST_COLUMNS} FROM "post" WHERE "title" = $1 AND "tags" IS NULL ORDER BY "id" DESC"#
        )
    );
    assert_eq!(params, [Value::from("x")]);
}

#[test]
fn siblings_do_not_share_conditions() {
    let base = Post::query().published_eq(true);
    let high = base.score_ge(4.0);
    let ordered = base.order_by_title().for_update();

    assert_eq!(
        base.to_count_sql().0,
        r#"SELECT COUNT("id") FROM "post" WHERE "published" = $1"#
    );
    assert_eq!(
        high.to_count_sql().0,
        r#"SELECT COUNT("id") FROM "post" WHERE "published" = $1 AND "score" >= $2"#
    );
    assert_eq!(
        ordered.to_select_sql().0,
        format!(
            r#"SELECT {POST_COLUMNS} FROM "post" WHERE "published" = $1 ORDER BY "title" FOR UPDATE"#
        )
    );
}

#[test]
fn first_places_limit_before_lock() {
    let (sql, _) = Post::query()
        .order_by_title()
        .for_update_nowait()
        .for_update_skip_locked()
        .to_first_sql();
    assert_eq!(
        sql,
        format!(
            r#"SELECT {POST_COLUMNS} FROM "post" ORDER BY "title" LIMIT 1 FOR UPDATE SKIP LOCKED"#
        )
    );

    let (sql, _) = Post::query().for_update().clear_for_update().to_first_sql();
    assert_eq!(sql, format!(r#"SELECT {POST_COLUMNS} FROM "post" LIMIT 1"#));
}

#[test]
fn or_groups_are_parenthesized() {
    let (sql, params) = Post::query()
        .published_eq(true)
        .or([
            Post::query().score_gt(4.5),
            Post::query().title_eq("a").score_lt(1.0),
        ])
        .to_count_sql();
    assert_eq!(
        sql,
        r#"SELECT COUNT("id") FROM "post" WHERE "published" = $1 AND ("score" > $2 OR ("title" = $3 AND "score" < $4))"#
    );
    assert_eq!(
        params,
        [
            Value::Bool(true),
            Value::Float64(4.5),
            Value::from("a"),
            Value::Float64(1.0)
        ]
    );
}

#[test]
fn list_membership() {
    let (sql, params) = Post::query().id_in([1_i64, 2, 3]).to_delete_sql();
    assert_eq!(sql, r#"DELETE FROM "post" WHERE "id" IN ($1, $2, $3)"#);
    assert_eq!(params.len(), 3);

    let (sql, params) = Post::query()
        .id_in(Vec::<i64>::new())
        .title_not_in(Vec::<String>::new())
        .to_delete_sql();
    assert_eq!(sql, r#"DELETE FROM "post" WHERE false AND true"#);
    assert!(params.is_empty());
}

#[test]
fn foreign_key_subquery_shares_numbering() {
    let (sql, params) = Comment::query()
        .body_ne("spam")
        .post_id_in(Post::query().author_id_raw_eq(7_i64))
        .reviewer_id_is_not_null()
        .to_select_sql();
    assert_eq!(
        sql,
        r#"SELECT "id","post_id","reviewer_id","body" FROM "comment" WHERE "body" != $1 AND "post_id" IN (SELECT "id" FROM "post" WHERE "author_id" = $2) AND "reviewer_id" IS NOT NULL"#
    );
    assert_eq!(params, [Value::from("spam"), Value::Int64(7)]);
}

#[test]
fn bulk_update_numbers_assignments_first() {
    let (sql, params) = Post::query()
        .id_eq(5)
        .update()
        .set_title("y")
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"UPDATE "post" SET "title" = $1 WHERE "id" = $2"#);
    assert_eq!(params, [Value::from("y"), Value::Int64(5)]);
}

#[test]
fn bulk_update_writes_null_literally() {
    let (sql, params) = Comment::query()
        .post_id_raw_eq(3)
        .update()
        .set_reviewer_id(None)
        .unwrap()
        .set_body("hidden")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "comment" SET "reviewer_id" = NULL, "body" = $1 WHERE "post_id" = $2"#
    );
    assert_eq!(params, [Value::from("hidden"), Value::Int64(3)]);

    let (sql, _) = Post::query()
        .update()
        .set_tags(None::<Vec<String>>)
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"UPDATE "post" SET "tags" = NULL"#);
}

#[test]
fn bulk_update_can_rename_a_supplied_key() {
    let (sql, params) = Tag::query()
        .slug_eq("pg")
        .update()
        .set_slug("postgres")
        .set_label("PostgreSQL")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "tag" SET "slug" = $1, "label" = $2 WHERE "slug" = $3"#
    );
    assert_eq!(
        params,
        [
            Value::from("postgres"),
            Value::from("PostgreSQL"),
            Value::from("pg")
        ]
    );
}

#[tokio::test]
async fn empty_update_does_not_reach_the_store() {
    let mock = MockClient::new();
    let update = Post::query().title_eq("x").update();

    assert!(update.to_sql().is_none());
    assert_eq!(update.exec(&mock).await.unwrap(), 0);
    assert!(mock.statements().is_empty());
}

#[tokio::test]
async fn terminals_run_the_compiled_statement() {
    let mock = MockClient::new();
    mock.push_rows(vec![pgqs::Row::from(vec![Value::Int64(3)])])
        .push_affected(2)
        .push_affected(4);

    let query = Post::query().author_id_raw_eq(9);
    assert_eq!(query.count(&mock).await.unwrap(), 3);
    assert_eq!(query.delete(&mock).await.unwrap(), 2);
    assert_eq!(
        query.update().set_published(false).exec(&mock).await.unwrap(),
        4
    );

    let statements = mock.statements();
    assert_eq!(statements[0].sql, query.to_count_sql().0);
    assert_eq!(statements[1].sql, r#"DELETE FROM "post" WHERE "author_id" = $1"#);
    assert_eq!(
        statements[2].sql,
        r#"UPDATE "post" SET "published" = $1 WHERE "author_id" = $2"#
    );
    assert_eq!(statements[2].params, [Value::Bool(false), Value::Int64(9)]);
}

#[tokio::test]
async fn count_without_a_row_is_zero() {
    let mock = MockClient::new();
    assert_eq!(Post::query().count(&mock).await.unwrap(), 0);
}
