//! Foreign key accessors and reverse relations.

mod common;

use common::{Author, Comment, POST_COLUMNS, Post, author_row, post_row};
use pgqs::mock::MockClient;
use pgqs::{Entity, OrmError, Value};

#[tokio::test]
async fn get_loads_the_referenced_row() {
    let mock = MockClient::new();
    mock.push_rows(vec![post_row(1, 4, "a")])
        .push_rows(vec![author_row(4, "ann")]);

    let post = Post::query().first(&mock).await.unwrap().unwrap();
    let author = post.get_author(&mock).await.unwrap().unwrap();

    assert_eq!(author.id(), 4);
    assert_eq!(author.name, "ann");
    assert!(author.exists_in_db());

    let last = mock.last_statement().unwrap();
    assert_eq!(
        last.sql,
        r#"SELECT "id","name","email" FROM "author" WHERE "id" = $1 LIMIT 1"#
    );
    assert_eq!(last.params, [Value::Int64(4)]);
}

#[tokio::test]
async fn null_foreign_key_skips_the_query() {
    let mock = MockClient::new();
    let comment = Comment::new(1, None, "first".to_string());

    assert!(comment.get_reviewer(&mock).await.unwrap().is_none());
    assert!(mock.statements().is_empty());
}

#[tokio::test]
async fn setters_copy_the_primary_key() {
    let mock = MockClient::new();
    mock.push_rows(vec![author_row(8, "bo")])
        .push_rows(vec![post_row(3, 1, "p")]);
    let author = Author::query().first(&mock).await.unwrap().unwrap();
    let post = Post::query().first(&mock).await.unwrap().unwrap();

    let mut comment = Comment::new(0, None, "hi".to_string());
    comment.set_post(&post).unwrap();
    comment.set_reviewer(Some(&author)).unwrap();
    assert_eq!(comment.post_id, 3);
    assert_eq!(comment.reviewer_id, Some(8));

    comment.set_reviewer(None).unwrap();
    assert_eq!(comment.reviewer_id, None);
}

#[test]
fn unsaved_related_row_is_rejected() {
    let author = Author::new("new".to_string(), None);
    let mut post = Post::new(5, "t".to_string(), false, 0.0, None);

    let err = post.set_author(&author).unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));
    assert_eq!(post.author_id, 5);
}

#[tokio::test]
async fn reverse_relations_filter_by_primary_key() {
    let mock = MockClient::new();
    mock.push_rows(vec![post_row(12, 4, "a")])
        .push_rows(vec![author_row(4, "ann")]);
    let post = Post::query().first(&mock).await.unwrap().unwrap();
    let author = Author::query().first(&mock).await.unwrap().unwrap();

    let (sql, params) = post.comments().order_by_id().to_select_sql();
    assert_eq!(
        sql,
        r#"SELECT "id","post_id","reviewer_id","body" FROM "comment" WHERE "post_id" = $1 ORDER BY "id""#
    );
    assert_eq!(params, [Value::Int64(12)]);

    let (sql, params) = author.posts().published_eq(true).to_select_sql();
    assert_eq!(
        sql,
        format!(
            r#"SELECT {POST_COLUMNS} FROM "post" WHERE "author_id" = $1 AND "published" = $2"#
        )
    );
    assert_eq!(params, [Value::Int64(4), Value::Bool(true)]);
}

#[tokio::test]
async fn filter_by_related_row() {
    let mock = MockClient::new();
    mock.push_rows(vec![author_row(6, "cy")]);
    let author = Author::query().first(&mock).await.unwrap().unwrap();

    let (sql, params) = Comment::query()
        .reviewer_id_eq(&author)
        .unwrap()
        .post_id_in(author.posts())
        .to_count_sql();
    assert_eq!(
        sql,
        r#"SELECT COUNT("id") FROM "comment" WHERE "reviewer_id" = $1 AND "post_id" IN (SELECT "id" FROM "post" WHERE "author_id" = $2)"#
    );
    assert_eq!(params, [Value::Int64(6), Value::Int64(6)]);
}

#[test]
fn filters_and_bulk_setters_reject_unsaved_rows() {
    let unsaved = Author::new("x".to_string(), None);

    let err = Post::query().author_id_eq(&unsaved).unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));
    assert!(Post::query().author_id_ne(&unsaved).is_err());

    let err = Comment::query()
        .update()
        .set_reviewer_id(Some(&unsaved))
        .unwrap_err();
    assert!(matches!(err, OrmError::Configuration(_)));
    assert!(Post::query().update().set_author_id(&unsaved).is_err());
}

#[tokio::test]
async fn bulk_setter_binds_the_related_key() {
    let mock = MockClient::new();
    mock.push_rows(vec![author_row(9, "di")]);
    let author = Author::query().first(&mock).await.unwrap().unwrap();

    let (sql, params) = Comment::query()
        .id_eq(2)
        .update()
        .set_reviewer_id(Some(&author))
        .unwrap()
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"UPDATE "comment" SET "reviewer_id" = $1 WHERE "id" = $2"#
    );
    assert_eq!(params, [Value::Int64(9), Value::Int64(2)]);
}
