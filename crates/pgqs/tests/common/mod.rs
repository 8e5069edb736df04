//! Entities shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pgqs::{Entity, Row, RowState, Value};

#[derive(Debug, Clone, Entity)]
#[orm(table = "author")]
#[orm(has_many(Post, foreign_key = "author_id"))]
pub struct Author {
    #[orm(id, auto)]
    id: i64,
    pub name: String,
    pub email: Option<String>,
    state: RowState,
}

#[derive(Debug, Clone, Entity)]
#[orm(table = "post")]
#[orm(has_many(Comment, foreign_key = "post_id", method = "comments"))]
pub struct Post {
    #[orm(id, auto)]
    id: i64,
    #[orm(foreign_key = Author)]
    pub author_id: i64,
    pub title: String,
    pub published: bool,
    pub score: f64,
    pub tags: Option<Vec<String>>,
    #[orm(auto)]
    created_at: DateTime<Utc>,
    state: RowState,
}

#[derive(Debug, Clone, Entity)]
#[orm(table = "comment")]
pub struct Comment {
    #[orm(id, auto)]
    id: i64,
    #[orm(foreign_key = Post)]
    pub post_id: i64,
    #[orm(foreign_key = Author)]
    pub reviewer_id: Option<i64>,
    pub body: String,
    state: RowState,
}

/// Caller-supplied primary key, nothing read back on insert.
#[derive(Debug, Clone, Entity)]
#[orm(table = "tag")]
pub struct Tag {
    #[orm(id)]
    pub slug: String,
    pub label: String,
    state: RowState,
}

pub const POST_COLUMNS: &str =
    r#""id","author_id","title","published","score","tags","created_at""#;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

pub fn author_row(id: i64, name: &str) -> Row {
    Row::from(vec![Value::Int64(id), Value::from(name), Value::Null])
}

pub fn post_row(id: i64, author_id: i64, title: &str) -> Row {
    Row::from(vec![
        Value::Int64(id),
        Value::Int64(author_id),
        Value::from(title),
        Value::Bool(true),
        Value::Float64(1.5),
        Value::Null,
        Value::DateTime(ts(1_700_000_000)),
    ])
}

pub fn returning_row(id: i64, created_at: DateTime<Utc>) -> Row {
    Row::from(vec![Value::Int64(id), Value::DateTime(created_at)])
}
