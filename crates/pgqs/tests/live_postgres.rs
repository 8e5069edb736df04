//! Round trip against a real PostgreSQL server.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honored). All
//! tables are temporary, so nothing outlives the connection.

mod common;

use common::{Author, Comment, Post, Tag};
use pgqs::monitor::{InstrumentedClient, MonitorConfig, StatsMonitor};
use pgqs::{Entity, GenericClient, RowState};
use std::sync::Arc;
use tokio_postgres::NoTls;

const SCHEMA: &str = r#"
    CREATE TEMP TABLE author (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT
    );
    CREATE TEMP TABLE post (
        id BIGSERIAL PRIMARY KEY,
        author_id BIGINT NOT NULL REFERENCES author (id),
        title TEXT NOT NULL,
        published BOOLEAN NOT NULL,
        score DOUBLE PRECISION NOT NULL,
        tags TEXT[],
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TEMP TABLE comment (
        id BIGSERIAL PRIMARY KEY,
        post_id BIGINT NOT NULL REFERENCES post (id),
        reviewer_id BIGINT REFERENCES author (id),
        body TEXT NOT NULL
    );
    CREATE TEMP TABLE tag (
        slug TEXT PRIMARY KEY,
        label TEXT NOT NULL
    );
    CREATE TEMP TABLE board (
        id BIGSERIAL PRIMARY KEY,
        cells TEXT[][] NOT NULL,
        weights DOUBLE PRECISION[][]
    );
"#;

#[derive(Debug, Clone, Entity)]
#[orm(table = "board")]
struct Board {
    #[orm(id, auto)]
    id: i64,
    cells: Vec<Vec<String>>,
    weights: Option<Vec<Vec<f64>>>,
    state: RowState,
}

async fn connect() -> Option<tokio_postgres::Client> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&url, NoTls)
        .await
        .expect("connect to DATABASE_URL");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {e}");
        }
    });
    client.batch_execute(SCHEMA).await.expect("create temp tables");
    Some(client)
}

#[tokio::test]
async fn full_round_trip() {
    let Some(client) = connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let stats = Arc::new(StatsMonitor::new());
    let db = InstrumentedClient::new(client)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone())
        .with_tag("live");

    let mut ann = Author::new("ann".to_string(), Some("ann@example.com".to_string()));
    ann.save(&db).await.unwrap();
    assert!(ann.id() > 0);

    let mut post = Post::new(0, "first".to_string(), true, 4.5, Some(vec!["db".to_string()]));
    post.set_author(&ann).unwrap();
    post.save(&db).await.unwrap();
    assert!(post.exists_in_db());

    let mut drafts = vec![
        Post::new(ann.id(), "draft a".to_string(), false, 1.0, None),
        Post::new(ann.id(), "draft b".to_string(), false, 2.0, None),
    ];
    Post::save_all(&db, &mut drafts).await.unwrap();
    assert!(drafts[0].id() < drafts[1].id());

    let mut comment = Comment::new(post.id(), None, "nice".to_string());
    comment.set_reviewer(Some(&ann)).unwrap();
    comment.save(&db).await.unwrap();

    assert_eq!(ann.posts().count(&db).await.unwrap(), 3);
    assert_eq!(
        ann.posts()
            .published_eq(false)
            .order_by_score_desc()
            .all(&db)
            .await
            .unwrap()
            .iter()
            .map(|p| p.title.as_str())
            .collect::<Vec<_>>(),
        ["draft b", "draft a"]
    );

    let loaded = Post::query()
        .id_eq(post.id())
        .for_update()
        .first(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.tags.as_deref(), Some(&["db".to_string()][..]));
    assert_eq!(loaded.get_author(&db).await.unwrap().unwrap().name, "ann");
    assert_eq!(post.comments().count(&db).await.unwrap(), 1);
    assert_eq!(
        Comment::query()
            .post_id_in(ann.posts().published_eq(true))
            .count(&db)
            .await
            .unwrap(),
        1
    );

    let published = Post::query()
        .author_id_eq(&ann)
        .unwrap()
        .update()
        .set_published(true)
        .set_tags(None::<Vec<String>>)
        .exec(&db)
        .await
        .unwrap();
    assert_eq!(published, 3);
    assert_eq!(
        Post::query().tags_is_null().count(&db).await.unwrap(),
        3
    );

    assert_eq!(comment.delete(&db).await.unwrap(), 1);
    assert!(!comment.exists_in_db());
    assert_eq!(
        Post::query()
            .id_in([drafts[0].id(), drafts[1].id()])
            .delete(&db)
            .await
            .unwrap(),
        2
    );

    let mut tag = Tag::new("pg".to_string(), "Postgres".to_string());
    tag.save(&db).await.unwrap();
    tag.label = "PostgreSQL".to_string();
    tag.save(&db).await.unwrap();
    let stored = Tag::query().slug_eq("pg").first(&db).await.unwrap().unwrap();
    assert_eq!(stored.label, "PostgreSQL");

    let raw = db
        .query_opt("SELECT COUNT(*) FROM tag", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(raw.get::<i64>(0).unwrap(), 1);

    let summary = stats.stats();
    assert_eq!(summary.failed_queries, 0);
    assert!(summary.insert_count >= 4);
}

#[tokio::test]
async fn multidimensional_arrays_round_trip() {
    let Some(client) = connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let grid = vec![
        vec!["x".to_string(), "o".to_string()],
        vec!["o".to_string(), "x".to_string()],
    ];
    let mut board = Board::new(grid.clone(), Some(vec![vec![0.5, 1.5]]));
    board.save(&client).await.unwrap();

    let loaded = Board::query()
        .cells_eq(grid.clone())
        .first(&client)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id(), board.id());
    assert_eq!(loaded.cells, grid);
    assert_eq!(loaded.weights, Some(vec![vec![0.5, 1.5]]));

    let dims: String = client
        .query_one("SELECT array_dims(cells) FROM board", &[])
        .await
        .unwrap()
        .get(0);
    assert_eq!(dims, "[1:2][1:2]");

    let cleared = Board::query()
        .id_eq(board.id())
        .update()
        .set_weights(None::<Vec<Vec<f64>>>)
        .exec(&client)
        .await
        .unwrap();
    assert_eq!(cleared, 1);
    assert_eq!(Board::query().weights_is_null().count(&client).await.unwrap(), 1);
}
