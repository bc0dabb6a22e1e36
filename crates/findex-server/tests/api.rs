use dotenv::var;
use tokio_postgres::{self as pg, error::SqlState, NoTls};

// Store-level checks against a live findex database; run with
// `cargo test -- --ignored` once schema.sql has been applied.

async fn connect() -> pg::Client {
    let (pg_client, pg_conn) = pg::connect(
        &var("DATABASE_URL").expect("environment variable DATABASE_URL"),
        NoTls,
    )
    .await
    .unwrap();

    tokio::spawn(async move {
        if let Err(err) = pg_conn.await {
            panic!("database connection error: {}", err)
        }
    });

    pg_client
}

async fn insert_test_user(pg_client: &pg::Client, email: &str) -> i32 {
    pg_client
        .query_one(
            "INSERT INTO users (username, email, hashed_password, provider)
             VALUES ($1, $2, NULL, NULL) RETURNING id",
            &[&"integration-test", &email],
        )
        .await
        .unwrap()
        .get(0)
}

fn unique_email(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{tag}-{nanos}@test.local")
}

#[tokio::test]
#[ignore = "requires a live findex database"]
async fn tracking_the_same_pair_twice_conflicts() {
    let pg_client = connect().await;
    let user_id = insert_test_user(&pg_client, &unique_email("track")).await;

    for cik in [111, 222] {
        pg_client
            .execute(
                "INSERT INTO user_companies (user_id, cik) VALUES ($1, $2)",
                &[&user_id, &cik],
            )
            .await
            .unwrap();
    }

    // the second insert of an existing pair must surface a unique violation
    let err = pg_client
        .execute(
            "INSERT INTO user_companies (user_id, cik) VALUES ($1, $2)",
            &[&user_id, &111],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::UNIQUE_VIOLATION));

    let count: i64 = pg_client
        .query_one(
            "SELECT COUNT(*) FROM user_companies WHERE user_id = $1",
            &[&user_id],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(count, 2);

    // untracking a never-tracked pair is a no-op, not an error
    let deleted = pg_client
        .execute(
            "DELETE FROM user_companies WHERE user_id = $1 AND cik = $2",
            &[&user_id, &999],
        )
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    pg_client
        .execute("DELETE FROM user_companies WHERE user_id = $1", &[&user_id])
        .await
        .unwrap();
    pg_client
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a live findex database"]
async fn account_deletion_cascades_over_tracked_rows() {
    let mut pg_client = connect().await;
    let user_id = insert_test_user(&pg_client, &unique_email("delete")).await;
    for cik in [111, 222] {
        pg_client
            .execute(
                "INSERT INTO user_companies (user_id, cik) VALUES ($1, $2)",
                &[&user_id, &cik],
            )
            .await
            .unwrap();
    }

    // owned rows first, then the account, in one transaction
    let tx = pg_client.transaction().await.unwrap();
    tx.execute("DELETE FROM user_companies WHERE user_id = $1", &[&user_id])
        .await
        .unwrap();
    let deleted = tx
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(deleted, 1);

    let tracked: i64 = pg_client
        .query_one(
            "SELECT COUNT(*) FROM user_companies WHERE user_id = $1",
            &[&user_id],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(tracked, 0);

    // a second deletion finds nothing to remove
    let deleted = pg_client
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
#[ignore = "requires a live findex database"]
async fn emails_are_unique_across_accounts() {
    let pg_client = connect().await;
    let email = unique_email("duplicate");
    let user_id = insert_test_user(&pg_client, &email).await;

    let err = pg_client
        .execute(
            "INSERT INTO users (username, email, hashed_password, provider)
             VALUES ($1, $2, NULL, NULL)",
            &[&"integration-test", &email],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::UNIQUE_VIOLATION));

    pg_client
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await
        .unwrap();
}
