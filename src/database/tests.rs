use super::*;
use crate::auth::FirebaseUser;
use httpmock::prelude::*;
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Score {
    player: String,
    points: u32,
}

fn create_database(server: &MockServer, session: Session) -> FirebaseDatabase {
    let client = ClientBuilder::new(Client::new()).build();
    let base_url = Url::parse(&server.url("/")).unwrap();
    FirebaseDatabase::with_client(client, base_url, session)
}

fn signed_in_session() -> Session {
    let session = Session::new();
    session.set(FirebaseUser {
        local_id: "uid-1".to_string(),
        id_token: "id-token-1".to_string(),
        ..Default::default()
    });
    session
}

#[test]
fn test_reference_navigation() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    let scores = db.reference("/games//scores/");
    assert_eq!(scores.path(), "games/scores");
    assert_eq!(scores.key(), Some("scores"));

    let first = scores.child("first/");
    assert_eq!(first.path(), "games/scores/first");

    let games = scores.parent().unwrap();
    assert_eq!(games.path(), "games");
    let root = games.parent().unwrap();
    assert_eq!(root.path(), "");
    assert_eq!(root.key(), None);
    assert!(root.parent().is_none());
    assert_eq!(first.root().path(), "");

    assert_eq!(scores.to_string(), format!("{}games/scores", server.url("/")));
}

#[test]
fn test_new_uses_configured_url() {
    let config = FirebaseConfig::new("test-project", "api-key")
        .with_database_url("https://test-project-default-rtdb.europe-west1.firebasedatabase.app");
    let db = FirebaseDatabase::new(&config, Session::new()).unwrap();
    assert_eq!(
        db.url().as_str(),
        "https://test-project-default-rtdb.europe-west1.firebasedatabase.app/"
    );

    let default = FirebaseDatabase::new(&FirebaseConfig::new("test-project", "api-key"), Session::new())
        .unwrap();
    assert_eq!(default.url().as_str(), "https://test-project.firebaseio.com/");
}

#[tokio::test]
async fn test_read_signed_in() {
    let server = MockServer::start();
    let db = create_database(&server, signed_in_session());

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/games/scores/first.json")
            .query_param("print", "pretty")
            .query_param("auth", "id-token-1");
        then.status(200)
            .json_body(json!({ "player": "alice", "points": 42 }));
    });

    let score: Score = db
        .reference("games/scores/first")
        .read_as()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        score,
        Score {
            player: "alice".to_string(),
            points: 42
        }
    );
    mock.assert();
}

#[tokio::test]
async fn test_read_root_anonymous() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/.json")
            .query_param("print", "pretty")
            .query_param_missing("auth");
        then.status(200).body("{\n  \"a\" : 1\n}");
    });

    let body = db.root().read().await.unwrap();
    assert_eq!(body, "{\n  \"a\" : 1\n}");
    mock.assert();
}

#[tokio::test]
async fn test_read_missing_node() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    server.mock(|when, then| {
        when.method(GET).path("/nothing.json");
        then.status(200).body("null");
    });

    let value: Option<Score> = db.reference("nothing").read_as().await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn test_write_and_update() {
    let server = MockServer::start();
    let db = create_database(&server, signed_in_session());

    let put_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/scores/alice.json")
            .query_param("auth", "id-token-1")
            .json_body(json!({ "player": "alice", "points": 1 }));
        then.status(200)
            .json_body(json!({ "player": "alice", "points": 1 }));
    });

    let patch_mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/scores/alice.json")
            .json_body(json!({ "points": 2 }));
        then.status(200).json_body(json!({ "points": 2 }));
    });

    let alice = db.reference("scores/alice");
    alice
        .write(&Score {
            player: "alice".to_string(),
            points: 1,
        })
        .await
        .unwrap();
    alice.update(&json!({ "points": 2 })).await.unwrap();

    put_mock.assert();
    patch_mock.assert();
}

#[tokio::test]
async fn test_write_raw_rejects_invalid_json() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    let mock = server.mock(|when, then| {
        when.method(PUT).path("/flags.json");
        then.status(200).body("true");
    });

    let flags = db.reference("flags");
    assert!(matches!(
        flags.write_raw("{not json").await,
        Err(DatabaseError::SerializationError(_))
    ));
    mock.assert_hits(0);

    flags.write_raw("true").await.unwrap();
    mock.assert_hits(1);
}

#[tokio::test]
async fn test_push_returns_generated_key() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/messages.json")
            .json_body(json!({ "text": "hi" }));
        then.status(200).json_body(json!({ "name": "-NabcDEF123" }));
    });

    let key = db
        .reference("messages")
        .push(&json!({ "text": "hi" }))
        .await
        .unwrap();
    assert_eq!(key, "-NabcDEF123");
    mock.assert();
}

#[tokio::test]
async fn test_delete() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/scores/alice.json");
        then.status(200).body("null");
    });

    db.reference("scores/alice").delete().await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_unauthorized_and_api_errors() {
    let server = MockServer::start();
    let db = create_database(&server, Session::new());

    server.mock(|when, then| {
        when.method(GET).path("/private.json");
        then.status(401)
            .json_body(json!({ "error": "Permission denied" }));
    });

    server.mock(|when, then| {
        when.method(PUT).path("/big.json");
        then.status(400)
            .json_body(json!({ "error": "Invalid data; couldn't parse JSON object." }));
    });

    assert!(matches!(
        db.reference("private").read().await,
        Err(DatabaseError::Unauthorized)
    ));

    match db.reference("big").write(&json!(1)).await {
        Err(DatabaseError::ApiError(message)) => {
            assert!(message.contains("couldn't parse JSON object"))
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
