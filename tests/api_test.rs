use kickoff_back::routes;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;

mod common;
use common::{ADMIN_TOKEN, TestApp, spawn_state};

/// Serve the full router on an ephemeral port and return its base URL.
async fn serve(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let router = routes::router(app.state.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{address}")
}

fn session_body(max_teams: u32) -> Value {
    json!({
        "kind": "five_a_side",
        "starts_at": "2030-06-12T18:00:00Z",
        "ends_at": "2030-06-12T20:00:00Z",
        "max_teams": max_teams,
    })
}

#[tokio::test]
async fn healthcheck_reports_ok() {
    let app = spawn_state().await;
    let base = serve(&app).await;

    let response = Client::new()
        .get(format!("{base}/healthcheck"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn healthcheck_reports_degraded_without_store() {
    let app = spawn_state().await;
    app.state.clear_store().await;
    let base = serve(&app).await;

    let body: Value = Client::new()
        .get(format!("{base}/healthcheck"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn organizer_routes_require_the_admin_token() {
    let app = spawn_state().await;
    let base = serve(&app).await;
    let client = Client::new();

    let anonymous = client
        .post(format!("{base}/sessions"))
        .json(&session_body(4))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .post(format!("{base}/sessions"))
        .header("x-admin-token", "guess")
        .json(&session_body(4))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let created = client
        .post(format!("{base}/sessions"))
        .header("x-admin-token", ADMIN_TOKEN)
        .json(&session_body(4))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = created.json().await.unwrap();
    assert_eq!(body["status"], "planned");
    assert_eq!(body["squad_size"], 7);

    let listed: Value = client
        .get(format!("{base}/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn zero_max_teams_is_a_bad_request() {
    let app = spawn_state().await;
    let base = serve(&app).await;

    let response = Client::new()
        .post(format!("{base}/sessions"))
        .header("x-admin-token", ADMIN_TOKEN)
        .json(&session_body(0))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_session_answers_conflict() {
    let app = spawn_state().await;
    let base = serve(&app).await;
    let client = Client::new();

    let session: Value = client
        .post(format!("{base}/sessions"))
        .header("x-admin-token", ADMIN_TOKEN)
        .json(&session_body(1))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = session["id"].as_str().unwrap().to_string();

    let mut registered = Vec::new();
    for index in 0..8 {
        let participant: Value = client
            .post(format!("{base}/participants/channel"))
            .json(&json!({
                "channel_id": format!("chat-{index}"),
                "display_name": format!("player {index}"),
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let response = client
            .post(format!("{base}/sessions/{session_id}/registrations"))
            .json(&json!({ "participant_id": participant["id"] }))
            .send()
            .await
            .unwrap();
        registered.push(response.status());
        if response.status() == StatusCode::CREATED {
            let registration: Value = response.json().await.unwrap();
            let approval = client
                .post(format!(
                    "{base}/registrations/{}/approve",
                    registration["id"].as_str().unwrap()
                ))
                .header("x-admin-token", ADMIN_TOKEN)
                .send()
                .await
                .unwrap();
            assert_eq!(approval.status(), StatusCode::OK);
        }
    }

    assert!(registered[..7].iter().all(|status| *status == StatusCode::CREATED));
    assert_eq!(registered[7], StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = spawn_state().await;
    let base = serve(&app).await;

    let response = Client::new()
        .get(format!("{base}/sessions/{}", uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
