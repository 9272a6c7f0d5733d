//! In-process mock of the Activities API for integration tests.
//!
//! Serves the numeric-id / ISO-due-date convention: create answers 200 with
//! the stored entity, and every miss answers 404 with the literal JSON
//! string `"Not found"`, matching the deployment the default configuration
//! targets.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    pub title: String,
    pub due_date: Value,
    pub completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityInput {
    title: String,
    due_date: Value,
    #[serde(default)]
    completed: bool,
}

#[derive(Clone)]
struct MockState {
    activities: Arc<RwLock<HashMap<u64, Activity>>>,
    next_id: Arc<AtomicU64>,
}

fn seeded_state() -> MockState {
    let mut activities = HashMap::new();
    for id in 1..=3u64 {
        activities.insert(
            id,
            Activity {
                id,
                title: format!("Activity {id}"),
                due_date: json!("2025-06-15T10:00:00.000Z"),
                completed: false,
            },
        );
    }
    MockState {
        activities: Arc::new(RwLock::new(activities)),
        next_id: Arc::new(AtomicU64::new(100)),
    }
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!("Not found")))
}

async fn list_activities(State(state): State<MockState>) -> Json<Vec<Activity>> {
    let activities = state.activities.read().await;
    let mut all: Vec<Activity> = activities.values().cloned().collect();
    all.sort_by_key(|activity| activity.id);
    Json(all)
}

async fn create_activity(
    State(state): State<MockState>,
    Json(input): Json<ActivityInput>,
) -> Json<Activity> {
    let activity = Activity {
        id: state.next_id.fetch_add(1, Ordering::SeqCst),
        title: input.title,
        due_date: input.due_date,
        completed: input.completed,
    };
    state.activities.write().await.insert(activity.id, activity.clone());
    Json(activity)
}

async fn get_activity(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<Activity>, (StatusCode, Json<Value>)> {
    let Ok(id) = id.parse::<u64>() else {
        return Err(not_found());
    };
    let activities = state.activities.read().await;
    activities.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_activity(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(input): Json<ActivityInput>,
) -> Result<Json<Activity>, (StatusCode, Json<Value>)> {
    let Ok(id) = id.parse::<u64>() else {
        return Err(not_found());
    };
    let mut activities = state.activities.write().await;
    let Some(activity) = activities.get_mut(&id) else {
        return Err(not_found());
    };
    activity.title = input.title;
    activity.due_date = input.due_date;
    activity.completed = input.completed;
    Ok(Json(activity.clone()))
}

async fn delete_activity(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<Activity>, (StatusCode, Json<Value>)> {
    let Ok(id) = id.parse::<u64>() else {
        return Err(not_found());
    };
    let mut activities = state.activities.write().await;
    activities.remove(&id).map(Json).ok_or_else(not_found)
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    Json(json!("ok"))
}

pub fn app() -> Router {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/{id}",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/slow", get(slow))
        .with_state(seeded_state())
}

/// Start the mock on an ephemeral port and return its base URL.
pub async fn spawn() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock local addr");
    tokio::spawn(async move {
        axum::serve(listener, app()).await.expect("serve mock");
    });
    format!("http://{addr}")
}
