use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use shared::{NewTask, Task, TaskPatch};
use tasks_backend::store::{MemoryTaskStore, RedisTaskStore, StoreError, TaskStore};
use tasks_backend::{build_router, AppState};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    store: Arc<MemoryTaskStore>,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Value>,
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Reply {
        send(&self.router, method, uri, body).await
    }
}

#[fixture]
fn app() -> TestApp {
    let store = Arc::new(MemoryTaskStore::new());
    let router = build_router(AppState::new(store.clone()), None);
    TestApp { router, store }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Reply {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    Reply {
        status,
        headers,
        body,
    }
}

fn message(reply: &Reply) -> &str {
    reply.body.as_ref().unwrap()["message"].as_str().unwrap()
}

fn task_of(reply: &Reply) -> Task {
    serde_json::from_value(reply.body.clone().unwrap()).unwrap()
}

mod crud {
    use super::*;

    #[rstest]
    #[tokio::test]
    async fn end_to_end_lifecycle(app: TestApp) {
        let before: DateTime<Utc> = Utc::now();

        let created = app
            .send("POST", "/api/tasks", Some(json!({"title": "Buy milk"})))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let task = task_of(&created);
        assert!(!task.completed);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(task.created_at >= before);

        let listed = app.send("GET", "/api/tasks", None).await;
        assert_eq!(listed.status, StatusCode::OK);
        let tasks: Vec<Task> = serde_json::from_value(listed.body.unwrap()).unwrap();
        assert_eq!(tasks.first(), Some(&task));

        let path = format!("/api/tasks/{}", task.id);
        let updated = app.send("PUT", &path, Some(json!({"completed": true}))).await;
        assert_eq!(updated.status, StatusCode::OK);

        let fetched = app.send("GET", &path, None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        let fetched = task_of(&fetched);
        assert!(fetched.completed);
        assert_eq!(fetched.title, task.title);
        assert_eq!(fetched.created_at, task.created_at);

        let deleted = app.send("DELETE", &path, None).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(message(&deleted), "Task deleted successfully");

        let gone = app.send("GET", &path, None).await;
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
        assert_eq!(message(&gone), "Task not found");
    }

    #[rstest]
    #[tokio::test]
    async fn get_after_create_returns_equal_task(app: TestApp) {
        let created = app
            .send(
                "POST",
                "/api/tasks",
                Some(json!({"title": "  Write report ", "description": " quarterly "})),
            )
            .await;
        let task = task_of(&created);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "quarterly");

        let fetched = app.send("GET", &format!("/api/tasks/{}", task.id), None).await;

        assert_eq!(task_of(&fetched), task);
    }

    #[rstest]
    #[tokio::test]
    async fn list_is_newest_first(app: TestApp) {
        let now = Utc::now();
        for (title, minutes_ago) in [("middle", 5), ("newest", 0), ("oldest", 10)] {
            let mut task = Task::new(NewTask::new(title, "").unwrap());
            task.created_at = now - chrono::Duration::minutes(minutes_ago);
            app.store.insert(task).await;
        }

        let listed = app.send("GET", "/api/tasks", None).await;
        let titles: Vec<String> = serde_json::from_value::<Vec<Task>>(listed.body.unwrap())
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();

        assert_eq!(titles, ["newest", "middle", "oldest"]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_list_is_an_empty_array(app: TestApp) {
        let listed = app.send("GET", "/api/tasks", None).await;

        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body, Some(json!([])));
    }

    #[rstest]
    #[tokio::test]
    async fn trailing_slash_reaches_the_same_routes(app: TestApp) {
        let created = app
            .send("POST", "/api/tasks/", Some(json!({"title": "Slashed"})))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let task = task_of(&created);

        let listed = app.send("GET", "/api/tasks/", None).await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.body, Some(json!([created.body.unwrap()])));

        let path = format!("/api/tasks/{}/", task.id);
        let fetched = app.send("GET", &path, None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(task_of(&fetched), task);

        let deleted = app.send("DELETE", &path, None).await;
        assert_eq!(deleted.status, StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn partial_update_leaves_absent_fields(app: TestApp) {
        let task = task_of(
            &app.send(
                "POST",
                "/api/tasks",
                Some(json!({"title": "Plan trip", "description": "book hotel"})),
            )
            .await,
        );
        let path = format!("/api/tasks/{}", task.id);

        let updated = task_of(&app.send("PUT", &path, Some(json!({"description": "book train"}))).await);

        assert_eq!(updated.title, "Plan trip");
        assert_eq!(updated.description, "book train");
        assert!(!updated.completed);
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
    }
}

mod validation {
    use super::*;

    #[rstest]
    #[case::missing_title(json!({"description": "no title"}))]
    #[case::empty_title(json!({"title": ""}))]
    #[case::blank_title(json!({"title": "   "}))]
    #[case::wrong_type(json!({"title": 42}))]
    #[tokio::test]
    async fn create_rejects_invalid_body_and_persists_nothing(app: TestApp, #[case] body: Value) {
        let reply = app.send("POST", "/api/tasks", Some(body)).await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(!message(&reply).is_empty());
        assert_eq!(app.store.len().await, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_malformed_json(app: TestApp) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/tasks")
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.store.len().await, 0);
    }

    #[rstest]
    #[case::blank_title(json!({"title": " "}))]
    #[case::wrong_completed_type(json!({"completed": "yes"}))]
    #[tokio::test]
    async fn update_rejects_invalid_body(app: TestApp, #[case] body: Value) {
        let task = task_of(&app.send("POST", "/api/tasks", Some(json!({"title": "Keep me"}))).await);

        let reply = app
            .send("PUT", &format!("/api/tasks/{}", task.id), Some(body))
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let stored = app.store.get(task.id).await.unwrap().unwrap();
        assert_eq!(stored, task);
    }
}

mod not_found {
    use super::*;

    #[rstest]
    #[case::get("GET", None)]
    #[case::put("PUT", Some(json!({"completed": true})))]
    #[case::delete("DELETE", None)]
    #[tokio::test]
    async fn unknown_id_is_not_found(app: TestApp, #[case] method: &str, #[case] body: Option<Value>) {
        let reply = app
            .send(method, &format!("/api/tasks/{}", Uuid::new_v4()), body)
            .await;

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(message(&reply), "Task not found");
    }

    #[rstest]
    #[case::get("GET")]
    #[case::delete("DELETE")]
    #[tokio::test]
    async fn malformed_id_is_not_found(app: TestApp, #[case] method: &str) {
        let reply = app.send(method, "/api/tasks/not-a-real-id", None).await;

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(message(&reply), "Task not found");
    }

    #[rstest]
    #[case::unknown_path("GET", "/api/projects")]
    #[case::nested_too_deep("GET", "/api/tasks/abc/comments")]
    #[case::unsupported_method_on_collection("PATCH", "/api/tasks")]
    #[case::post_to_item("POST", "/api/tasks/5f0c6f0e-8d0e-4b7a-9a55-2f1f0a4c9e11")]
    #[tokio::test]
    async fn other_routes_are_not_found(app: TestApp, #[case] method: &str, #[case] uri: &str) {
        let reply = app.send(method, uri, None).await;

        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(message(&reply), "Route not found");
    }
}

mod cors {
    use super::*;

    #[rstest]
    #[case::collection("/api/tasks")]
    #[case::item("/api/tasks/anything")]
    #[case::unknown("/nowhere")]
    #[tokio::test]
    async fn options_answers_empty_200(app: TestApp, #[case] uri: &str) {
        let reply = app.send("OPTIONS", uri, None).await;

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.is_none());
        assert_eq!(reply.headers["access-control-allow-origin"], "*");
        let methods = reply.headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("PUT") && methods.contains("DELETE"));
        let headers = reply.headers["access-control-allow-headers"].to_str().unwrap();
        assert!(headers.to_ascii_lowercase().contains("content-type"));
    }

    #[rstest]
    #[case::ok("GET", "/api/tasks")]
    #[case::not_found("GET", "/api/tasks/missing")]
    #[case::route_not_found("GET", "/elsewhere")]
    #[tokio::test]
    async fn every_response_carries_cors_headers(app: TestApp, #[case] method: &str, #[case] uri: &str) {
        let reply = app.send(method, uri, None).await;

        assert_eq!(reply.headers["access-control-allow-origin"], "*");
        assert!(reply.headers.contains_key("access-control-allow-methods"));
        assert!(reply.headers.contains_key("access-control-allow-headers"));
    }
}

mod failures {
    use super::*;

    struct ExplodingStore;

    #[async_trait]
    impl TaskStore for ExplodingStore {
        async fn list(&self) -> Result<Vec<Task>, StoreError> {
            panic!("store exploded");
        }

        async fn get(&self, _id: Uuid) -> Result<Option<Task>, StoreError> {
            panic!("store exploded");
        }

        async fn create(&self, _new_task: NewTask) -> Result<Task, StoreError> {
            panic!("store exploded");
        }

        async fn update(&self, _id: Uuid, _patch: TaskPatch) -> Result<Option<Task>, StoreError> {
            panic!("store exploded");
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, StoreError> {
            panic!("store exploded");
        }
    }

    fn unconfigured_redis() -> Router {
        let store = Arc::new(RedisTaskStore::new(None, Duration::from_millis(100)));
        build_router(AppState::new(store), None)
    }

    #[rstest]
    #[case::list("GET", "/api/tasks", None)]
    #[case::create("POST", "/api/tasks", Some(json!({"title": "Buy milk"})))]
    #[case::get("GET", "/api/tasks/5f0c6f0e-8d0e-4b7a-9a55-2f1f0a4c9e11", None)]
    #[tokio::test]
    async fn missing_connection_string_is_a_500(
        #[case] method: &str,
        #[case] uri: &str,
        #[case] body: Option<Value>,
    ) {
        let reply = send(&unconfigured_redis(), method, uri, body).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message(&reply).contains("REDIS_URL"));
        assert_eq!(reply.headers["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn preflight_still_works_without_a_store() {
        let reply = send(&unconfigured_redis(), "OPTIONS", "/api/tasks", None).await;

        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn panics_become_json_500() {
        let router = build_router(AppState::new(Arc::new(ExplodingStore)), None);

        let reply = send(&router, "GET", "/api/tasks", None).await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message(&reply), "store exploded");
        assert_eq!(reply.headers["access-control-allow-origin"], "*");
    }
}
