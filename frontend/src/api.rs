//! `fetch` wrappers for the task endpoints.

use shared::{CreateTaskRequest, MessageResponse, Task, UpdateTaskRequest, TASKS_PATH};
use uuid::Uuid;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Request, RequestInit, Response};

pub async fn fetch_tasks() -> Result<Vec<Task>, String> {
    let text = send("GET", TASKS_PATH, None).await?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

pub async fn create_task(request: &CreateTaskRequest) -> Result<Task, String> {
    let body = serde_json::to_string(request).map_err(|_| "Failed to serialize request")?;
    let text = send("POST", TASKS_PATH, Some(body)).await?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

pub async fn update_task(task_id: Uuid, request: &UpdateTaskRequest) -> Result<Task, String> {
    let body = serde_json::to_string(request).map_err(|_| "Failed to serialize request")?;
    let url = format!("{}/{}", TASKS_PATH, task_id);
    let text = send("PUT", &url, Some(body)).await?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

pub async fn delete_task(task_id: Uuid) -> Result<(), String> {
    let url = format!("{}/{}", TASKS_PATH, task_id);
    send("DELETE", &url, None).await.map(|_| ())
}

/// Issues one request and returns the response text. Non-2xx statuses are
/// errors carrying the server's `message` when it sent one.
async fn send(method: &str, url: &str, body: Option<String>) -> Result<String, String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = &body {
        opts.set_body(&JsValue::from_str(body));
    }

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|_| "Failed to create request")?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| "Failed to set header")?;
    }

    let promise = window()
        .ok_or("No window available")?
        .fetch_with_request(&request);

    let response: Response = JsFuture::from(promise)
        .await
        .map_err(|_| "Failed to send request")?
        .into();

    let text_promise = response.text().map_err(|_| "Failed to read response")?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| "Failed to get text")?
        .as_string()
        .ok_or("Failed to convert to string")?;

    if !response.ok() {
        let reason = serde_json::from_str::<MessageResponse>(&text)
            .map(|m| m.message)
            .unwrap_or(text);
        return Err(format!("{} {} returned {}: {}", method, url, response.status(), reason));
    }

    Ok(text)
}
