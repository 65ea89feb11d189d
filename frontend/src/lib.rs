use chrono::{DateTime, Utc};
use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{Task, ValidationError};
use uuid::Uuid;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{console, window, HtmlElement, ScrollBehavior, ScrollToOptions};

pub mod api;
pub mod board;

use board::{Action, Submission, TaskBoard};

const TITLE_INPUT_ID: &str = "task-title";

#[derive(Debug, Clone)]
pub enum Msg {
    LoadTasks,
    TasksLoaded(Vec<Task>),
    SetTitle(String),
    SetDescription(String),
    Submit,
    Saved,
    ToggleTask(Uuid),
    EditTask(Uuid),
    CancelEdit,
    DeleteTask(Uuid),
    Failed(Action, String),
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    board: TaskBoard,
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        Cmd::new(async { Msg::LoadTasks })
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::LoadTasks => Cmd::new(async {
                match api::fetch_tasks().await {
                    Ok(tasks) => Msg::TasksLoaded(tasks),
                    Err(e) => Msg::Failed(Action::Load, e),
                }
            }),
            Msg::TasksLoaded(tasks) => {
                self.board.replace_tasks(tasks);
                Cmd::none()
            }
            Msg::SetTitle(task_title) => {
                self.board.set_form_title(task_title);
                Cmd::none()
            }
            Msg::SetDescription(description) => {
                self.board.set_form_description(description);
                Cmd::none()
            }
            Msg::Submit => match self.board.submission() {
                Err(ValidationError::TitleRequired) => {
                    alert("Please enter a task title");
                    Cmd::none()
                }
                Ok(submission) => Cmd::new(async move {
                    let saved = match &submission {
                        Submission::Create(request) => api::create_task(request).await.map(drop),
                        Submission::Update(task_id, request) => {
                            api::update_task(*task_id, request).await.map(drop)
                        }
                    };
                    match saved {
                        Ok(()) => Msg::Saved,
                        Err(e) => Msg::Failed(Action::Save, e),
                    }
                }),
            },
            Msg::Saved => {
                self.board.reset_form();
                Cmd::new(async { Msg::LoadTasks })
            }
            Msg::ToggleTask(task_id) => match self.board.toggle_request(task_id) {
                Some(request) => Cmd::new(async move {
                    match api::update_task(task_id, &request).await {
                        Ok(_) => Msg::LoadTasks,
                        Err(e) => Msg::Failed(Action::Update, e),
                    }
                }),
                None => Cmd::none(),
            },
            Msg::EditTask(task_id) => {
                if self.board.begin_edit(task_id) {
                    focus_title_input();
                }
                Cmd::none()
            }
            Msg::CancelEdit => {
                self.board.reset_form();
                Cmd::none()
            }
            Msg::DeleteTask(task_id) => {
                if !confirm("Are you sure you want to delete this task?") {
                    return Cmd::none();
                }
                Cmd::new(async move {
                    match api::delete_task(task_id).await {
                        Ok(()) => Msg::LoadTasks,
                        Err(e) => Msg::Failed(Action::Delete, e),
                    }
                })
            }
            Msg::Failed(action, error) => {
                console::error_1(&format!("{:?} failed: {}", action, error).into());
                alert(action.failure_message());
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                header([class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")], [
                    div([class("max-w-4xl mx-auto px-6 py-4")], [
                        h1([class("text-2xl font-bold text-ctp-text")], [text("Task Manager")]),
                    ]),
                ]),
                div(
                    [class("max-w-4xl mx-auto px-6 py-8 space-y-8")],
                    [self.view_stats(), self.view_form(), self.view_task_list()],
                ),
            ],
        )
    }
}

impl Model {
    fn view_stats(&self) -> Node<Msg> {
        let counts = self.board.counts();
        div([class("grid grid-cols-1 md:grid-cols-3 gap-6")], [
            self.stat_card("Total Tasks", "total-tasks", counts.total),
            self.stat_card("Pending", "pending-tasks", counts.pending),
            self.stat_card("Completed", "completed-tasks", counts.completed),
        ])
    }

    fn stat_card(&self, card_title: &str, element_id: &'static str, count: usize) -> Node<Msg> {
        div([class("bg-ctp-surface1 rounded-lg p-6 border border-ctp-surface2")], [
            p([class("text-sm font-medium text-ctp-subtext0")], [text(card_title)]),
            p([id(element_id), class("text-2xl font-bold text-ctp-text mt-1")], [text(count.to_string())]),
        ])
    }

    fn view_form(&self) -> Node<Msg> {
        let editing = self.board.editing().is_some();
        div(
            [class("p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2")],
            [
                h2([class("text-xl font-semibold text-ctp-text mb-4 pb-2 border-b border-ctp-surface2")], [
                    text(if editing { "Edit Task" } else { "Add New Task" }),
                ]),
                div([class("space-y-4")], [
                    input([
                        id(TITLE_INPUT_ID),
                        r#type("text"),
                        placeholder("Task title"),
                        value(self.board.form_title().to_string()),
                        on_input(|event| Msg::SetTitle(event.value())),
                        class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent"),
                    ], []),
                    textarea([
                        placeholder("Task description (optional)"),
                        value(self.board.form_description().to_string()),
                        on_input(|event| Msg::SetDescription(event.value())),
                        class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text placeholder-ctp-subtext0 focus:outline-none focus:ring-2 focus:ring-ctp-blue focus:border-transparent h-20 resize-y"),
                    ], []),
                    div([class("flex gap-2")], [
                        button([
                            r#type("button"),
                            on_click(|_| Msg::Submit),
                            class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                        ], [text(self.board.submit_label())]),
                        if editing {
                            button([
                                r#type("button"),
                                on_click(|_| Msg::CancelEdit),
                                class("bg-ctp-surface2 hover:bg-ctp-overlay0 text-ctp-text font-medium px-6 py-2 rounded-md transition-colors duration-200"),
                            ], [text("Cancel")])
                        } else {
                            span([], [])
                        },
                    ]),
                ]),
            ],
        )
    }

    fn view_task_list(&self) -> Node<Msg> {
        if self.board.is_empty() {
            return div([id("empty-state"), class("text-center py-12")], [
                div([class("text-ctp-overlay0 text-6xl mb-4")], [text("📝")]),
                h3([class("text-lg font-medium text-ctp-text mb-2")], [text("No tasks yet")]),
                p([class("text-ctp-subtext0")], [text("Create your first task above to get started!")]),
            ]);
        }

        div(
            [id("task-list"), class("space-y-4")],
            self.board
                .tasks()
                .iter()
                .map(|task| self.view_task(task, &format_created_at(&task.created_at)))
                .collect::<Vec<_>>(),
        )
    }

    /// Task text goes into text nodes only, so markup in a title is shown as typed.
    fn view_task(&self, task: &Task, created_label: &str) -> Node<Msg> {
        let task_id = task.id;
        div(
            [
                key(task.id.to_string()),
                class(&format!(
                    "flex gap-4 border rounded-xl p-6 bg-ctp-surface0 shadow-sm {}",
                    if task.completed {
                        "border-ctp-green bg-ctp-green/10"
                    } else {
                        "border-ctp-surface1 hover:border-ctp-blue"
                    }
                )),
            ],
            [
                input([
                    r#type("checkbox"),
                    checked(task.completed),
                    on_click(move |_| Msg::ToggleTask(task_id)),
                    class("mt-1 w-5 h-5"),
                ], []),
                div([class("flex-1 min-w-0")], [
                    h3([class(if task.completed {
                        "text-lg font-semibold line-through text-ctp-overlay1"
                    } else {
                        "text-lg font-semibold text-ctp-text"
                    })], [text(&task.title)]),
                    if task.description.is_empty() {
                        span([], [])
                    } else {
                        p([class("text-sm text-ctp-subtext1 break-words")], [text(&task.description)])
                    },
                    p([class("text-xs text-ctp-subtext0 mt-2")], [
                        text(format!("Created: {}", created_label)),
                    ]),
                    div([class("flex gap-2 mt-3")], [
                        button([
                            r#type("button"),
                            on_click(move |_| Msg::EditTask(task_id)),
                            class("bg-ctp-blue/20 text-ctp-blue hover:bg-ctp-blue/30 px-3 py-1 rounded-md text-sm"),
                        ], [text("Edit")]),
                        button([
                            r#type("button"),
                            on_click(move |_| Msg::DeleteTask(task_id)),
                            class("bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 px-3 py-1 rounded-md text-sm"),
                        ], [text("Delete")]),
                    ]),
                ]),
            ],
        )
    }
}

fn format_created_at(created_at: &DateTime<Utc>) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(created_at.timestamp_millis() as f64));
    let options = js_sys::Object::new();
    for (option, setting) in [
        ("month", "short"),
        ("day", "numeric"),
        ("year", "numeric"),
        ("hour", "2-digit"),
        ("minute", "2-digit"),
    ] {
        let _ = js_sys::Reflect::set(&options, &JsValue::from_str(option), &JsValue::from_str(setting));
    }
    date.to_locale_string("en-US", &options).into()
}

fn alert(message: &str) {
    if let Some(window) = window() {
        let _ = window.alert_with_message(message);
    }
}

fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

fn focus_title_input() {
    let Some(window) = window() else {
        return;
    };
    if let Some(title_input) = window
        .document()
        .and_then(|d| d.get_element_by_id(TITLE_INPUT_ID))
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let _ = title_input.focus();
    }
    let options = ScrollToOptions::new();
    options.set_top(0.0);
    options.set_behavior(ScrollBehavior::Smooth);
    window.scroll_to_with_scroll_to_options(&options);
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
