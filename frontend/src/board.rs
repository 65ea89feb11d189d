//! Browser-independent state of the task page.

use shared::{CreateTaskRequest, NewTask, Task, TaskCounts, UpdateTaskRequest, ValidationError};
use uuid::Uuid;

pub const ADD_LABEL: &str = "Add Task";
pub const UPDATE_LABEL: &str = "Update Task";

/// A user action that talks to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Save,
    Update,
    Delete,
}

impl Action {
    pub fn failure_message(self) -> &'static str {
        match self {
            Action::Load => "Failed to load tasks. Please refresh the page.",
            Action::Save => "Failed to save task. Please try again.",
            Action::Update => "Failed to update task. Please try again.",
            Action::Delete => "Failed to delete task. Please try again.",
        }
    }
}

/// What submitting the form should send.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(CreateTaskRequest),
    Update(Uuid, UpdateTaskRequest),
}

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    form_title: String,
    form_description: String,
    editing: Option<Uuid>,
}

impl TaskBoard {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(&self.tasks)
    }

    pub fn form_title(&self) -> &str {
        &self.form_title
    }

    pub fn form_description(&self) -> &str {
        &self.form_description
    }

    pub fn set_form_title(&mut self, value: String) {
        self.form_title = value;
    }

    pub fn set_form_description(&mut self, value: String) {
        self.form_description = value;
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            UPDATE_LABEL
        } else {
            ADD_LABEL
        }
    }

    /// Validates the form. Blank titles never leave the browser.
    pub fn submission(&self) -> Result<Submission, ValidationError> {
        let new_task = NewTask::new(&self.form_title, &self.form_description)?;
        let task_title = new_task.title().to_string();
        let description = new_task.description().to_string();

        Ok(match self.editing {
            Some(task_id) => Submission::Update(
                task_id,
                UpdateTaskRequest {
                    title: Some(task_title),
                    description: Some(description),
                    completed: None,
                },
            ),
            None => Submission::Create(CreateTaskRequest {
                title: Some(task_title),
                description: Some(description),
            }),
        })
    }

    /// Loads a task into the form. Returns `false` for an unknown id.
    pub fn begin_edit(&mut self, task_id: Uuid) -> bool {
        let Some(task) = self.tasks.iter().find(|t| t.id == task_id) else {
            return false;
        };
        self.form_title = task.title.clone();
        self.form_description = task.description.clone();
        self.editing = Some(task_id);
        true
    }

    /// Leaves edit mode and clears the form.
    pub fn reset_form(&mut self) {
        self.editing = None;
        self.form_title.clear();
        self.form_description.clear();
    }

    /// The update that flips a task's completion.
    pub fn toggle_request(&self, task_id: Uuid) -> Option<UpdateTaskRequest> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|task| UpdateTaskRequest {
                completed: Some(!task.completed),
                ..Default::default()
            })
    }
}
