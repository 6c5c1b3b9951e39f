//! Scripted [`AnalysisBackend`] for exercising tracks and sessions on a
//! paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use malviz_analysis::{AnalysisApiError, AnalysisBackend};
use malviz_core::artifact::Artifact;
use malviz_core::job::JobKind;
use malviz_core::status::StatusResponse;
use malviz_core::types::TaskId;
use tokio::time::Instant;

pub(crate) fn running() -> StatusResponse {
    StatusResponse {
        status: Some(serde_json::json!("running")),
        data: None,
    }
}

pub(crate) fn completed() -> StatusResponse {
    StatusResponse {
        status: Some(serde_json::json!("completed")),
        data: None,
    }
}

pub(crate) fn reported() -> StatusResponse {
    StatusResponse {
        status: None,
        data: Some(serde_json::json!("reported")),
    }
}

pub(crate) fn artifact() -> Artifact {
    Artifact::single("sample.exe", b"MZ\x90\x00".to_vec()).unwrap()
}

#[derive(Debug, Clone)]
enum CreateReply {
    Task(TaskId),
    Rejected(u16),
}

#[derive(Debug)]
enum StatusScript {
    /// `running` until `at` after the backend was built, then `response`.
    CompleteAt { at: Duration, response: StatusResponse },
    /// Replies in order, the last one repeating. `None` is a failed query.
    Sequence(VecDeque<Option<StatusResponse>>),
}

#[derive(Default)]
struct Script {
    create: HashMap<JobKind, VecDeque<CreateReply>>,
    create_delay: HashMap<JobKind, Duration>,
    status: HashMap<TaskId, StatusScript>,
    create_calls: Vec<(JobKind, Instant)>,
    status_calls: Vec<(TaskId, Instant)>,
}

pub(crate) struct ScriptedBackend {
    epoch: Instant,
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            script: Mutex::new(Script::default()),
        }
    }

    /// Queue a task identifier for the next creation of `kind`. The last
    /// queued reply repeats.
    pub(crate) fn with_task(self, kind: JobKind, task_id: &str) -> Self {
        self.push_create(kind, CreateReply::Task(task_id.into()));
        self
    }

    pub(crate) fn with_create_error(self, kind: JobKind, status: u16) -> Self {
        self.push_create(kind, CreateReply::Rejected(status));
        self
    }

    pub(crate) fn with_create_delay(self, kind: JobKind, delay: Duration) -> Self {
        self.script.lock().unwrap().create_delay.insert(kind, delay);
        self
    }

    pub(crate) fn complete_at(self, task_id: &str, at: Duration) -> Self {
        self.complete_at_with(task_id, at, completed())
    }

    pub(crate) fn complete_at_with(self, task_id: &str, at: Duration, response: StatusResponse) -> Self {
        self.script
            .lock()
            .unwrap()
            .status
            .insert(task_id.into(), StatusScript::CompleteAt { at, response });
        self
    }

    pub(crate) fn status_sequence(self, task_id: &str, replies: Vec<Option<StatusResponse>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .status
            .insert(task_id.into(), StatusScript::Sequence(replies.into()));
        self
    }

    pub(crate) fn create_calls(&self) -> Vec<JobKind> {
        self.script.lock().unwrap().create_calls.iter().map(|(k, _)| *k).collect()
    }

    /// Instants at which `task_id` was queried, relative to the epoch.
    pub(crate) fn status_calls(&self, task_id: &str) -> Vec<Duration> {
        self.script
            .lock()
            .unwrap()
            .status_calls
            .iter()
            .filter(|(id, _)| id == task_id)
            .map(|(_, at)| at.duration_since(self.epoch))
            .collect()
    }

    fn push_create(&self, kind: JobKind, reply: CreateReply) {
        self.script.lock().unwrap().create.entry(kind).or_default().push_back(reply);
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn create_task(&self, kind: JobKind, _artifact: &Artifact) -> Result<TaskId, AnalysisApiError> {
        let (reply, delay) = {
            let mut script = self.script.lock().unwrap();
            script.create_calls.push((kind, Instant::now()));
            let delay = script.create_delay.get(&kind).copied().unwrap_or_default();
            let queue = script.create.entry(kind).or_default();
            let reply = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            (reply, delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(CreateReply::Task(id)) => Ok(id),
            Some(CreateReply::Rejected(status)) => Err(AnalysisApiError::ApiError {
                status,
                body: "scripted rejection".into(),
            }),
            None => Err(AnalysisApiError::MalformedResponse(format!("no task scripted for {kind}"))),
        }
    }

    async fn task_status(&self, task_id: &str) -> Result<StatusResponse, AnalysisApiError> {
        let now = Instant::now();
        let mut script = self.script.lock().unwrap();
        script.status_calls.push((task_id.to_string(), now));

        let reply = match script.status.get_mut(task_id) {
            Some(StatusScript::CompleteAt { at, response }) => {
                if now.duration_since(self.epoch) >= *at {
                    Some(response.clone())
                } else {
                    Some(running())
                }
            }
            Some(StatusScript::Sequence(replies)) => {
                if replies.len() > 1 {
                    replies.pop_front().flatten()
                } else {
                    replies.front().cloned().flatten()
                }
            }
            None => {
                return Err(AnalysisApiError::ApiError {
                    status: 404,
                    body: format!("unknown task {task_id}"),
                })
            }
        };

        reply.ok_or_else(|| AnalysisApiError::MalformedResponse("scripted poll failure".into()))
    }

    async fn get_report(&self, task_id: &str) -> Result<serde_json::Value, AnalysisApiError> {
        Ok(serde_json::json!({ "info": { "id": task_id } }))
    }
}
