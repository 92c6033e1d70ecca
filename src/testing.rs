//! Scripted in-memory segment source for tests.

use crate::catalog::{Segment, SegmentSource};
use crate::request::state::StateTracker;
use crate::request::{ApiResult, RequestError, RequestState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Reply {
    delay: Duration,
    result: ApiResult<Vec<Segment>>,
}

#[derive(Default)]
struct Script {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

/// Sessions share the script and the call log, not the request state.
/// Request state goes through the same tracker as `RequestClient`.
pub(crate) struct ScriptedSource {
    script: Arc<Script>,
    tracker: Arc<StateTracker>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            script: Arc::new(Script::default()),
            tracker: StateTracker::new(),
        }
    }

    pub(crate) fn reply(self, query: &str, list: Vec<Segment>) -> Self {
        self.reply_after(query, Duration::ZERO, list)
    }

    pub(crate) fn reply_after(self, query: &str, delay: Duration, list: Vec<Segment>) -> Self {
        self.script_reply(query, delay, Ok(Some(list)));
        self
    }

    pub(crate) fn fail(self, query: &str, error: RequestError) -> Self {
        self.fail_after(query, Duration::ZERO, error)
    }

    pub(crate) fn fail_after(self, query: &str, delay: Duration, error: RequestError) -> Self {
        self.script_reply(query, delay, Err(error));
        self
    }

    fn script_reply(&self, query: &str, delay: Duration, result: ApiResult<Vec<Segment>>) {
        self.script
            .replies
            .lock()
            .unwrap()
            .insert(query.to_string(), Reply { delay, result });
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.script.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SegmentSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<Segment>> {
        self.script.calls.lock().unwrap().push(query.to_string());
        let call = self.tracker.begin();

        let reply = self
            .script
            .replies
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or(Reply {
                delay: Duration::ZERO,
                result: Ok(Some(Vec::new())),
            });
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        if let Err(e) = &reply.result {
            call.fail(e.to_string());
        }
        reply.result
    }

    fn state(&self) -> RequestState {
        self.tracker.snapshot()
    }

    fn session(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            tracker: StateTracker::new(),
        }
    }
}
