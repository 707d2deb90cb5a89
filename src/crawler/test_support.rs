//! In-memory fetcher for unit tests

use crate::crawler::fetcher::{Capture, Fetch, FetchOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a URL → outcome table and records every call
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, FetchOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn respond(&self, url: &str, outcome: FetchOutcome) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), outcome);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::transport("unscripted url"))
    }
}

pub fn text_capture(content_type: &str, body: &str) -> Capture {
    Capture {
        status: 200,
        status_line: "HTTP/1.1 200 OK".to_string(),
        headers: vec![("content-type".to_string(), content_type.to_string())],
        cookies: Vec::new(),
        body: body.as_bytes().to_vec(),
    }
}
