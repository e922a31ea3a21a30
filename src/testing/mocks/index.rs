//! Scripted knowledge-index probe

use crate::abstractions::{IndexClient, IndexContext};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Queued answers; once drained, the last answer repeats (an empty script
/// answers "not indexed").
#[derive(Default)]
struct ProbeScript {
    queue: VecDeque<std::result::Result<bool, String>>,
    last: Option<std::result::Result<bool, String>>,
}

impl ProbeScript {
    fn new(answers: Vec<std::result::Result<bool, String>>) -> Self {
        Self {
            queue: answers.into(),
            last: None,
        }
    }

    fn next(&mut self) -> std::result::Result<bool, String> {
        match self.queue.pop_front() {
            Some(answer) => {
                self.last = Some(answer.clone());
                answer
            }
            None => self.last.clone().unwrap_or(Ok(false)),
        }
    }
}

#[derive(Default)]
struct IndexState {
    default_script: ProbeScript,
    tag_scripts: HashMap<String, ProbeScript>,
    probes: Vec<(String, String)>,
}

/// Answers probes from a script shared by all tags, unless a tag has its own.
pub struct MockIndex {
    state: Arc<Mutex<IndexState>>,
    not_ready: Option<String>,
}

impl MockIndex {
    pub fn always(indexed: bool) -> Self {
        Self::sequence(vec![Ok(indexed)])
    }

    pub fn sequence(script: Vec<std::result::Result<bool, String>>) -> Self {
        let state = IndexState {
            default_script: ProbeScript::new(script),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            not_ready: None,
        }
    }

    /// Script used for `tag` instead of the default one.
    pub fn with_tag_sequence(
        self,
        tag: &str,
        script: Vec<std::result::Result<bool, String>>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .tag_scripts
            .insert(tag.to_string(), ProbeScript::new(script));
        self
    }

    pub fn not_ready(mut self, message: &str) -> Self {
        self.not_ready = Some(message.to_string());
        self
    }

    pub fn probe_count(&self) -> usize {
        self.state.lock().unwrap().probes.len()
    }

    pub fn probes_for(&self, tag: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .probes
            .iter()
            .filter(|(_, t)| t == tag)
            .count()
    }

    /// (index name, tag) of each probe, in call order.
    pub fn probes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().probes.clone()
    }
}

#[async_trait]
impl IndexClient for MockIndex {
    async fn check_ready(&self) -> Result<()> {
        match &self.not_ready {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    async fn probe_indexed(&self, context: &IndexContext, tag: &str) -> Result<bool> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state
            .probes
            .push((context.index_name.clone(), tag.to_string()));

        let answer = match state.tag_scripts.get_mut(tag) {
            Some(script) => script.next(),
            None => state.default_script.next(),
        };
        answer.map_err(|e| anyhow!("{e}"))
    }
}
