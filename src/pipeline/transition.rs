// ABOUTME: Transition table linking pipeline commands by success and fail edges.
// ABOUTME: Keys are plain labels; each entry owns its command and its two successors.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::command::Command;

/// One node of the pipeline graph.
pub struct TransitionInfo<K, C> {
    pub command: Box<dyn Command<C>>,
    pub on_success: Option<K>,
    pub on_fail: Option<K>,
}

impl<K, C: Send> TransitionInfo<K, C> {
    pub fn new(command: impl Command<C> + 'static) -> Self {
        Self {
            command: Box::new(command),
            on_success: None,
            on_fail: None,
        }
    }

    pub fn on_success(mut self, next: K) -> Self {
        self.on_success = Some(next);
        self
    }

    pub fn on_fail(mut self, next: K) -> Self {
        self.on_fail = Some(next);
        self
    }
}

/// The directed graph a [`PipelineDriver`](super::PipelineDriver) walks.
///
/// Cycles are not detected; a cyclic table runs until a command stops it.
pub struct TransitionTable<K, C> {
    start: K,
    entries: HashMap<K, TransitionInfo<K, C>>,
}

impl<K, C> TransitionTable<K, C>
where
    K: Copy + Eq + Hash + Debug,
    C: Send,
{
    pub fn new(start: K) -> Self {
        Self {
            start,
            entries: HashMap::new(),
        }
    }

    /// Register `info` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: K, info: TransitionInfo<K, C>) -> &mut Self {
        self.entries.insert(key, info);
        self
    }

    pub fn with(mut self, key: K, info: TransitionInfo<K, C>) -> Self {
        self.insert(key, info);
        self
    }

    /// Build a table that runs `steps` in order with no fail edges.
    pub fn chain(steps: Vec<(K, Box<dyn Command<C>>)>) -> Option<Self> {
        let start = steps.first()?.0;
        let mut table = Self::new(start);
        let next_keys: Vec<Option<K>> = steps
            .iter()
            .skip(1)
            .map(|(k, _)| Some(*k))
            .chain(std::iter::once(None))
            .collect();
        for ((key, command), on_success) in steps.into_iter().zip(next_keys) {
            table.insert(
                key,
                TransitionInfo {
                    command,
                    on_success,
                    on_fail: None,
                },
            );
        }
        Some(table)
    }

    pub fn start(&self) -> K {
        self.start
    }

    pub fn get(&self, key: &K) -> Option<&TransitionInfo<K, C>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
