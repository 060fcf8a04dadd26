//! Per-conversation session state.
//!
//! A [`DialogueContext`] is created when a conversation starts and dropped
//! when it ends. It is the only mutable state the engine owns for a running
//! conversation: which node is current, which nodes have been visited,
//! scratch flags and variables set by actions, and the loop-protection
//! counter.

use crate::actor::{Actor, ActorId, Initiator, InitiatorId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// Hard cap on how many nodes a single conversation may enter.
///
/// Runaway auto-advance or jump chains are treated as a content bug to
/// contain: the engine ends the conversation instead of erroring once this
/// many nodes have been entered.
pub const MAX_NODES: u32 = 100;

/// A dialogue variable value.
///
/// A small closed union so reads are a pattern match rather than a downcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Num(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Mutable state of one in-progress conversation.
///
/// Invariants upheld here rather than by callers:
/// - `visited` and `node_count` only grow, and freeze once `ended` is set.
/// - `current_node` cannot change after `ended` is set.
/// - the pending jump target is write-once until consumed: the first action
///   to request a jump in a turn wins, later requests in the same turn are
///   ignored.
#[derive(Debug)]
pub struct DialogueContext {
    initiator: InitiatorId,
    initiator_name: String,
    actor: ActorId,
    tree_id: String,
    current_node: Option<String>,
    pending_jump: Option<String>,
    visited: HashSet<String>,
    flags: HashSet<String>,
    variables: HashMap<String, Value>,
    ended: bool,
    node_count: u32,
    started_at: Instant,
}

impl DialogueContext {
    /// Create the session state for a conversation on the given tree.
    pub fn new(initiator: &Initiator, actor: ActorId, tree_id: impl Into<String>) -> Self {
        Self {
            initiator: initiator.id,
            initiator_name: initiator.name.clone(),
            actor,
            tree_id: tree_id.into(),
            current_node: None,
            pending_jump: None,
            visited: HashSet::new(),
            flags: HashSet::new(),
            variables: HashMap::new(),
            ended: false,
            node_count: 0,
            started_at: Instant::now(),
        }
    }

    pub fn initiator(&self) -> InitiatorId {
        self.initiator
    }

    pub fn initiator_name(&self) -> &str {
        &self.initiator_name
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    /// Id of the node currently presented, if any.
    pub fn current_node(&self) -> Option<&str> {
        self.current_node.as_deref()
    }

    /// How many nodes this conversation has entered.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Time elapsed since the conversation started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record a node as entered: sets it current, marks it visited, and
    /// bumps the node counter. Frozen after the conversation has ended.
    pub fn enter_node(&mut self, node_id: &str) {
        if self.ended {
            return;
        }
        self.current_node = Some(node_id.to_string());
        self.visited.insert(node_id.to_string());
        self.node_count += 1;
    }

    /// Whether a node was entered at any point during this conversation.
    pub fn has_visited(&self, node_id: &str) -> bool {
        self.visited.contains(node_id)
    }

    /// Number of distinct nodes visited.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn set_flag(&mut self, flag: impl Into<String>) {
        self.flags.insert(flag.into());
    }

    pub fn clear_flag(&mut self, flag: &str) {
        self.flags.remove(flag);
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Read a variable, falling back to a default when unset.
    pub fn variable_or(&self, key: &str, default: Value) -> Value {
        self.variables.get(key).cloned().unwrap_or(default)
    }

    /// Request a jump to an explicit node, overriding the selected option's
    /// static target. Only the first request per turn takes effect.
    pub fn request_jump(&mut self, node_id: impl Into<String>) {
        if self.pending_jump.is_none() {
            self.pending_jump = Some(node_id.into());
        }
    }

    /// Take the pending jump target, clearing it.
    pub fn consume_jump(&mut self) -> Option<String> {
        self.pending_jump.take()
    }

    /// Mark the conversation as over. Irreversible.
    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Substitute recognized placeholders in authored text.
    ///
    /// Recognized: `{initiator}`, `{actor}`, `{mood}`, and `{variable:<key>}`
    /// for any session variable. Unrecognized placeholders are left verbatim.
    pub fn interpolate(&self, text: &str, actor: &dyn Actor) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match self.placeholder(key, actor) {
                        Some(value) => out.push_str(&value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    // Unmatched brace, emit as-is.
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn placeholder(&self, key: &str, actor: &dyn Actor) -> Option<String> {
        match key {
            "initiator" => Some(self.initiator_name.clone()),
            "actor" => Some(actor.display_name().to_string()),
            "mood" => Some(actor.mood().kind.label().to_string()),
            _ => key
                .strip_prefix("variable:")
                .and_then(|k| self.variables.get(k))
                .map(Value::to_string),
        }
    }
}
