use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node identifier, unique within one snapshot.
pub type NodeId = String;

/// Well-known kind strings written by trace producers.
pub mod kind {
    pub const QUERY: &str = "query";
    pub const ACTION: &str = "action";
    pub const OBSERVATION: &str = "observation";
    pub const REPEAT_ON_FAILURE: &str = "repeat_on_failure";
    pub const CALL: &str = "call";
}

/// Classification tag of a context node.
///
/// The wire string (see [`NodeKind::as_str`]) doubles as the identifier
/// used for kind filtering in [`crate::ExpansionState`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Query,
    Action,
    Observation,
    RepeatOnFailure,
    Call,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Query => kind::QUERY,
            NodeKind::Action => kind::ACTION,
            NodeKind::Observation => kind::OBSERVATION,
            NodeKind::RepeatOnFailure => kind::REPEAT_ON_FAILURE,
            NodeKind::Call => kind::CALL,
            NodeKind::Other(s) => s,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            kind::QUERY => NodeKind::Query,
            kind::ACTION => NodeKind::Action,
            kind::OBSERVATION => NodeKind::Observation,
            kind::REPEAT_ON_FAILURE => NodeKind::RepeatOnFailure,
            kind::CALL => NodeKind::Call,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match NodeKind::from(s.as_str()) {
            NodeKind::Other(_) => NodeKind::Other(s),
            known => known,
        }
    }
}

impl From<NodeKind> for String {
    fn from(k: NodeKind) -> Self {
        match k {
            NodeKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl From<&NodeKind> for String {
    fn from(k: &NodeKind) -> Self {
        k.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle marker. A node without a state is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeState {
    #[serde(rename = "open")]
    Running,
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "error")]
    Failed,
}

impl NodeState {
    pub(crate) const WIRE_NAMES: &'static [&'static str] = &["open", "new", "event", "error", "finished"];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Running => "open",
            NodeState::Event => "event",
            NodeState::Failed => "error",
        }
    }
}

/// Display hints, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_bg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_border: Option<String>,
}

/// Decorative tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Plain(String),
    Styled {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Plain(name) | Tag::Styled { name, .. } => name,
        }
    }
}

/// One node of the execution trace tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextNode {
    pub uid: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<NodeMeta>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContextNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl ContextNode {
    pub fn new(uid: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            kind: None,
            state: None,
            meta: None,
            children: Vec::new(),
            inputs: None,
            result: None,
            error: None,
            tags: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<NodeKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_child(mut self, child: ContextNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_times(mut self, start: &str, end: &str) -> Self {
        self.start_time = Some(start.to_string());
        self.end_time = Some(end.to_string());
        self
    }
}

impl<'de> Deserialize<'de> for ContextNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        crate::decode::decode_tree(value).map_err(de::Error::custom)
    }
}

/// Subtrees and payloads are released with a heap worklist, so dropping a
/// trace of any depth does not recurse.
impl Drop for ContextNode {
    fn drop(&mut self) {
        let mut payloads: Vec<Value> = Vec::new();
        if let Some(inputs) = self.inputs.take() {
            payloads.extend(inputs.into_iter().map(|(_, v)| v));
        }
        payloads.extend(self.result.take());
        payloads.extend(self.error.take());
        if !payloads.is_empty() {
            crate::decode::discard(payloads);
        }

        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}
