//! Building [`ContextNode`] trees from parsed JSON.
//!
//! Children are decoded through an explicit stack of frames rather than by
//! nested `Deserialize` calls, and every raw `Value` that is not kept is torn
//! down iteratively. Trace depth never translates into native stack depth.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TraceError;
use crate::types::{ContextNode, NodeId, NodeKind, NodeMeta, NodeState, Tag};

/// Discriminator the tracing library writes for bare event children.
const EVENT_TYPE: &str = "Event";

/// Fixed-shape fields of a context node. `children` and the payloads are
/// taken out of the map beforehand.
#[derive(Deserialize)]
struct RawNode {
    #[serde(alias = "uuid")]
    uid: NodeId,
    name: String,
    #[serde(default)]
    kind: Option<NodeKind>,
    #[serde(default, deserialize_with = "deserialize_state")]
    state: Option<NodeState>,
    #[serde(default)]
    meta: Option<NodeMeta>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
}

/// `{"_type": "Event", "name", "time", "data"}`; `data` is taken out first.
#[derive(Deserialize)]
struct RawEvent {
    name: String,
    #[serde(default)]
    time: Option<String>,
}

/// `"finished"` is the settled state spelled out; `"new"` is a context
/// that was created but not yet entered.
fn deserialize_state<'de, D>(deserializer: D) -> Result<Option<NodeState>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("finished") => Ok(None),
        Some("open") | Some("new") => Ok(Some(NodeState::Running)),
        Some("event") => Ok(Some(NodeState::Event)),
        Some("error") => Ok(Some(NodeState::Failed)),
        Some(other) => Err(de::Error::unknown_variant(other, NodeState::WIRE_NAMES)),
    }
}

/// Raw values still waiting to be decoded. Whatever is left when this is
/// dropped (after an error) is torn down without recursion.
struct Pending(std::vec::IntoIter<Value>);

impl Pending {
    fn new(values: Vec<Value>) -> Self {
        Self(values.into_iter())
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn next(&mut self) -> Option<Value> {
        self.0.next()
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        discard(&mut self.0);
    }
}

/// A context node whose children are being decoded.
struct Frame {
    node: ContextNode,
    children: Pending,
    next_index: usize,
}

enum Child {
    Context(ContextNode, Pending),
    Event(ContextNode),
}

/// Drop JSON values of any depth with a heap worklist.
pub(crate) fn discard(values: impl IntoIterator<Item = Value>) {
    let mut stack: Vec<Value> = values.into_iter().collect();
    while let Some(value) = stack.pop() {
        match value {
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Decode a single root node or an array of roots.
pub(crate) fn decode_roots(value: Value) -> Result<Vec<ContextNode>, TraceError> {
    match value {
        Value::Array(items) => {
            let mut pending = Pending::new(items);
            let mut roots = Vec::with_capacity(pending.len());
            while let Some(item) = pending.next() {
                roots.push(decode_tree(item)?);
            }
            Ok(roots)
        }
        other => Ok(vec![decode_tree(other)?]),
    }
}

/// Decode one tree. Errors below the root name the parent uid and the
/// child's position.
pub(crate) fn decode_tree(value: Value) -> Result<ContextNode, TraceError> {
    let (root, children) = decode_context(expect_object(value)?)?;
    let mut stack: Vec<Frame> = Vec::new();
    let mut current = Frame {
        node: root,
        children,
        next_index: 0,
    };
    loop {
        match current.children.next() {
            Some(raw) => {
                let index = current.next_index;
                current.next_index += 1;
                let child = decode_child(raw, &current.node.uid, index).map_err(|source| {
                    TraceError::InvalidChild {
                        parent: current.node.uid.clone(),
                        index,
                        source,
                    }
                })?;
                match child {
                    Child::Event(node) => current.node.children.push(node),
                    Child::Context(node, children) => {
                        let frame = Frame {
                            node,
                            children,
                            next_index: 0,
                        };
                        stack.push(std::mem::replace(&mut current, frame));
                    }
                }
            }
            None => match stack.pop() {
                Some(parent) => {
                    let done = std::mem::replace(&mut current, parent);
                    current.node.children.push(done.node);
                }
                None => return Ok(current.node),
            },
        }
    }
}

fn expect_object(value: Value) -> Result<Map<String, Value>, serde_json::Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => {
            let kind = match &other {
                Value::Null => "null",
                Value::Bool(_) => "a boolean",
                Value::Number(_) => "a number",
                Value::String(_) => "a string",
                Value::Array(_) => "an array",
                Value::Object(_) => "an object",
            };
            discard([other]);
            Err(de::Error::custom(format!(
                "expected a context node object, found {kind}"
            )))
        }
    }
}

fn decode_child(raw: Value, parent: &str, index: usize) -> Result<Child, serde_json::Error> {
    let map = expect_object(raw)?;
    if map.get("_type").and_then(Value::as_str) == Some(EVENT_TYPE) {
        decode_event(map, parent, index).map(Child::Event)
    } else {
        decode_context(map).map(|(node, children)| Child::Context(node, children))
    }
}

/// Split a context object into its node (without children) and its raw
/// children. Payloads move into the node untouched.
fn decode_context(mut map: Map<String, Value>) -> Result<(ContextNode, Pending), serde_json::Error> {
    let children = match map.remove("children") {
        None | Some(Value::Null) => Pending::new(Vec::new()),
        Some(Value::Array(items)) => Pending::new(items),
        Some(other) => {
            discard([other]);
            discard(map.into_iter().map(|(_, v)| v));
            return Err(de::Error::custom("`children` must be an array"));
        }
    };

    // From here on the node owns the payloads and drops them iteratively.
    let mut node = ContextNode::new(NodeId::new(), String::new());
    node.result = take_payload(&mut map, "result");
    node.error = take_payload(&mut map, "error");
    node.inputs = match map.remove("inputs") {
        None | Some(Value::Null) => None,
        Some(Value::Object(inputs)) => Some(inputs),
        Some(other) => {
            discard([other]);
            discard(map.into_iter().map(|(_, v)| v));
            return Err(de::Error::custom("`inputs` must be an object"));
        }
    };

    let raw: RawNode = serde_json::from_value(Value::Object(map))?;
    node.uid = raw.uid;
    node.name = raw.name;
    node.kind = raw.kind;
    node.state = raw.state;
    node.meta = raw.meta;
    node.tags = raw.tags;
    node.start_time = raw.start_time;
    node.end_time = raw.end_time;
    Ok((node, children))
}

/// Events have no uid of their own; they are keyed under the parent.
fn decode_event(
    mut map: Map<String, Value>,
    parent: &str,
    index: usize,
) -> Result<ContextNode, serde_json::Error> {
    let mut node = ContextNode::new(format!("{parent}/events/{index}"), String::new())
        .with_state(NodeState::Event);
    node.result = take_payload(&mut map, "data");
    let raw: RawEvent = serde_json::from_value(Value::Object(map))?;
    node.name = raw.name;
    node.start_time = raw.time.clone();
    node.end_time = raw.time;
    Ok(node)
}

fn take_payload(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}
