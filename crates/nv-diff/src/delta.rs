//! Field-level deltas between two versions of one resource.
//!
//! Locations are JSON Pointers (RFC 6901); the empty pointer is the
//! document root.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldChange {
    Added { pointer: String, value: Value },
    Removed { pointer: String, value: Value },
    Changed { pointer: String, old: Value, new: Value },
}

impl FieldChange {
    #[must_use]
    pub fn pointer(&self) -> &str {
        match self {
            Self::Added { pointer, .. }
            | Self::Removed { pointer, .. }
            | Self::Changed { pointer, .. } => pointer,
        }
    }

    /// The same change seen from the other side.
    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Self::Added { pointer, value } => Self::Removed { pointer, value },
            Self::Removed { pointer, value } => Self::Added { pointer, value },
            Self::Changed { pointer, old, new } => Self::Changed {
                pointer,
                old: new,
                new: old,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delta {
    /// Both sides (or the one side present) parsed as JSON.
    Structural { changes: Vec<FieldChange> },
    /// At least one side is not JSON; raw texts are kept as is.
    Opaque {
        old: Option<String>,
        new: Option<String>,
    },
}

impl Delta {
    /// Delta for a file present on one or both sides.
    #[must_use]
    pub fn between(old: Option<&str>, new: Option<&str>) -> Self {
        let parse = |text: Option<&str>| text.map(serde_json::from_str::<Value>);
        match (parse(old), parse(new)) {
            (Some(Ok(a)), Some(Ok(b))) => Self::Structural {
                changes: structural(&a, &b),
            },
            (None, Some(Ok(b))) => Self::Structural {
                changes: vec![FieldChange::Added {
                    pointer: String::new(),
                    value: b,
                }],
            },
            (Some(Ok(a)), None) => Self::Structural {
                changes: vec![FieldChange::Removed {
                    pointer: String::new(),
                    value: a,
                }],
            },
            _ => Self::Opaque {
                old: old.map(ToString::to_string),
                new: new.map(ToString::to_string),
            },
        }
    }

    /// Number of field changes; an opaque delta counts as one.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Structural { changes } => changes.len(),
            Self::Opaque { .. } => 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Self::Structural { changes } => Self::Structural {
                changes: changes.into_iter().map(FieldChange::inverted).collect(),
            },
            Self::Opaque { old, new } => Self::Opaque { old: new, new: old },
        }
    }
}

/// Compare two JSON documents.
///
/// Object keys are visited in sorted order. Arrays are compared by position;
/// trailing elements of the longer array are added or removed.
#[must_use]
pub fn structural(old: &Value, new: &Value) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    walk(String::new(), old, new, &mut changes);
    changes
}

fn walk(pointer: String, old: &Value, new: &Value, out: &mut Vec<FieldChange>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let child = format!("{pointer}/{}", escape_token(key));
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => walk(child, x, y, out),
                    (Some(x), None) => out.push(FieldChange::Removed {
                        pointer: child,
                        value: x.clone(),
                    }),
                    (None, Some(y)) => out.push(FieldChange::Added {
                        pointer: child,
                        value: y.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for i in 0..a.len().max(b.len()) {
                let child = format!("{pointer}/{i}");
                match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) => walk(child, x, y, out),
                    (Some(x), None) => out.push(FieldChange::Removed {
                        pointer: child,
                        value: x.clone(),
                    }),
                    (None, Some(y)) => out.push(FieldChange::Added {
                        pointer: child,
                        value: y.clone(),
                    }),
                    (None, None) => {}
                }
            }
        }
        _ if old == new => {}
        _ => out.push(FieldChange::Changed {
            pointer,
            old: old.clone(),
            new: new.clone(),
        }),
    }
}

fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
