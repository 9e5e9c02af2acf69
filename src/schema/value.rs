//! Attribute values as Terraform exchanges them. Any level may be null or still
//! unknown at plan time, which plain JSON cannot express.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

pub use tf_provider::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value<Node>>),
    Object(BTreeMap<String, Value<Node>>),
}

/// Top-level attributes of a resource or data source.
pub type Attributes = BTreeMap<String, Value<Node>>;

/// Whole object handed over by Terraform, null when the resource is absent.
pub type State = Value<Attributes>;

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Object(attrs) => {
                let mut map = serializer.serialize_map(Some(attrs.len()))?;
                for (k, v) in attrs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a terraform attribute value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Node, E> {
        Number::from_f64(v)
            .map(Node::Number)
            .ok_or_else(|| E::custom(format!("{v} is not a finite number")))
    }

    fn visit_str<E>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value<Node>>()? {
            items.push(item);
        }
        Ok(Node::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut attrs = BTreeMap::new();
        while let Some((k, v)) = map.next_entry::<String, Value<Node>>()? {
            attrs.insert(k, v);
        }
        Ok(Node::Object(attrs))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

pub fn string(s: impl Into<String>) -> Value<Node> {
    Value::Value(Node::String(s.into()))
}

pub fn from_json(value: serde_json::Value) -> Value<Node> {
    use serde_json::Value as Json;

    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Value(Node::Bool(b)),
        Json::Number(n) => Value::Value(Node::Number(n)),
        Json::String(s) => Value::Value(Node::String(s)),
        Json::Array(items) => Value::Value(Node::List(items.into_iter().map(from_json).collect())),
        Json::Object(map) => Value::Value(Node::Object(
            map.into_iter().map(|(k, v)| (k, from_json(v))).collect(),
        )),
    }
}

/// Attributes of a JSON object; anything else gives an empty set.
pub fn attributes_from_json(value: serde_json::Value) -> Attributes {
    match from_json(value) {
        Value::Value(Node::Object(attrs)) => attrs,
        _ => Attributes::new(),
    }
}

/// JSON view of the known values. Null and unknown object members are left out.
pub fn to_json(value: &Value<Node>) -> serde_json::Value {
    match value {
        Value::Value(node) => node_to_json(node),
        _ => serde_json::Value::Null,
    }
}

pub fn attributes_to_json(attrs: &Attributes) -> serde_json::Value {
    serde_json::Value::Object(object_to_json(attrs))
}

fn node_to_json(node: &Node) -> serde_json::Value {
    use serde_json::Value as Json;

    match node {
        Node::Bool(b) => Json::Bool(*b),
        Node::Number(n) => Json::Number(n.clone()),
        Node::String(s) => Json::String(s.clone()),
        Node::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Node::Object(attrs) => Json::Object(object_to_json(attrs)),
    }
}

fn object_to_json(attrs: &BTreeMap<String, Value<Node>>) -> serde_json::Map<String, serde_json::Value> {
    attrs
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Value(node) => Some((k.clone(), node_to_json(node))),
            _ => None,
        })
        .collect()
}

/// Not null and not an empty block list. Unknown values count as set.
pub fn is_set(value: Option<&Value<Node>>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Value(Node::List(items))) => !items.is_empty(),
        _ => true,
    }
}

pub fn is_unknown(value: Option<&Value<Node>>) -> bool {
    matches!(value, Some(Value::Unknown))
}

pub fn as_str(value: Option<&Value<Node>>) -> Option<&str> {
    match value {
        Some(Value::Value(Node::String(s))) => Some(s),
        _ => None,
    }
}

/// First element of a block list.
pub fn first_block(value: Option<&Value<Node>>) -> Option<&Attributes> {
    match value? {
        Value::Value(Node::List(items)) => match items.first()? {
            Value::Value(Node::Object(attrs)) => Some(attrs),
            _ => None,
        },
        Value::Value(Node::Object(attrs)) => Some(attrs),
        _ => None,
    }
}

pub fn first_block_mut(value: Option<&mut Value<Node>>) -> Option<&mut Attributes> {
    match value? {
        Value::Value(Node::List(items)) => match items.first_mut()? {
            Value::Value(Node::Object(attrs)) => Some(attrs),
            _ => None,
        },
        Value::Value(Node::Object(attrs)) => Some(attrs),
        _ => None,
    }
}
