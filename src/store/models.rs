//! Graph store data models.
//!
//! ## Identity
//! - [`NodeId`]: stable integer or string key, unique across the store
//! - [`RelationshipId`]: store handle of a relationship (never reused)
//! - [`EntityRef`]: node-or-relationship target for updates
//!
//! ## Vocabulary
//! - [`NodeKind`] / [`Node`]: Person, Movie, Genre entities
//! - [`RelKind`] / [`Relationship`]: typed, directed, attributed edges
//! - [`AttrValue`] / [`Attributes`]: scalar attribute maps
//!
//! ## Snapshot
//! - [`GraphSnapshot`]: plain export/import form of the whole graph

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identity
// ============================================================================

/// Stable node key. Integers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for NodeId {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for NodeId {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    /// Digits parse as an integer key, anything else is a string key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Str(s.to_string()),
        })
    }
}

/// Handle of a relationship inside one store. Only meaningful for the
/// lifetime of that store; removed handles are never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationshipId(pub usize);

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Target of an attribute update or a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Node(NodeId),
    Relationship(RelationshipId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node {}", id),
            Self::Relationship(rel) => write!(f, "relationship {}", rel),
        }
    }
}

impl From<NodeId> for EntityRef {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        Self::Node(NodeId::from(id))
    }
}

impl From<RelationshipId> for EntityRef {
    fn from(rel: RelationshipId) -> Self {
        Self::Relationship(rel)
    }
}

// ============================================================================
// Kinds
// ============================================================================

/// Kind of entity. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Person,
    Movie,
    Genre,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [Self::Person, Self::Movie, Self::Genre];
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person => write!(f, "Person"),
            Self::Movie => write!(f, "Movie"),
            Self::Genre => write!(f, "Genre"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "person" => Ok(Self::Person),
            "movie" => Ok(Self::Movie),
            "genre" => Ok(Self::Genre),
            other => Err(format!("unknown node kind: {}", other)),
        }
    }
}

/// Kind of relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelKind {
    ActedIn,
    Directed,
    Produced,
    HasGenre,
    /// Derived from co-occurrence on a shared movie; never stored.
    CollaboratedWith,
}

impl RelKind {
    pub const ALL: [RelKind; 5] = [
        Self::ActedIn,
        Self::Directed,
        Self::Produced,
        Self::HasGenre,
        Self::CollaboratedWith,
    ];

    /// Kinds whose edges put a person "on" a movie for collaboration purposes.
    pub const PARTICIPATION: [RelKind; 2] = [Self::ActedIn, Self::Directed];

    /// Endpoint kinds this relationship connects.
    pub fn endpoints(self) -> (NodeKind, NodeKind) {
        match self {
            Self::ActedIn | Self::Directed | Self::Produced => (NodeKind::Person, NodeKind::Movie),
            Self::HasGenre => (NodeKind::Movie, NodeKind::Genre),
            Self::CollaboratedWith => (NodeKind::Person, NodeKind::Person),
        }
    }

    /// Whether edges of this kind are computed rather than inserted.
    pub fn is_derived(self) -> bool {
        matches!(self, Self::CollaboratedWith)
    }

    /// Whether a stored edge of this kind may connect `source` to `target`.
    pub fn accepts(self, source: NodeKind, target: NodeKind) -> bool {
        !self.is_derived() && self.endpoints() == (source, target)
    }

    pub fn is_participation(self) -> bool {
        Self::PARTICIPATION.contains(&self)
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActedIn => write!(f, "ACTED_IN"),
            Self::Directed => write!(f, "DIRECTED"),
            Self::Produced => write!(f, "PRODUCED"),
            Self::HasGenre => write!(f, "HAS_GENRE"),
            Self::CollaboratedWith => write!(f, "COLLABORATED_WITH"),
        }
    }
}

impl FromStr for RelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ACTED_IN" => Ok(Self::ActedIn),
            "DIRECTED" => Ok(Self::Directed),
            "PRODUCED" => Ok(Self::Produced),
            "HAS_GENRE" => Ok(Self::HasGenre),
            "COLLABORATED_WITH" => Ok(Self::CollaboratedWith),
            other => Err(format!("unknown relationship kind: {}", other)),
        }
    }
}

/// Direction of adjacency relative to the queried node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" | "outgoing" => Ok(Self::Outgoing),
            "in" | "incoming" => Ok(Self::Incoming),
            "both" | "any" => Ok(Self::Both),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Attribute map, ordered by name for deterministic output.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Build an [`Attributes`] map from `(name, value)` pairs.
pub fn attrs<const N: usize>(pairs: [(&str, AttrValue); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// ============================================================================
// Entities
// ============================================================================

/// A typed entity in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Node {
    /// Human-readable label: `name`, then `title`, then the id.
    pub fn label(&self) -> String {
        self.attributes
            .get("name")
            .or_else(|| self.attributes.get("title"))
            .and_then(AttrValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(AttrValue::as_f64)
    }
}

/// A typed, directed, attributed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: RelKind,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Relationship {
    /// The endpoint that is not `id`. Self-loops return `id`.
    pub fn other(&self, id: &NodeId) -> &NodeId {
        if &self.source == id {
            &self.target
        } else {
            &self.source
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Relationship as it appears in a snapshot (no store handle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub kind: RelKind,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Full node/relationship set in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub relationships: Vec<RelationshipRecord>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering_ints_before_strings() {
        let mut ids = vec![
            NodeId::from("b"),
            NodeId::from(10),
            NodeId::from("a"),
            NodeId::from(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                NodeId::from(2),
                NodeId::from(10),
                NodeId::from("a"),
                NodeId::from("b")
            ]
        );
    }

    #[test]
    fn test_node_id_from_str() {
        assert_eq!("42".parse::<NodeId>().unwrap(), NodeId::Int(42));
        assert_eq!(
            "Inception".parse::<NodeId>().unwrap(),
            NodeId::Str("Inception".into())
        );
    }

    #[test]
    fn test_node_id_serde_untagged() {
        let json = serde_json::to_string(&vec![NodeId::from(7), NodeId::from("x")]).unwrap();
        assert_eq!(json, r#"[7,"x"]"#);
        let back: Vec<NodeId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![NodeId::from(7), NodeId::from("x")]);
    }

    #[test]
    fn test_rel_kind_compatibility() {
        use NodeKind::*;
        assert!(RelKind::ActedIn.accepts(Person, Movie));
        assert!(RelKind::Directed.accepts(Person, Movie));
        assert!(RelKind::Produced.accepts(Person, Movie));
        assert!(RelKind::HasGenre.accepts(Movie, Genre));
        assert!(!RelKind::ActedIn.accepts(Movie, Person));
        assert!(!RelKind::HasGenre.accepts(Person, Genre));
        // Derived edges are never inserted
        assert!(!RelKind::CollaboratedWith.accepts(Person, Person));
    }

    #[test]
    fn test_rel_kind_display_and_parse() {
        for kind in RelKind::ALL {
            assert_eq!(kind.to_string().parse::<RelKind>().unwrap(), kind);
        }
        assert_eq!("acted-in".parse::<RelKind>().unwrap(), RelKind::ActedIn);
        assert!("FRIENDS_WITH".parse::<RelKind>().is_err());
    }

    #[test]
    fn test_rel_kind_serde_uses_wire_names() {
        let json = serde_json::to_string(&RelKind::HasGenre).unwrap();
        assert_eq!(json, r#""HAS_GENRE""#);
    }

    #[test]
    fn test_attr_value_untagged() {
        let a: Attributes =
            serde_json::from_str(r#"{"name":"Nolan","birth_year":1970,"rating":8.8,"alive":true}"#)
                .unwrap();
        assert_eq!(a["name"], AttrValue::Text("Nolan".into()));
        assert_eq!(a["birth_year"], AttrValue::Int(1970));
        assert_eq!(a["rating"], AttrValue::Float(8.8));
        assert_eq!(a["alive"], AttrValue::Bool(true));
    }

    #[test]
    fn test_node_label_fallbacks() {
        let movie = Node {
            id: NodeId::from(1),
            kind: NodeKind::Movie,
            attributes: attrs([("title", "Inception".into())]),
        };
        assert_eq!(movie.label(), "Inception");

        let bare = Node {
            id: NodeId::from("g1"),
            kind: NodeKind::Genre,
            attributes: Attributes::new(),
        };
        assert_eq!(bare.label(), "g1");
    }
}
