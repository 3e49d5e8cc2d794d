//! Domain types for the issue-graph mirror.
//!
//! The types here are deliberately permissive: records carry unknown
//! top-level fields through a load/persist cycle untouched, unknown
//! type tags round-trip via `Other` variants instead of failing, and
//! dependency edges accept both on-disk encodings (a bare id string and
//! a structured object).

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type of issue.
///
/// `Epic` marks a top-level grouping exempt from orphan detection.
/// Tags not in the known set round-trip through `Other` so a record is
/// never rejected (or rewritten) because of an unrecognized type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueType {
    /// Top-level grouping (parent of tasks)
    Epic,
    /// General task
    Task,
    /// Bug fix
    Bug,
    /// New feature
    Feature,
    /// Maintenance/chore
    Chore,
    /// Unrecognized tag, preserved verbatim
    Other(String),
}

impl IssueType {
    /// The on-disk tag for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Epic => "epic",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Chore => "chore",
            Self::Other(tag) => tag,
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "epic" => Self::Epic,
            "task" => Self::Task,
            "bug" => Self::Bug,
            "feature" => Self::Feature,
            "chore" => Self::Chore,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for IssueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Type of dependency relationship between issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeType {
    /// Hierarchical link, epic to task
    ParentChild,
    /// Hard blocker
    Blocks,
    /// Informational link
    Related,
    /// Found during work on the target
    DiscoveredFrom,
    /// Edge carried no type tag; never written back as a tag
    Unspecified,
    /// Unrecognized tag, preserved verbatim
    Other(String),
}

impl EdgeType {
    /// The on-disk tag for this edge type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ParentChild => "parent-child",
            Self::Blocks => "blocks",
            Self::Related => "related",
            Self::DiscoveredFrom => "discovered-from",
            Self::Unspecified => "unspecified",
            Self::Other(tag) => tag,
        }
    }

    fn from_tag(tag: &str) -> Self {
        match tag {
            "parent-child" => Self::ParentChild,
            "blocks" => Self::Blocks,
            "related" => Self::Related,
            "discovered-from" => Self::DiscoveredFrom,
            "unspecified" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EdgeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A typed, directed link from one issue to another.
///
/// The target is a weak reference by id; it may not exist in the store
/// (dangling edges are tolerated). Two legacy encodings are accepted on
/// load and normalized into this one shape:
///
/// - a bare id string: `"bd-6mv"`
/// - a structured object: `{"depends_on_id": "bd-6mv", "dep_type": "parent-child"}`
///   (snapshot exports spell the keys `id` and `type`; both are accepted)
///
/// The canonical write form is the structured object. A record that is
/// never rewritten keeps its original bytes, so normalization only
/// happens to records a repair actually touched.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    /// Id of the issue this edge points at
    pub target_id: IssueId,
    /// Relationship kind; [`EdgeType::Unspecified`] when the tag was absent
    pub edge_type: EdgeType,
    /// Unrecognized keys from the structured encoding, re-emitted as-is
    pub extra: Map<String, Value>,
}

impl DependencyEdge {
    /// Create an edge with no extra fields.
    pub fn new(target_id: impl Into<IssueId>, edge_type: EdgeType) -> Self {
        Self {
            target_id: target_id.into(),
            edge_type,
            extra: Map::new(),
        }
    }
}

/// Key carrying the target id in the live-store encoding.
const EDGE_TARGET_KEY: &str = "depends_on_id";
/// Key carrying the target id in snapshot exports.
const EDGE_TARGET_KEY_LEGACY: &str = "id";
/// Key carrying the edge type in the live-store encoding.
const EDGE_TYPE_KEY: &str = "dep_type";
/// Key carrying the edge type in snapshot exports.
const EDGE_TYPE_KEY_LEGACY: &str = "type";

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEdge {
    Bare(String),
    Structured(Map<String, Value>),
}

impl<'de> Deserialize<'de> for DependencyEdge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawEdge::deserialize(deserializer)? {
            RawEdge::Bare(id) => Ok(Self {
                target_id: IssueId(id),
                edge_type: EdgeType::Unspecified,
                extra: Map::new(),
            }),
            RawEdge::Structured(mut map) => {
                let target = take_string(&mut map, EDGE_TARGET_KEY)
                    .or_else(|| take_string(&mut map, EDGE_TARGET_KEY_LEGACY))
                    .ok_or_else(|| D::Error::custom("dependency edge has no target id"))?;

                let edge_type = take_string(&mut map, EDGE_TYPE_KEY)
                    .or_else(|| take_string(&mut map, EDGE_TYPE_KEY_LEGACY))
                    .map_or(EdgeType::Unspecified, |tag| EdgeType::from_tag(&tag));

                Ok(Self {
                    target_id: IssueId(target),
                    edge_type,
                    extra: map,
                })
            }
        }
    }
}

/// Removes `key` from the map if it holds a string value.
///
/// Non-string values stay in place and ride through `extra`.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(_)) => match map.shift_remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

impl Serialize for DependencyEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = !matches!(self.edge_type, EdgeType::Unspecified);
        let len = 1 + usize::from(tagged) + self.extra.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(EDGE_TARGET_KEY, self.target_id.as_str())?;
        if tagged {
            map.serialize_entry(EDGE_TYPE_KEY, &self.edge_type)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One issue in the mirror.
///
/// Only the fields the repair engine needs are modeled; everything else
/// a record carries lands in `extra` and is re-serialized unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Unique key within the store
    pub id: IssueId,

    /// Issue type; absent in some exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,

    /// Issue title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Labels; label-setting operations overwrite, never merge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Dependency edges, in on-disk order.
    ///
    /// Always serialized (even when emptied by a repair) so that
    /// stripping the last edge leaves an explicit empty list behind.
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,

    /// Unknown top-level fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssueRecord {
    /// Returns `true` if this record is a top-level grouping.
    #[must_use]
    pub fn is_epic(&self) -> bool {
        matches!(self.issue_type, Some(IssueType::Epic))
    }

    /// Returns `true` if any edge is a parent-child link, regardless of
    /// whether the target exists.
    #[must_use]
    pub fn has_parent_edge(&self) -> bool {
        self.dependencies
            .iter()
            .any(|edge| edge.edge_type == EdgeType::ParentChild)
    }

    /// The title, or an empty string when the record carries none.
    #[must_use]
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}
