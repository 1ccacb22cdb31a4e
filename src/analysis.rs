//! Learning blueprint produced by the extraction step
//!
//! Every collection defaults to empty and every scalar is optional, so a
//! partial or sparse blueprint deserializes without error.

use serde::{Deserialize, Deserializer, Serialize};

/// Structured blueprint: vocabulary plus levels of quests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    #[serde(deserialize_with = "null_as_empty")]
    pub vocabulary: Vec<VocabularyEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyEntry {
    pub term: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Level {
    pub name: Option<String>,
    pub overview: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub quests: Vec<Quest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<NamedEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub abilities: Vec<NamedEntry>,
    /// A single name is accepted in place of a list
    #[serde(deserialize_with = "string_or_seq")]
    pub dependencies: Vec<String>,
}

/// Items and abilities arrive either as bare strings or as small objects.
///
/// Anything else is kept as `Other` and contributes no concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedEntry {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    Other(serde_json::Value),
}

impl NamedEntry {
    pub fn name(&self) -> Option<&str> {
        match self {
            NamedEntry::Name(name) => Some(name),
            NamedEntry::Detailed { name, .. } => name.as_deref(),
            NamedEntry::Other(_) => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            NamedEntry::Detailed { description, .. } => description.as_deref(),
            _ => None,
        }
    }
}

/// `null` collections are treated the same as absent ones.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

/// `null`, a single string or a list of strings; `null` list members are dropped.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names.into_iter().flatten().collect(),
    })
}

impl Analysis {
    /// Parse a blueprint from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty() && self.levels.is_empty()
    }
}
