//! Chunk and search result types.

use serde::{Deserialize, Deserializer, Serialize};

/// One boolean per role flag stored on each chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    pub role_admin: bool,
    pub role_finance: bool,
    pub role_engineering: bool,
    pub role_hr: bool,
    pub role_marketing: bool,
    pub role_general: bool,
}

impl RoleFlags {
    /// Every flag name a store may filter on.
    pub const KEYS: [&'static str; 6] = [
        "role_admin",
        "role_finance",
        "role_engineering",
        "role_hr",
        "role_marketing",
        "role_general",
    ];

    /// Derive flags from an `allowed_roles` list the way ingestion does.
    pub fn from_allowed(allowed_roles: &[String]) -> Self {
        let has = |name: &str| allowed_roles.iter().any(|r| r.eq_ignore_ascii_case(name));
        Self {
            role_admin: has("admin"),
            role_finance: has("finance"),
            role_engineering: has("engineering"),
            role_hr: has("hr"),
            role_marketing: has("marketing"),
            role_general: has("general") || has("employee"),
        }
    }

    /// Role names for the set flags, in `allowed_roles` form.
    pub fn allowed_roles(&self) -> Vec<String> {
        [
            (self.role_admin, "admin"),
            (self.role_finance, "finance"),
            (self.role_engineering, "engineering"),
            (self.role_hr, "hr"),
            (self.role_marketing, "marketing"),
            (self.role_general, "general"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| name.to_string())
        .collect()
    }

    /// Value of a flag by key, `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "role_admin" => Some(self.role_admin),
            "role_finance" => Some(self.role_finance),
            "role_engineering" => Some(self.role_engineering),
            "role_hr" => Some(self.role_hr),
            "role_marketing" => Some(self.role_marketing),
            "role_general" => Some(self.role_general),
            _ => None,
        }
    }
}

/// Access and attribution metadata attached to a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChunkMetadata")]
pub struct ChunkMetadata {
    pub source_document: String,
    pub section_title: String,
    pub department: String,
    pub allowed_roles: Vec<String>,
    #[serde(flatten)]
    pub flags: RoleFlags,
}

impl ChunkMetadata {
    /// Metadata whose flags follow `allowed_roles`.
    pub fn new(
        source_document: impl Into<String>,
        section_title: impl Into<String>,
        department: impl Into<String>,
        allowed_roles: Vec<String>,
    ) -> Self {
        let flags = RoleFlags::from_allowed(&allowed_roles);
        Self {
            source_document: source_document.into(),
            section_title: section_title.into(),
            department: department.into(),
            allowed_roles,
            flags,
        }
    }

    /// Shorthand used by fixtures and tools: section "Overview", department
    /// taken from the first role.
    pub fn for_roles(source_document: &str, roles: &[&str]) -> Self {
        let department = match roles.first() {
            Some(&"employee") | None => "general",
            Some(first) => *first,
        };
        Self::new(
            source_document,
            "Overview",
            department,
            roles.iter().map(|r| r.to_string()).collect(),
        )
    }
}

/// Wire form: flags optional, `allowed_roles` as a list or comma-joined string.
///
/// When only flags are given, `allowed_roles` is rebuilt from them so the
/// post-retrieval role check agrees with the store filter.
#[derive(Deserialize)]
struct RawChunkMetadata {
    #[serde(default = "unknown_source")]
    source_document: String,
    #[serde(default = "unknown_section")]
    section_title: String,
    #[serde(default)]
    department: String,
    #[serde(default, deserialize_with = "roles_list_or_joined")]
    allowed_roles: Vec<String>,
    role_admin: Option<bool>,
    role_finance: Option<bool>,
    role_engineering: Option<bool>,
    role_hr: Option<bool>,
    role_marketing: Option<bool>,
    role_general: Option<bool>,
}

fn unknown_source() -> String {
    "Unknown".to_string()
}

fn unknown_section() -> String {
    "N/A".to_string()
}

impl From<RawChunkMetadata> for ChunkMetadata {
    fn from(raw: RawChunkMetadata) -> Self {
        let derived = RoleFlags::from_allowed(&raw.allowed_roles);
        let flags = RoleFlags {
            role_admin: raw.role_admin.unwrap_or(derived.role_admin),
            role_finance: raw.role_finance.unwrap_or(derived.role_finance),
            role_engineering: raw.role_engineering.unwrap_or(derived.role_engineering),
            role_hr: raw.role_hr.unwrap_or(derived.role_hr),
            role_marketing: raw.role_marketing.unwrap_or(derived.role_marketing),
            role_general: raw.role_general.unwrap_or(derived.role_general),
        };

        let allowed_roles = if raw.allowed_roles.is_empty() {
            flags.allowed_roles()
        } else {
            raw.allowed_roles
        };

        Self {
            source_document: raw.source_document,
            section_title: raw.section_title,
            department: raw.department,
            allowed_roles,
            flags,
        }
    }
}

fn roles_list_or_joined<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Roles {
        List(Vec<String>),
        Joined(String),
    }

    let roles = match Roles::deserialize(deserializer)? {
        Roles::List(list) => list,
        Roles::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };

    Ok(roles
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect())
}

/// A retrievable unit of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Ranked retrieval output as parallel lists.
///
/// All four lists always have the same length; entries are ordered by
/// ascending distance as returned by the store, or by reranked order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    ids: Vec<String>,
    documents: Vec<String>,
    metadatas: Vec<ChunkMetadata>,
    distances: Vec<f32>,
}

/// Borrowed view of one entry.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub id: &'a str,
    pub document: &'a str,
    pub metadata: &'a ChunkMetadata,
    pub distance: f32,
}

impl SearchResult {
    pub fn push(
        &mut self,
        id: impl Into<String>,
        document: impl Into<String>,
        metadata: ChunkMetadata,
        distance: f32,
    ) {
        self.ids.push(id.into());
        self.documents.push(document.into());
        self.metadatas.push(metadata);
        self.distances.push(distance);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn metadatas(&self) -> &[ChunkMetadata] {
        &self.metadatas
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn get(&self, index: usize) -> Option<SearchHit<'_>> {
        Some(SearchHit {
            id: self.ids.get(index)?,
            document: self.documents.get(index)?,
            metadata: self.metadatas.get(index)?,
            distance: *self.distances.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SearchHit<'_>> {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// New result holding the given entries, in the given order.
    ///
    /// Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut out = Self::default();
        for hit in indices.iter().filter_map(|&i| self.get(i)) {
            out.push(hit.id, hit.document, hit.metadata.clone(), hit.distance);
        }
        out
    }

    /// The leading `n` entries.
    pub fn take(&self, n: usize) -> Self {
        let indices: Vec<usize> = (0..n.min(self.len())).collect();
        self.select(&indices)
    }
}
