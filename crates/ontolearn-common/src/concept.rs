/// Concept kinds tracked by the corpus index.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Concept kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Construct,
    Task,
    BrainRegion,
}

impl ConceptKind {
    /// All kinds, in the order the concept list is written.
    pub const ALL: [ConceptKind; 3] = [
        ConceptKind::Construct,
        ConceptKind::Task,
        ConceptKind::BrainRegion,
    ];

    /// The key this kind uses in a per-paper extraction file.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptKind::Construct   => "construct",
            ConceptKind::Task        => "task",
            ConceptKind::BrainRegion => "brain_region",
        }
    }
}

impl std::fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request id used by the downstream batch-prompt generator,
/// e.g. `construct-working_memory`.
pub fn concept_id(kind: ConceptKind, name: &str) -> String {
    format!("{}-{}", kind.as_str(), name.trim().replace(' ', "_")).to_lowercase()
}
