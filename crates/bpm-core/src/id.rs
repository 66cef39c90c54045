use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by node and edge ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Interned identifier of a diagram element (node or edge).
///
/// Ids come from the persisted document (`"1"`, `"edge-1712"`, ...) or are
/// minted by the graph with a kind prefix (`task_3`). 4 bytes, `Copy`,
/// O(1) equality and hashing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern `s`, returning the existing id if it was seen before.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Build a candidate id `prefix_n`. Uniqueness within a document is the
    /// caller's job (see `ProcessGraph::fresh_id`).
    pub fn numbered(prefix: &str, n: u64) -> Self {
        Self::intern(&format!("{prefix}_{n}"))
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a = ElementId::intern("approve_invoice");
        let b = ElementId::from("approve_invoice");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "approve_invoice");
    }

    #[test]
    fn numbered_ids_carry_prefix() {
        let id = ElementId::numbered("lane", 4);
        assert_eq!(id.as_str(), "lane_4");
        assert_eq!(id.to_string(), "lane_4");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ElementId::intern("e1-2");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"e1-2\"");
        let back: ElementId = serde_json::from_str("\"e1-2\"").unwrap();
        assert_eq!(back, id);
    }
}
