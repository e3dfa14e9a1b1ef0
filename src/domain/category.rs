//! Category master: the classification tree shown to sellers and buyers.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::error::MarketError;

/// One node of the category tree. Item rows store the leaf `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    /// Stable category code (e.g. `"010"`).
    pub code: String,
    /// Display label.
    pub label: String,
    /// Sub-categories.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    fn leaf(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            children: Vec::new(),
        }
    }
}

/// Seed tree used until an admin replaces it.
#[must_use]
pub fn default_tree() -> Vec<CategoryNode> {
    vec![
        CategoryNode {
            code: "000".to_string(),
            label: "Asset & Investment".to_string(),
            children: vec![
                CategoryNode::leaf("010", "Trading Cards"),
                CategoryNode::leaf("020", "Graded Slabs"),
            ],
        },
        CategoryNode {
            code: "100".to_string(),
            label: "Books".to_string(),
            children: vec![
                CategoryNode::leaf("110", "Comics & Manga"),
                CategoryNode::leaf("120", "Business & Practical"),
            ],
        },
    ]
}

/// In-memory category master shared by all handlers.
#[derive(Debug)]
pub struct CategoryMaster {
    tree: RwLock<Vec<CategoryNode>>,
}

impl CategoryMaster {
    /// Creates a master holding `tree`.
    #[must_use]
    pub fn new(tree: Vec<CategoryNode>) -> Self {
        Self {
            tree: RwLock::new(tree),
        }
    }

    /// Returns a snapshot of the current tree.
    pub async fn snapshot(&self) -> Vec<CategoryNode> {
        self.tree.read().await.clone()
    }

    /// Replaces the whole tree.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] if `tree` is empty.
    pub async fn replace(&self, tree: Vec<CategoryNode>) -> Result<(), MarketError> {
        if tree.is_empty() {
            return Err(MarketError::InvalidRequest(
                "categories must not be empty".to_string(),
            ));
        }
        *self.tree.write().await = tree;
        Ok(())
    }
}

impl Default for CategoryMaster {
    fn default() -> Self {
        Self::new(default_tree())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_rejects_empty_tree() {
        let master = CategoryMaster::default();
        assert!(master.replace(Vec::new()).await.is_err());
        assert_eq!(master.snapshot().await, default_tree());
    }

    #[tokio::test]
    async fn replace_swaps_tree() {
        let master = CategoryMaster::default();
        let tree = vec![CategoryNode::leaf("900", "Other")];
        assert!(master.replace(tree.clone()).await.is_ok());
        assert_eq!(master.snapshot().await, tree);
    }

    #[test]
    fn leaves_serialize_without_children() {
        let json = serde_json::to_value(CategoryNode::leaf("010", "Trading Cards"));
        let Ok(json) = json else {
            panic!("serialization failed");
        };
        assert!(json.get("children").is_none());
    }
}
