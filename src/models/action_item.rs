use serde::{Deserialize, Serialize};

/// Maximum length of an action item's content, in characters.
pub const MAX_ACTION_ITEM_CONTENT: usize = 300;

/// A follow-up the team commits to, tied to the topic it addresses.
///
/// The topic is free text. It normally names one of the current topic
/// groups, but nothing requires the group to still exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionItem {
    pub id: String,
    pub content: String,
    pub topic: String,
}

/// Input for creating an action item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionItemInput {
    pub content: String,
    pub topic: String,
}

/// Input for editing an action item. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateActionItemInput {
    pub content: Option<String>,
}
