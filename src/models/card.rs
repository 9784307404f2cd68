use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of a card's content, in characters.
pub const MAX_CARD_CONTENT: usize = 300;

/// A single note submitted during the real retro step.
///
/// The category is fixed at creation. The topic stays `None` until
/// [`SessionStore::assign_topic_to_all`](crate::store::SessionStore::assign_topic_to_all)
/// labels every card at once, so either all cards carry a topic or none do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub content: String,
    pub category: CardCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// The board column a card was submitted under.
///
/// - `Good`: what went well
/// - `Bad`: what went poorly
/// - `Change`: what the team wants to change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Good,
    Bad,
    Change,
}

impl CardCategory {
    pub const ALL: [CardCategory; 3] = [Self::Good, Self::Bad, Self::Change];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

/// Input for submitting a new card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardInput {
    pub content: String,
    pub category: CardCategory,
}

/// Input for editing an existing card. `None` fields are left unchanged.
///
/// Category and topic are not editable per card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCardInput {
    pub content: Option<String>,
}
