use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action_item::ActionItem;
use super::card::{Card, CardCategory};
use super::step::RetroStep;

/// Number of votes each session starts with.
pub const VOTE_BUDGET: u32 = 3;

/// Maximum length of the icebreaker response, in characters.
pub const MAX_ICEBREAKER_RESPONSE: usize = 500;

/// The root state of one retrospective run.
///
/// A `Session` is plain data. All mutation goes through
/// [`SessionStore`](crate::store::SessionStore), which enforces the vote
/// budget and keeps the durable snapshot in sync.
///
/// `votes` only contains topics that received at least one vote; a missing
/// entry means zero. Since there is no way to take a vote back, the recorded
/// votes plus `available_votes` always add up to [`VOTE_BUDGET`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub current_step: RetroStep,
    pub icebreaker_response: String,
    /// Reference data for the last-retro step. Never persisted, always reseeded.
    pub prior_action_items: Vec<ActionItem>,
    pub cards: Vec<Card>,
    pub votes: BTreeMap<String, u32>,
    pub available_votes: u32,
    pub action_items: Vec<ActionItem>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_step: RetroStep::default(),
            icebreaker_response: String::new(),
            prior_action_items: prior_action_items(),
            cards: Vec::new(),
            votes: BTreeMap::new(),
            available_votes: VOTE_BUDGET,
            action_items: Vec::new(),
        }
    }
}

impl Session {
    /// Group cards by topic, skipping cards without one.
    ///
    /// Topics appear in the order they are first seen while scanning the
    /// cards, and cards keep their submission order within a group.
    pub fn topic_groups(&self) -> Vec<TopicGroup> {
        let mut groups: Vec<TopicGroup> = Vec::new();

        for card in &self.cards {
            let Some(topic) = card.topic.as_deref() else {
                continue;
            };

            match groups.iter_mut().find(|g| g.topic == topic) {
                Some(group) => group.cards.push(card.clone()),
                None => groups.push(TopicGroup {
                    topic: topic.to_string(),
                    cards: vec![card.clone()],
                    votes: self.votes_for(topic),
                }),
            }
        }

        groups
    }

    /// Vote tally for a topic. Topics nobody voted for count as zero.
    pub fn votes_for(&self, topic: &str) -> u32 {
        self.votes.get(topic).copied().unwrap_or(0)
    }

    /// Total votes cast so far, across all topics.
    pub fn total_votes(&self) -> u32 {
        self.votes.values().sum()
    }

    /// Cards in one board column, in submission order.
    pub fn cards_in(&self, category: CardCategory) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |c| c.category == category)
    }

    /// Statistics shown at checkout.
    pub fn summary(&self) -> SessionSummary {
        let mut topics: Vec<&str> = self.cards.iter().filter_map(|c| c.topic.as_deref()).collect();
        topics.sort_unstable();
        topics.dedup();

        SessionSummary {
            total_cards: self.cards.len(),
            total_votes: self.total_votes(),
            total_action_items: self.action_items.len(),
            topics_count: topics.len(),
        }
    }
}

/// One topic with the cards labelled with it and its current vote count.
///
/// This is a projection over [`Session::cards`] and [`Session::votes`]; it is
/// recomputed on demand and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicGroup {
    pub topic: String,
    pub cards: Vec<Card>,
    pub votes: u32,
}

/// Session statistics for the checkout step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_cards: usize,
    pub total_votes: u32,
    pub total_action_items: usize,
    /// Distinct topics among the current cards.
    pub topics_count: usize,
}

/// Action items from the previous retrospective, shown in the last-retro step.
pub fn prior_action_items() -> Vec<ActionItem> {
    vec![
        ActionItem {
            id: "mock-1".to_string(),
            content: "Improve our daily standup structure".to_string(),
            topic: "Communication".to_string(),
        },
        ActionItem {
            id: "mock-2".to_string(),
            content: "Set up automated testing pipeline".to_string(),
            topic: "Development".to_string(),
        },
    ]
}
