//! Durable snapshot codec.
//!
//! A snapshot holds the session output that survives a reload: step,
//! icebreaker response, cards, votes, remaining budget and action items.
//! Prior action items are reference data and are reseeded on every decode.
//!
//! Snapshots are JSON with an explicit `version`. Decoding validates the
//! structure as well as the session invariants, so a tampered or truncated
//! record is rejected as a whole rather than partially restored.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::models::*;
use crate::store::{check_length, check_text};

/// Format version written by [`encode`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SessionSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    current_step: RetroStep,
    icebreaker_response: String,
    cards: Vec<Card>,
    votes: BTreeMap<String, u32>,
    available_votes: u32,
    action_items: Vec<ActionItem>,
}

/// Serialize the persisted subset of a session.
pub fn encode(session: &Session) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = SessionSnapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        current_step: session.current_step,
        icebreaker_response: session.icebreaker_response.clone(),
        cards: session.cards.clone(),
        votes: session.votes.clone(),
        available_votes: session.available_votes,
        action_items: session.action_items.clone(),
    };

    Ok(serde_json::to_vec(&snapshot)?)
}

/// Rebuild a session from snapshot bytes.
pub fn decode(bytes: &[u8]) -> Result<Session, SnapshotError> {
    let snapshot: SessionSnapshot = serde_json::from_slice(bytes)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    validate(&snapshot)?;

    Ok(Session {
        current_step: snapshot.current_step,
        icebreaker_response: snapshot.icebreaker_response,
        prior_action_items: prior_action_items(),
        cards: snapshot.cards,
        votes: snapshot.votes,
        available_votes: snapshot.available_votes,
        action_items: snapshot.action_items,
    })
}

fn validate(snapshot: &SessionSnapshot) -> Result<(), SnapshotError> {
    let invalid = |msg: String| SnapshotError::Invalid(msg);

    check_length(
        "icebreaker response",
        snapshot.icebreaker_response.trim(),
        MAX_ICEBREAKER_RESPONSE,
    )
    .map_err(|e| invalid(e.to_string()))?;

    let mut seen = HashSet::new();
    for card in &snapshot.cards {
        if !seen.insert(card.id.as_str()) {
            return Err(invalid(format!("duplicate card id {}", card.id)));
        }
        check_text("card content", &card.content, MAX_CARD_CONTENT)
            .map_err(|e| invalid(e.to_string()))?;
        if let Some(topic) = &card.topic {
            check_text("card topic", topic, usize::MAX).map_err(|e| invalid(e.to_string()))?;
        }
    }

    let tagged = snapshot.cards.iter().filter(|c| c.topic.is_some()).count();
    if tagged != 0 && tagged != snapshot.cards.len() {
        return Err(invalid(format!(
            "{tagged} of {} cards have a topic",
            snapshot.cards.len()
        )));
    }

    seen.clear();
    for item in &snapshot.action_items {
        if !seen.insert(item.id.as_str()) {
            return Err(invalid(format!("duplicate action item id {}", item.id)));
        }
        check_text("action item content", &item.content, MAX_ACTION_ITEM_CONTENT)
            .map_err(|e| invalid(e.to_string()))?;
        check_text("action item topic", &item.topic, usize::MAX)
            .map_err(|e| invalid(e.to_string()))?;
    }

    if let Some((topic, _)) = snapshot.votes.iter().find(|(_, &count)| count == 0) {
        return Err(invalid(format!("zero vote entry for {topic:?}")));
    }

    let cast: u64 = snapshot.votes.values().map(|&v| u64::from(v)).sum();
    if snapshot.available_votes > VOTE_BUDGET
        || cast + u64::from(snapshot.available_votes) != u64::from(VOTE_BUDGET)
    {
        return Err(invalid(format!(
            "{cast} votes cast with {} remaining does not match a budget of {VOTE_BUDGET}",
            snapshot.available_votes
        )));
    }

    Ok(())
}
