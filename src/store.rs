//! The session store: the single writer for a retrospective [`Session`].
//!
//! Presentation code holds a `SessionStore`, reads through its selectors and
//! changes state only through its commands. Every command that changes the
//! session writes a fresh snapshot to the injected [`SnapshotStorage`].
//! Commands that turn out to be no-ops (an unknown id, an exhausted vote
//! budget or an update with no fields) leave both the session and storage
//! untouched.
//!
//! Durable writes are best-effort: a failing backend is logged and the
//! in-memory session stays authoritative.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::{ParseStepError, ValidationError};
use crate::models::*;
use crate::snapshot;
use crate::storage::SnapshotStorage;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "retro-storage";

pub struct SessionStore<S: SnapshotStorage> {
    storage: S,
    key: String,
    session: Session,
}

impl<S: SnapshotStorage> SessionStore<S> {
    /// Open a store under [`DEFAULT_STORAGE_KEY`], restoring any saved session.
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Open a store under `key`.
    ///
    /// A missing snapshot starts a fresh session. So does a snapshot that
    /// cannot be read or fails validation; the bad record is left in place
    /// and replaced by the next write.
    pub fn open_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let session = load(&storage, &key);
        Self {
            storage,
            key,
            session,
        }
    }

    // ============================================================
    // Selectors
    // ============================================================

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_step(&self) -> RetroStep {
        self.session.current_step
    }

    pub fn icebreaker_response(&self) -> &str {
        &self.session.icebreaker_response
    }

    pub fn prior_action_items(&self) -> &[ActionItem] {
        &self.session.prior_action_items
    }

    pub fn cards(&self) -> &[Card] {
        &self.session.cards
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.session.cards.iter().find(|c| c.id == id)
    }

    pub fn votes(&self) -> &BTreeMap<String, u32> {
        &self.session.votes
    }

    pub fn available_votes(&self) -> u32 {
        self.session.available_votes
    }

    pub fn action_items(&self) -> &[ActionItem] {
        &self.session.action_items
    }

    /// Cards grouped by topic. See [`Session::topic_groups`].
    pub fn topic_groups(&self) -> Vec<TopicGroup> {
        self.session.topic_groups()
    }

    pub fn summary(&self) -> SessionSummary {
        self.session.summary()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    // ============================================================
    // Step navigation
    // ============================================================

    /// Move to any step. Skipping ahead and going back are both allowed.
    pub fn set_step(&mut self, step: RetroStep) {
        tracing::debug!("Step {} -> {}", self.session.current_step, step);
        self.session.current_step = step;
        self.persist();
    }

    /// Move to the step named by `id`. Unknown identifiers are rejected and
    /// the current step is kept.
    pub fn set_step_by_id(&mut self, id: &str) -> Result<(), ParseStepError> {
        let step: RetroStep = id.parse()?;
        self.set_step(step);
        Ok(())
    }

    /// Record the icebreaker answer, trimmed. A blank answer clears it.
    pub fn set_icebreaker_response(&mut self, response: &str) -> Result<(), ValidationError> {
        let response = response.trim();
        check_length("icebreaker response", response, MAX_ICEBREAKER_RESPONSE)?;

        self.session.icebreaker_response = response.to_string();
        self.persist();
        Ok(())
    }

    // ============================================================
    // Cards
    // ============================================================

    /// Append a new card without a topic.
    pub fn add_card(&mut self, input: CreateCardInput) -> Result<Card, ValidationError> {
        let content = normalize_text("card content", &input.content, MAX_CARD_CONTENT)?;

        let card = Card {
            id: generate_id(),
            content,
            category: input.category,
            topic: None,
        };
        tracing::debug!("Added {} card {}", card.category, card.id);

        self.session.cards.push(card.clone());
        self.persist();
        Ok(card)
    }

    /// Merge `input` onto the card with `id`. Returns `Ok(None)` if no card
    /// matches.
    pub fn update_card(
        &mut self,
        id: &str,
        input: UpdateCardInput,
    ) -> Result<Option<Card>, ValidationError> {
        let content = input
            .content
            .as_deref()
            .map(|c| normalize_text("card content", c, MAX_CARD_CONTENT))
            .transpose()?;

        let Some(card) = self.session.cards.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        let Some(content) = content else {
            return Ok(Some(card.clone()));
        };
        card.content = content;
        let updated = card.clone();

        self.persist();
        Ok(Some(updated))
    }

    /// Remove the card with `id`. Vote tallies are keyed by topic and are
    /// not touched, even if this was the last card under its topic.
    pub fn remove_card(&mut self, id: &str) -> bool {
        let before = self.session.cards.len();
        self.session.cards.retain(|c| c.id != id);

        let removed = self.session.cards.len() != before;
        if removed {
            tracing::debug!("Removed card {}", id);
            self.persist();
        }
        removed
    }

    /// Label every current card with `topic`, replacing earlier topics.
    ///
    /// Returns the number of cards labelled.
    pub fn assign_topic_to_all(&mut self, topic: &str) -> Result<usize, ValidationError> {
        let topic = normalize_text("topic", topic, usize::MAX)?;

        if self.session.cards.is_empty() {
            return Ok(0);
        }

        for card in &mut self.session.cards {
            card.topic = Some(topic.clone());
        }
        let count = self.session.cards.len();
        tracing::debug!("Assigned topic {:?} to {} cards", topic, count);

        self.persist();
        Ok(count)
    }

    // ============================================================
    // Voting
    // ============================================================

    /// Spend one vote on `topic`.
    ///
    /// Returns `Ok(false)` without changing anything once the budget is used
    /// up. The tally and the remaining budget change together or not at all.
    pub fn vote_for_topic(&mut self, topic: &str) -> Result<bool, ValidationError> {
        let topic = normalize_text("topic", topic, usize::MAX)?;

        let Some(remaining) = self.session.available_votes.checked_sub(1) else {
            tracing::debug!("Vote for {:?} rejected, no votes left", topic);
            return Ok(false);
        };

        *self.session.votes.entry(topic).or_insert(0) += 1;
        self.session.available_votes = remaining;

        self.persist();
        Ok(true)
    }

    // ============================================================
    // Action items
    // ============================================================

    /// Append an action item. The topic does not have to match a current
    /// topic group.
    pub fn add_action_item(
        &mut self,
        input: CreateActionItemInput,
    ) -> Result<ActionItem, ValidationError> {
        let content = normalize_text(
            "action item content",
            &input.content,
            MAX_ACTION_ITEM_CONTENT,
        )?;
        let topic = normalize_text("topic", &input.topic, usize::MAX)?;

        let item = ActionItem {
            id: generate_id(),
            content,
            topic,
        };
        tracing::debug!("Added action item {} for {:?}", item.id, item.topic);

        self.session.action_items.push(item.clone());
        self.persist();
        Ok(item)
    }

    /// Merge `input` onto the action item with `id`. Returns `Ok(None)` if no
    /// item matches.
    pub fn update_action_item(
        &mut self,
        id: &str,
        input: UpdateActionItemInput,
    ) -> Result<Option<ActionItem>, ValidationError> {
        let content = input
            .content
            .as_deref()
            .map(|c| normalize_text("action item content", c, MAX_ACTION_ITEM_CONTENT))
            .transpose()?;

        let Some(item) = self.session.action_items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };

        let Some(content) = content else {
            return Ok(Some(item.clone()));
        };
        item.content = content;
        let updated = item.clone();

        self.persist();
        Ok(Some(updated))
    }

    pub fn remove_action_item(&mut self, id: &str) -> bool {
        let before = self.session.action_items.len();
        self.session.action_items.retain(|i| i.id != id);

        let removed = self.session.action_items.len() != before;
        if removed {
            tracing::debug!("Removed action item {}", id);
            self.persist();
        }
        removed
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Return to a fresh session and drop the stored snapshot.
    pub fn reset_session(&mut self) {
        self.session = Session::default();

        if let Err(e) = self.storage.clear(&self.key) {
            tracing::warn!("Failed to clear session snapshot {:?}: {:#}", self.key, e);
        }
        tracing::info!("Session reset");
    }

    /// Start over from checkout. Same as [`reset_session`](Self::reset_session).
    pub fn restart(&mut self) {
        self.reset_session();
    }

    fn persist(&self) {
        let bytes = match snapshot::encode(&self.session) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode session snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &bytes) {
            tracing::warn!("Failed to write session snapshot {:?}: {:#}", self.key, e);
        }
    }
}

fn load<S: SnapshotStorage>(storage: &S, key: &str) -> Session {
    let bytes = match storage.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Session::default(),
        Err(e) => {
            tracing::warn!("Failed to read session snapshot {:?}, starting fresh: {:#}", key, e);
            return Session::default();
        }
    };

    match snapshot::decode(&bytes) {
        Ok(session) => {
            tracing::debug!("Restored session snapshot {:?} at step {}", key, session.current_step);
            session
        }
        Err(e) => {
            tracing::warn!("Discarding session snapshot {:?}: {}", key, e);
            Session::default()
        }
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Check that `value` is non-blank and at most `max` characters once trimmed.
pub(crate) fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    check_length(field, trimmed, max)
}

/// Check that `value` is at most `max` characters. Blank values pass.
pub(crate) fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }

    Ok(())
}

fn normalize_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    check_text(field, value, max)?;
    Ok(value.trim().to_string())
}
