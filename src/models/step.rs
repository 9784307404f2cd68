use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseStepError;

/// A stage of the retrospective workflow.
///
/// The steps have a natural order (`Icebreaker` → `LastRetro` → `RealRetro`
/// → `Topics` → `Checkout`), but navigation between them is unrestricted:
/// any step can be entered directly, and going back is always allowed.
/// There is no terminal step; `Checkout` returns to `Icebreaker` via a
/// session restart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RetroStep {
    /// Warm-up question for the team.
    #[default]
    Icebreaker,
    /// Review of the previous retrospective's action items.
    LastRetro,
    /// Free-form note capture in the good / bad / change columns.
    RealRetro,
    /// Topic grouping, voting and action item creation.
    Topics,
    /// Session summary.
    Checkout,
}

impl RetroStep {
    /// Every step, in workflow order.
    pub const ALL: [RetroStep; 5] = [
        Self::Icebreaker,
        Self::LastRetro,
        Self::RealRetro,
        Self::Topics,
        Self::Checkout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icebreaker => "icebreaker",
            Self::LastRetro => "lastRetro",
            Self::RealRetro => "realRetro",
            Self::Topics => "topics",
            Self::Checkout => "checkout",
        }
    }

    /// Human-readable name shown in progress indicators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Icebreaker => "Icebreaker",
            Self::LastRetro => "Last Retro",
            Self::RealRetro => "Real Retro",
            Self::Topics => "Topics",
            Self::Checkout => "Checkout",
        }
    }

    /// Zero-based position in [`RetroStep::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Icebreaker => 0,
            Self::LastRetro => 1,
            Self::RealRetro => 2,
            Self::Topics => 3,
            Self::Checkout => 4,
        }
    }

    /// The step after this one. `Checkout` stays at `Checkout`.
    pub fn next(&self) -> Self {
        Self::ALL
            .get(self.index() + 1)
            .copied()
            .unwrap_or(Self::Checkout)
    }

    /// The step before this one. `Icebreaker` stays at `Icebreaker`.
    pub fn previous(&self) -> Self {
        self.index()
            .checked_sub(1)
            .map(|i| Self::ALL[i])
            .unwrap_or(Self::Icebreaker)
    }
}

impl fmt::Display for RetroStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetroStep {
    type Err = ParseStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| ParseStepError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_every_step_identifier() {
        for step in RetroStep::ALL {
            assert_eq!(step.as_str().parse::<RetroStep>().unwrap(), step);
        }
    }

    #[test]
    fn test_rejects_unknown_identifier() {
        let err = "retro".parse::<RetroStep>().unwrap_err();
        assert_eq!(err.0, "retro");

        // Identifiers are case-sensitive
        assert!("LastRetro".parse::<RetroStep>().is_err());
        assert!("".parse::<RetroStep>().is_err());
    }

    #[test]
    fn test_serde_uses_camel_case_identifiers() {
        let json = serde_json::to_string(&RetroStep::RealRetro).unwrap();
        assert_eq!(json, "\"realRetro\"");

        let step: RetroStep = serde_json::from_str("\"lastRetro\"").unwrap();
        assert_eq!(step, RetroStep::LastRetro);
    }

    #[test]
    fn test_next_and_previous_saturate() {
        assert_eq!(RetroStep::Icebreaker.next(), RetroStep::LastRetro);
        assert_eq!(RetroStep::Topics.next(), RetroStep::Checkout);
        assert_eq!(RetroStep::Checkout.next(), RetroStep::Checkout);

        assert_eq!(RetroStep::Checkout.previous(), RetroStep::Topics);
        assert_eq!(RetroStep::Icebreaker.previous(), RetroStep::Icebreaker);
    }

    #[test]
    fn test_index_matches_workflow_order() {
        for (i, step) in RetroStep::ALL.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }
}
