// Drafting strategies: the policy each simulated team uses to rank candidates.

pub mod variants;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::draft::player::Player;
use crate::draft::roster::Roster;
use crate::valuation::ScoringEngine;

use variants::{Aggressive, BestValue, Conservative, HelperDriven, PositionalNeed};

/// A draftable player and the score a strategy gave it.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub player: &'a Player,
    pub score: f64,
}

/// Ranks the available pool for one team's pick.
///
/// Implementations skip players the roster cannot take, return an empty list
/// for an empty pool, and never mutate their inputs.
pub trait DraftStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Candidates ordered best-first.
    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        round: u8,
    ) -> Vec<Candidate<'a>>;
}

/// Sort best-first. Stable, so ties keep pool order.
pub(crate) fn sort_best_first(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

// ---------------------------------------------------------------------------
// Strategy kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Conservative,
    Aggressive,
    PositionalNeed,
    BestValue,
    HelperDriven,
}

type Builder = fn(Arc<ScoringEngine>) -> Box<dyn DraftStrategy>;

fn conservative(engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
    Box::new(Conservative::new(engine))
}

fn aggressive(engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
    Box::new(Aggressive::new(engine))
}

fn positional_need(engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
    Box::new(PositionalNeed::new(engine))
}

fn best_value(engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
    Box::new(BestValue::new(engine))
}

fn helper_driven(engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
    Box::new(HelperDriven::new(engine))
}

/// Construction table. Resolved once per team, so the draft loop only ever
/// calls through the trait object.
const BUILDERS: &[(StrategyKind, Builder)] = &[
    (StrategyKind::Conservative, conservative),
    (StrategyKind::Aggressive, aggressive),
    (StrategyKind::PositionalNeed, positional_need),
    (StrategyKind::BestValue, best_value),
    (StrategyKind::HelperDriven, helper_driven),
];

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Conservative,
        StrategyKind::Aggressive,
        StrategyKind::PositionalNeed,
        StrategyKind::BestValue,
        StrategyKind::HelperDriven,
    ];

    /// Parse a config name. Accepts the short and long spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "conservative" => Some(StrategyKind::Conservative),
            "aggressive" => Some(StrategyKind::Aggressive),
            "positional" | "positional_need" => Some(StrategyKind::PositionalNeed),
            "value" | "best_value" => Some(StrategyKind::BestValue),
            "draft_helper" | "helper_driven" => Some(StrategyKind::HelperDriven),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Conservative => "conservative",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::PositionalNeed => "positional_need",
            StrategyKind::BestValue => "best_value",
            StrategyKind::HelperDriven => "helper_driven",
        }
    }

    pub fn build(self, engine: Arc<ScoringEngine>) -> Box<dyn DraftStrategy> {
        let builder = BUILDERS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(best_value as Builder, |(_, b)| *b);
        builder(engine)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringOptions;
    use crate::draft::pick::Position;
    use crate::draft::rules::RosterRules;
    use crate::valuation::params::{baseline_map, ParameterSet};

    fn engine() -> Arc<ScoringEngine> {
        let params = ParameterSet::from_map(baseline_map()).unwrap();
        Arc::new(ScoringEngine::new(Arc::new(params), ScoringOptions::default()).unwrap())
    }

    #[test]
    fn from_name_accepts_aliases() {
        assert_eq!(StrategyKind::from_name("value"), Some(StrategyKind::BestValue));
        assert_eq!(StrategyKind::from_name("best_value"), Some(StrategyKind::BestValue));
        assert_eq!(
            StrategyKind::from_name("Positional"),
            Some(StrategyKind::PositionalNeed)
        );
        assert_eq!(
            StrategyKind::from_name("draft_helper"),
            Some(StrategyKind::HelperDriven)
        );
        assert_eq!(StrategyKind::from_name("reckless"), None);
    }

    #[test]
    fn every_kind_has_a_builder() {
        for kind in StrategyKind::ALL {
            assert!(BUILDERS.iter().any(|(k, _)| *k == kind), "{kind} has no builder");
            assert_eq!(kind.build(engine()).kind(), kind);
            assert_eq!(StrategyKind::from_name(kind.label()), Some(kind));
        }
    }

    #[test]
    fn every_strategy_tolerates_empty_pool() {
        let roster = Roster::new(Arc::new(RosterRules::standard()));
        for kind in StrategyKind::ALL {
            let strategy = kind.build(engine());
            assert!(strategy.rank_candidates(&[], &roster, 1).is_empty());
        }
    }

    #[test]
    fn every_strategy_skips_undraftable() {
        let mut roster = Roster::new(Arc::new(RosterRules::standard()));
        assert!(roster.draft_player(&Player::new("k0", "K0", Position::Kicker, vec![8.0; 17])));
        let pool = vec![
            Player::new("k1", "K1", Position::Kicker, vec![9.0; 17]),
            Player::new("te", "TE", Position::TightEnd, vec![7.0; 17]),
        ];
        for kind in StrategyKind::ALL {
            let ranked = kind.build(engine()).rank_candidates(&pool, &roster, 3);
            assert_eq!(ranked.len(), 1, "{kind}");
            assert_eq!(ranked[0].player.id, "te");
        }
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let a = Player::new("a", "A", Position::TightEnd, vec![]);
        let b = Player::new("b", "B", Position::TightEnd, vec![]);
        let c = Player::new("c", "C", Position::TightEnd, vec![]);
        let mut list = vec![
            Candidate { player: &a, score: 1.0 },
            Candidate { player: &b, score: 2.0 },
            Candidate { player: &c, score: 1.0 },
        ];
        sort_best_first(&mut list);
        let ids: Vec<&str> = list.iter().map(|c| c.player.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
