// Roster construction and slot assignment.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use super::pick::Position;
use super::player::{DraftStatus, Player};
use super::rules::RosterRules;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster bookkeeping is inconsistent: {0}")]
    Inconsistent(String),
}

/// A team's drafted players and the slot each one occupies.
///
/// The slot map is the source of truth for occupancy. Counts are always
/// derived from it.
#[derive(Debug, Clone)]
pub struct Roster {
    rules: Arc<RosterRules>,
    players: Vec<Player>,
    slots: BTreeMap<Position, Vec<String>>,
    rounds: BTreeMap<u8, String>,
}

impl Roster {
    /// Create an empty roster governed by `rules`.
    pub fn new(rules: Arc<RosterRules>) -> Self {
        Roster {
            rules,
            players: Vec::new(),
            slots: BTreeMap::new(),
            rounds: BTreeMap::new(),
        }
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    /// Drafted players in draft order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn slots(&self) -> &BTreeMap<Position, Vec<String>> {
        &self.slots
    }

    /// Round -> player id for rounds whose ideal position has been filled.
    pub fn rounds(&self) -> &BTreeMap<u8, String> {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.rules.max_players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    // -----------------------------------------------------------------------
    // Slot queries
    // -----------------------------------------------------------------------

    /// The bucket a rostered player occupies.
    pub fn slot_of(&self, id: &str) -> Option<Position> {
        self.slots
            .iter()
            .find(|(_, ids)| ids.iter().any(|pid| pid == id))
            .map(|(pos, _)| *pos)
    }

    pub fn players_in_slot(&self, slot: Position) -> &[String] {
        self.slots.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of players in a bucket.
    pub fn occupancy(&self, slot: Position) -> usize {
        self.players_in_slot(slot).len()
    }

    /// Number of rostered players at a position, FLEX occupants included.
    pub fn position_count(&self, pos: Position) -> usize {
        self.players.iter().filter(|p| p.position == pos).count()
    }

    fn has_room(&self, slot: Position) -> bool {
        self.rules
            .max_for(slot)
            .is_some_and(|max| self.occupancy(slot) < max)
    }

    fn flex_open_for(&self, pos: Position) -> bool {
        self.rules.is_flex_eligible(pos) && self.has_room(Position::Flex)
    }

    /// Fraction of a position's natural slots still open (0.0 to 1.0).
    pub fn position_need(&self, pos: Position) -> f64 {
        match self.rules.max_for(pos) {
            Some(max) if max > 0 => {
                max.saturating_sub(self.occupancy(pos)) as f64 / max as f64
            }
            _ => 0.0,
        }
    }

    /// Positions with open natural slots, most open first.
    pub fn needed_positions(&self) -> Vec<Position> {
        let mut needed: Vec<(Position, usize)> = Position::PLAYING
            .iter()
            .filter_map(|&pos| {
                let max = self.rules.max_for(pos)?;
                let open = max.saturating_sub(self.occupancy(pos));
                (open > 0).then_some((pos, open))
            })
            .collect();
        needed.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.sort_order().cmp(&b.0.sort_order())));
        needed.into_iter().map(|(pos, _)| pos).collect()
    }

    /// Open slots a player at `pos` could still take: natural plus FLEX.
    pub fn remaining_capacity(&self, pos: Position) -> usize {
        let natural = self
            .rules
            .max_for(pos)
            .map_or(0, |max| max.saturating_sub(self.occupancy(pos)));
        if self.rules.is_flex_eligible(pos) {
            let flex = self
                .rules
                .max_for(Position::Flex)
                .map_or(0, |max| max.saturating_sub(self.occupancy(Position::Flex)));
            natural + flex
        } else {
            natural
        }
    }

    /// First round with no recorded pick.
    pub fn next_open_round(&self) -> Option<u8> {
        (1..=self.rules.max_players as u8).find(|r| !self.rounds.contains_key(r))
    }

    /// Split the roster into weekly starters and bench against the lineup
    /// rules. Within a bucket the highest season projections start; ties go
    /// to the earlier-drafted player.
    pub fn starters_and_bench(&self) -> (Vec<&Player>, Vec<&Player>) {
        let mut starters = Vec::new();
        let mut bench = Vec::new();
        for (slot, ids) in &self.slots {
            let starting = self.rules.starters(*slot);
            let mut occupants: Vec<&Player> = ids.iter().filter_map(|id| self.get(id)).collect();
            occupants.sort_by(|a, b| {
                b.season_points()
                    .partial_cmp(&a.season_points())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for (i, p) in occupants.into_iter().enumerate() {
                if i < starting {
                    starters.push(p);
                } else {
                    bench.push(p);
                }
            }
        }
        (starters, bench)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Whether `player` can legally join this roster right now.
    pub fn can_draft(&self, player: &Player) -> bool {
        if self.is_full() || self.contains(&player.id) {
            return false;
        }
        // FLEX is a slot, never a player's own position
        if player.position == Position::Flex || self.rules.max_for(player.position).is_none() {
            return false;
        }
        if !self.has_room(player.position) && !self.flex_open_for(player.position) {
            return false;
        }
        if player.status != DraftStatus::Available {
            return false;
        }
        match player.bye_week {
            Some(week) => self.rules.possible_bye_weeks.contains(&week),
            None => true,
        }
    }

    /// Add a player to the roster.
    ///
    /// Slot assignment priority:
    /// 1. Natural position slot
    /// 2. FLEX slot (FLEX-eligible positions only)
    ///
    /// The pick is mapped to the first unfilled round whose ideal position
    /// matches the player's FLEX-normalized position.
    ///
    /// Returns `true` if the player was placed, `false` if the draft is not
    /// legal.
    pub fn draft_player(&mut self, player: &Player) -> bool {
        if !self.can_draft(player) {
            return false;
        }

        let slot = if self.has_room(player.position) {
            player.position
        } else {
            Position::Flex
        };

        let normalized = self.rules.flex_normalized(player.position);
        let round = (1..=self.rules.draft_order.len() as u8).find(|r| {
            !self.rounds.contains_key(r) && self.rules.draft_order.ideal_position(*r) == normalized
        });
        if let Some(round) = round {
            self.rounds.insert(round, player.id.clone());
        }

        self.slots.entry(slot).or_default().push(player.id.clone());

        let mut drafted = player.clone();
        drafted.status = DraftStatus::DraftedBySelf;
        self.players.push(drafted);
        true
    }

    /// Remove a player, returning it marked available again.
    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;

        let mut emptied = None;
        for (slot, ids) in self.slots.iter_mut() {
            if let Some(i) = ids.iter().position(|pid| pid == id) {
                ids.remove(i);
                if ids.is_empty() {
                    emptied = Some(*slot);
                }
                break;
            }
        }
        if let Some(slot) = emptied {
            self.slots.remove(&slot);
        }
        self.rounds.retain(|_, pid| pid != id);

        let mut player = self.players.remove(idx);
        player.status = DraftStatus::Available;
        Some(player)
    }

    /// Swap `old_id` out for `incoming`.
    ///
    /// The swap is checked against a copy of the slot map before anything is
    /// touched. If the incoming half still fails, the outgoing player is put
    /// back.
    pub fn replace_player(&mut self, old_id: &str, incoming: &Player) -> bool {
        let Some(old) = self.get(old_id) else {
            return false;
        };
        if old.locked || !self.swap_fits(old, incoming) {
            return false;
        }

        let Some(removed) = self.remove_player(old_id) else {
            return false;
        };
        if self.draft_player(incoming) {
            return true;
        }

        warn!(
            "replacement of {} with {} failed; restoring {}",
            removed.name, incoming.name, removed.name
        );
        if !self.draft_player(&removed) {
            error!("could not restore {} after failed replacement", removed.name);
        }
        false
    }

    fn swap_fits(&self, old: &Player, incoming: &Player) -> bool {
        if incoming.id != old.id && self.contains(&incoming.id) {
            return false;
        }
        if old.position == incoming.position {
            return true;
        }

        let mut slots = self.slots.clone();
        for ids in slots.values_mut() {
            ids.retain(|pid| *pid != old.id);
        }
        let room = |slot: Position| {
            self.rules
                .max_for(slot)
                .is_some_and(|max| slots.get(&slot).map_or(0, Vec::len) < max)
        };
        let fits = room(incoming.position)
            || (self.rules.is_flex_eligible(incoming.position) && room(Position::Flex));
        if !fits {
            return false;
        }

        // A swap that shrinks the combined RB+WR head-count must keep the
        // configured coverage.
        if RosterRules::is_coverage_position(old.position)
            && !RosterRules::is_coverage_position(incoming.position)
        {
            let coverage = self.coverage_count().saturating_sub(1);
            if coverage < self.rules.min_flex_coverage {
                return false;
            }
        }
        true
    }

    /// Rostered RBs and WRs, FLEX occupants included.
    pub fn coverage_count(&self) -> usize {
        self.players
            .iter()
            .filter(|p| RosterRules::is_coverage_position(p.position))
            .count()
    }

    /// Verify the slot map agrees with roster membership.
    pub fn integrity_check(&self) -> Result<(), RosterError> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.players.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(RosterError::Inconsistent(format!(
                "{} is on the roster more than once",
                dup.id
            )));
        }

        let slotted: usize = self.slots.values().map(Vec::len).sum();
        if slotted != self.players.len() {
            return Err(RosterError::Inconsistent(format!(
                "{slotted} slotted ids for {} players",
                self.players.len()
            )));
        }

        for p in &self.players {
            let buckets = self
                .slots
                .values()
                .filter(|ids| ids.iter().any(|id| *id == p.id))
                .count();
            if buckets != 1 {
                return Err(RosterError::Inconsistent(format!(
                    "{} appears in {buckets} slot buckets",
                    p.id
                )));
            }
        }

        for (slot, ids) in &self.slots {
            let max = self.rules.max_for(*slot).unwrap_or(0);
            if ids.len() > max {
                return Err(RosterError::Inconsistent(format!(
                    "{slot} holds {} players, cap is {max}",
                    ids.len()
                )));
            }
            let mut in_bucket = std::collections::HashSet::new();
            for id in ids {
                if !in_bucket.insert(id.as_str()) {
                    return Err(RosterError::Inconsistent(format!(
                        "{id} is slotted at {slot} more than once"
                    )));
                }
                let Some(p) = self.get(id) else {
                    return Err(RosterError::Inconsistent(format!(
                        "{id} is slotted at {slot} but not on the roster"
                    )));
                };
                let legal = if *slot == Position::Flex {
                    self.rules.is_flex_eligible(p.position)
                } else {
                    p.position == *slot
                };
                if !legal {
                    return Err(RosterError::Inconsistent(format!(
                        "{} ({}) cannot occupy {slot}",
                        p.id, p.position
                    )));
                }
            }
        }

        if let Some((round, id)) = self.rounds.iter().find(|(_, id)| !self.contains(id)) {
            return Err(RosterError::Inconsistent(format!(
                "round {round} maps to {id}, who is not on the roster"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
