// Season simulation: weekly head-to-head matchups between drafted rosters.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::draft::pick::Position;
use crate::draft::player::{InjuryRisk, Player};
use crate::draft::roster::Roster;
use crate::draft::rules::RosterRules;

/// Fraction of a projection a questionable player is expected to deliver.
const MEDIUM_RISK_FACTOR: f64 = 0.85;
const HIGH_RISK_FACTOR: f64 = 0.5;

/// One team's season record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamSeason {
    pub wins: u32,
    pub losses: u32,
    pub total_points: f64,
    pub weekly_scores: Vec<f64>,
}

impl TeamSeason {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_percentage(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            g => f64::from(self.wins) / f64::from(g),
        }
    }

    pub fn points_per_game(&self) -> f64 {
        if self.weekly_scores.is_empty() {
            0.0
        } else {
            self.total_points / self.weekly_scores.len() as f64
        }
    }

    /// Population standard deviation of weekly scores.
    pub fn consistency(&self) -> f64 {
        let n = self.weekly_scores.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.weekly_scores.iter().sum::<f64>() / n as f64;
        let variance = self
            .weekly_scores
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        variance.sqrt()
    }
}

/// Final standings entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Standing {
    pub team_index: usize,
    /// 1-based final rank.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonResult {
    pub teams: Vec<TeamSeason>,
    /// Best team first.
    pub standings: Vec<Standing>,
}

impl SeasonResult {
    pub fn rank_of(&self, team_index: usize) -> Option<usize> {
        self.standings
            .iter()
            .find(|s| s.team_index == team_index)
            .map(|s| s.rank)
    }
}

/// Projected points a player actually contributes in `week`.
pub fn expected_week_points(player: &Player, week: u8) -> f64 {
    if player.bye_week == Some(week) {
        return 0.0;
    }
    let factor = match player.injury_risk() {
        InjuryRisk::Low => 1.0,
        InjuryRisk::Medium => MEDIUM_RISK_FACTOR,
        InjuryRisk::High => HIGH_RISK_FACTOR,
    };
    player.week_points(week) * factor
}

/// Plays a regular season over fixed rosters.
pub struct SeasonSimulator<'a> {
    rosters: &'a [Roster],
    rules: &'a RosterRules,
    weeks: u8,
}

impl<'a> SeasonSimulator<'a> {
    pub fn new(rosters: &'a [Roster], rules: &'a RosterRules, weeks: u8) -> Self {
        SeasonSimulator {
            rosters,
            rules,
            weeks,
        }
    }

    /// Best legal lineup score for one roster in one week. Natural positions
    /// are filled first, FLEX takes the best leftover eligible player.
    pub fn lineup_score(&self, roster: &Roster, week: u8) -> f64 {
        let mut pool: Vec<(&Player, f64)> = roster
            .players()
            .iter()
            .map(|p| (p, expected_week_points(p, week)))
            .collect();
        pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let mut used = vec![false; pool.len()];

        let mut fill = |slots: usize, eligible: &dyn Fn(Position) -> bool| -> f64 {
            let mut total = 0.0;
            let mut filled = 0;
            for (i, (p, pts)) in pool.iter().enumerate() {
                if filled == slots {
                    break;
                }
                if !used[i] && eligible(p.position) {
                    used[i] = true;
                    total += pts;
                    filled += 1;
                }
            }
            total
        };

        let mut score = 0.0;
        for pos in Position::PLAYING {
            score += fill(self.rules.starters(pos), &|p: Position| p == pos);
        }
        score += fill(self.rules.starters(Position::Flex), &|p: Position| {
            self.rules.is_flex_eligible(p)
        });
        score
    }

    /// Play every week. Pairings are reshuffled weekly; an odd team out plays
    /// the league average. Ties are broken at random.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> SeasonResult {
        let n = self.rosters.len();
        let mut teams = vec![TeamSeason::default(); n];
        let mut order: Vec<usize> = (0..n).collect();

        for week in 1..=self.weeks {
            let scores: Vec<f64> = self
                .rosters
                .iter()
                .map(|r| self.lineup_score(r, week))
                .collect();
            let average = if n > 0 {
                scores.iter().sum::<f64>() / n as f64
            } else {
                0.0
            };

            for (team, &score) in teams.iter_mut().zip(&scores) {
                team.total_points += score;
                team.weekly_scores.push(score);
            }

            order.shuffle(rng);
            for pair in order.chunks(2) {
                match *pair {
                    [a, b] => {
                        let a_wins = match scores[a].partial_cmp(&scores[b]) {
                            Some(Ordering::Greater) => true,
                            Some(Ordering::Less) => false,
                            _ => rng.gen_bool(0.5),
                        };
                        let (winner, loser) = if a_wins { (a, b) } else { (b, a) };
                        teams[winner].wins += 1;
                        teams[loser].losses += 1;
                    }
                    [solo] => {
                        let won = match scores[solo].partial_cmp(&average) {
                            Some(Ordering::Greater) => true,
                            Some(Ordering::Less) => false,
                            _ => rng.gen_bool(0.5),
                        };
                        if won {
                            teams[solo].wins += 1;
                        } else {
                            teams[solo].losses += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        let standings = rank_teams(&teams);
        SeasonResult { teams, standings }
    }
}

/// Order teams by (win percentage, total points), best first.
fn rank_teams(teams: &[TeamSeason]) -> Vec<Standing> {
    let mut idx: Vec<usize> = (0..teams.len()).collect();
    idx.sort_by(|&a, &b| {
        let (ta, tb) = (&teams[a], &teams[b]);
        tb.win_percentage()
            .partial_cmp(&ta.win_percentage())
            .unwrap_or(Ordering::Equal)
            .then(
                tb.total_points
                    .partial_cmp(&ta.total_points)
                    .unwrap_or(Ordering::Equal),
            )
    });
    idx.into_iter()
        .enumerate()
        .map(|(i, team_index)| Standing {
            team_index,
            rank: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    fn player(id: &str, pos: Position, weekly: f64, bye: u8) -> Player {
        let mut p = Player::new(id, id, pos, vec![weekly; 17]);
        p.bye_week = Some(bye);
        p
    }

    fn full_roster(rules: &Arc<RosterRules>, prefix: &str, pts: f64) -> Roster {
        let mut r = Roster::new(rules.clone());
        let picks = [
            (Position::Quarterback, 2),
            (Position::RunningBack, 5),
            (Position::WideReceiver, 4),
            (Position::TightEnd, 2),
            (Position::Kicker, 1),
            (Position::Defense, 1),
        ];
        for (pos, n) in picks {
            for i in 0..n {
                let id = format!("{prefix}-{pos}-{i}");
                assert!(r.draft_player(&player(&id, pos, pts, 5 + (i % 3) as u8)));
            }
        }
        r
    }

    #[test]
    fn expected_points_respect_bye_and_injury() {
        let mut p = player("rb", Position::RunningBack, 10.0, 6);
        assert_eq!(expected_week_points(&p, 6), 0.0);
        assert_eq!(expected_week_points(&p, 7), 10.0);
        p.injury_status = "QUESTIONABLE".into();
        assert!((expected_week_points(&p, 7) - 8.5).abs() < 1e-9);
        p.injury_status = "OUT".into();
        assert_eq!(expected_week_points(&p, 7), 5.0);
    }

    #[test]
    fn lineup_uses_best_players_and_flex() {
        let rules = Arc::new(RosterRules::standard());
        let mut r = Roster::new(rules.clone());
        for (i, pts) in [20.0, 15.0, 12.0, 3.0].iter().enumerate() {
            assert!(r.draft_player(&player(&format!("rb{i}"), Position::RunningBack, *pts, 9)));
        }
        assert!(r.draft_player(&player("wr0", Position::WideReceiver, 11.0, 9)));
        assert!(r.draft_player(&player("qb0", Position::Quarterback, 18.0, 9)));

        let sim = SeasonSimulator::new(std::slice::from_ref(&r), &rules, 1);
        // QB 18 + RB 20 + 15 + WR 11 + FLEX (RB 12)
        assert!((sim.lineup_score(&r, 1) - 76.0).abs() < 1e-9);
        // Everyone on bye in week 9
        assert_eq!(sim.lineup_score(&r, 9), 0.0);
    }

    #[test]
    fn records_add_up() {
        let rules = Arc::new(RosterRules::standard());
        let rosters: Vec<Roster> = (0..5)
            .map(|i| full_roster(&rules, &format!("t{i}"), 8.0 + i as f64))
            .collect();
        let sim = SeasonSimulator::new(&rosters, &rules, 17);
        let result = sim.simulate(&mut ChaCha8Rng::seed_from_u64(11));

        for team in &result.teams {
            assert_eq!(team.games(), 17);
            assert_eq!(team.weekly_scores.len(), 17);
        }
        let ranks: Vec<usize> = result.standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        // Strictly stronger rosters score more every week and never lose a game
        assert_eq!(result.teams[4].wins, 17);
        assert_eq!(result.rank_of(4), Some(1));
    }

    #[test]
    fn team_season_stats() {
        let t = TeamSeason {
            wins: 3,
            losses: 1,
            total_points: 400.0,
            weekly_scores: vec![90.0, 110.0, 90.0, 110.0],
        };
        assert_eq!(t.win_percentage(), 0.75);
        assert_eq!(t.points_per_game(), 100.0);
        assert!((t.consistency() - 10.0).abs() < 1e-9);
        assert_eq!(TeamSeason::default().consistency(), 0.0);
        assert_eq!(TeamSeason::default().win_percentage(), 0.0);
    }
}
