//! Bracket data model.

/// A competing team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub seed: u8,
}

impl Team {
    pub fn new(name: impl Into<String>, seed: u8) -> Self {
        Self {
            name: name.into(),
            seed,
        }
    }
}

/// Which side of a matchup advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// One pairing in a round.
///
/// Later rounds start out with empty slots; they fill in as winners
/// propagate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matchup {
    pub home: Option<Team>,
    pub away: Option<Team>,
    pub winner: Option<Side>,
}

impl Matchup {
    pub fn new(home: Team, away: Team) -> Self {
        Self {
            home: Some(home),
            away: Some(away),
            winner: None,
        }
    }

    /// The team that advanced, if the matchup is decided.
    pub fn winning_team(&self) -> Option<&Team> {
        match self.winner? {
            Side::Home => self.home.as_ref(),
            Side::Away => self.away.as_ref(),
        }
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }
}

/// One round of the bracket, left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    pub matchups: Vec<Matchup>,
}

/// A single-elimination tournament bracket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bracket {
    pub rounds: Vec<Round>,
}

impl Bracket {
    /// Builds a bracket from an ordered field of teams.
    ///
    /// Consecutive teams pair up in round one; each later round holds half
    /// as many (empty) matchups, down to the final. The team count must be
    /// a power of two of at least 2, matching how the field is seeded.
    pub fn single_elimination(teams: Vec<Team>) -> Option<Self> {
        let n = teams.len();
        if n < 2 || !n.is_power_of_two() {
            return None;
        }

        let mut rounds = Vec::new();

        let mut first = Round::default();
        let mut iter = teams.into_iter();
        while let (Some(home), Some(away)) = (iter.next(), iter.next()) {
            first.matchups.push(Matchup::new(home, away));
        }
        let mut matchups = first.matchups.len();
        rounds.push(first);

        while matchups > 1 {
            matchups /= 2;
            rounds.push(Round {
                matchups: vec![Matchup::default(); matchups],
            });
        }

        Some(Self { rounds })
    }

    /// Records a result and advances the winner into the next round.
    pub fn record_winner(&mut self, round: usize, matchup: usize, side: Side) {
        let Some(m) = self
            .rounds
            .get_mut(round)
            .and_then(|r| r.matchups.get_mut(matchup))
        else {
            return;
        };
        m.winner = Some(side);
        let advancing = m.winning_team().cloned();

        let Some(next) = self
            .rounds
            .get_mut(round + 1)
            .and_then(|r| r.matchups.get_mut(matchup / 2))
        else {
            return;
        };
        let slot = if matchup % 2 == 0 {
            &mut next.home
        } else {
            &mut next.away
        };
        *slot = advancing;
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// Total matchups across all rounds.
    pub fn matchup_count(&self) -> usize {
        self.rounds.iter().map(|r| r.matchups.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: usize) -> Vec<Team> {
        (0..n)
            .map(|i| Team::new(format!("Team {i}"), i as u8 + 1))
            .collect()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn eight_teams_make_three_rounds() {
        let bracket = Bracket::single_elimination(field(8)).unwrap();
        let sizes: Vec<usize> = bracket.rounds.iter().map(|r| r.matchups.len()).collect();
        assert_eq!(sizes, [4, 2, 1]);
        assert_eq!(bracket.matchup_count(), 7);
    }

    #[test]
    fn two_teams_make_a_final_only() {
        let bracket = Bracket::single_elimination(field(2)).unwrap();
        assert_eq!(bracket.round_count(), 1);
        assert_eq!(bracket.rounds[0].matchups.len(), 1);
    }

    #[test]
    fn odd_or_tiny_fields_are_rejected() {
        assert!(Bracket::single_elimination(field(0)).is_none());
        assert!(Bracket::single_elimination(field(1)).is_none());
        assert!(Bracket::single_elimination(field(6)).is_none());
    }

    #[test]
    fn first_round_pairs_consecutive_teams() {
        let bracket = Bracket::single_elimination(field(4)).unwrap();
        let m = &bracket.rounds[0].matchups[1];
        assert_eq!(m.home.as_ref().unwrap().name, "Team 2");
        assert_eq!(m.away.as_ref().unwrap().name, "Team 3");
    }

    // ── results ───────────────────────────────────────────────────────────

    #[test]
    fn winner_advances_into_the_next_round() {
        let mut bracket = Bracket::single_elimination(field(4)).unwrap();
        bracket.record_winner(0, 0, Side::Away);
        bracket.record_winner(0, 1, Side::Home);

        let final_matchup = &bracket.rounds[1].matchups[0];
        assert_eq!(final_matchup.home.as_ref().unwrap().name, "Team 1");
        assert_eq!(final_matchup.away.as_ref().unwrap().name, "Team 2");
        assert!(!final_matchup.is_decided());
    }

    #[test]
    fn recording_the_final_has_no_next_round() {
        let mut bracket = Bracket::single_elimination(field(2)).unwrap();
        bracket.record_winner(0, 0, Side::Home);
        assert!(bracket.rounds[0].matchups[0].is_decided());
    }

    #[test]
    fn out_of_range_results_are_ignored() {
        let mut bracket = Bracket::single_elimination(field(4)).unwrap();
        let before = bracket.clone();
        bracket.record_winner(7, 0, Side::Home);
        bracket.record_winner(0, 9, Side::Home);
        assert_eq!(bracket, before);
    }
}
