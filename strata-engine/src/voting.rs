//! ## strata-engine::voting
//! **Reducing per-participant scores to a winner**
//!
//! ### Tie-breaking:
//! - `argmax`: first maximal entry wins
//! - `weighted_vote`: last maximal entry wins
//! - `majority_vote`: an exact half counts as a majority

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use strata_core::value::Value;

use crate::error::VotingError;

/// Key with the highest score; the first one on ties. `None` when empty.
pub fn argmax<K: Clone>(scores: &[(K, f64)]) -> Option<K> {
    let mut best: Option<(&K, f64)> = None;
    for (key, score) in scores {
        if score.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, top)| *score > top) {
            best = Some((key, *score));
        }
    }
    best.map(|(k, _)| k.clone())
}

/// `1` when at least half of `labels` are true, else `0`. Empty input yields `1`.
pub fn majority_vote<I>(labels: I) -> i64
where
    I: IntoIterator<Item = bool>,
{
    let (yes, total) = labels
        .into_iter()
        .fold((0usize, 0usize), |(yes, total), label| (yes + label as usize, total + 1));
    i64::from(yes * 2 >= total)
}

/// Key maximising `score * weight`, ties resolved toward the later key.
///
/// Keys are visited in `scores` order, followed by weight-only keys in sorted
/// order. Missing scores count as 0, missing weights as 1.
pub fn weighted_vote(scores: &[(String, f64)], weights: &BTreeMap<String, f64>) -> Option<String> {
    let extra = weights
        .iter()
        .filter(|(k, _)| !scores.iter().any(|(s, _)| s == *k))
        .map(|(k, _)| (k, 0.0));
    let mut best: Option<(&String, f64)> = None;
    for (key, score) in scores.iter().map(|(k, s)| (k, *s)).chain(extra) {
        let value = score * weights.get(key).copied().unwrap_or(1.0);
        if best.map_or(true, |(_, top)| value >= top) {
            best = Some((key, value));
        }
    }
    best.map(|(k, _)| k.clone())
}

/// Rank with the best Borda score `m - rank`, i.e. the lowest rank, first
/// occurrence on ties. `m` defaults to the highest rank present; empty input
/// yields 0.
pub fn borda_count(ranks: &[i64], m: Option<i64>) -> i64 {
    let Some(&max_rank) = ranks.iter().max() else {
        return 0;
    };
    let m = m.filter(|m| *m != 0).unwrap_or(max_rank);
    let mut best = ranks[0];
    let mut best_score = m - best;
    for &rank in &ranks[1..] {
        if m - rank > best_score {
            best = rank;
            best_score = m - rank;
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingRule {
    Argmax,
    Majority,
    Weighted,
    Borda,
}

impl FromStr for VotingRule {
    type Err = VotingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argmax" => Ok(VotingRule::Argmax),
            "majority" => Ok(VotingRule::Majority),
            "weighted" => Ok(VotingRule::Weighted),
            "borda" => Ok(VotingRule::Borda),
            _ => Err(VotingError::UnknownRule(s.to_owned())),
        }
    }
}

impl fmt::Display for VotingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VotingRule::Argmax => "argmax",
            VotingRule::Majority => "majority",
            VotingRule::Weighted => "weighted",
            VotingRule::Borda => "borda",
        })
    }
}

pub type Labeler = Arc<dyn Fn(&str, f64) -> bool + Send + Sync>;
pub type CustomVote = Arc<dyn Fn(&[(String, f64)]) -> Option<Value> + Send + Sync>;

/// Strategy applied to one (scenario, episode) group of participant scores,
/// given in participant order.
#[derive(Clone)]
pub enum Voter {
    Argmax,
    Weighted(BTreeMap<String, f64>),
    /// Labels each participant, then takes the majority label (0 or 1).
    Majority(Labeler),
    /// Ranks participants by descending score and elects the best rank.
    Borda,
    Custom(CustomVote),
}

impl Voter {
    /// Majority labels a participant true when its score is positive.
    pub fn from_rule(rule: VotingRule, weights: BTreeMap<String, f64>) -> Self {
        match rule {
            VotingRule::Argmax => Voter::Argmax,
            VotingRule::Weighted => Voter::Weighted(weights),
            VotingRule::Majority => Voter::Majority(Arc::new(|_, score| score > 0.0)),
            VotingRule::Borda => Voter::Borda,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[(String, f64)]) -> Option<Value> + Send + Sync + 'static,
    {
        Voter::Custom(Arc::new(f))
    }

    pub fn vote(&self, scores: &[(String, f64)]) -> Option<Value> {
        match self {
            Voter::Argmax => argmax(scores).map(Value::Str),
            Voter::Weighted(weights) => weighted_vote(scores, weights).map(Value::Str),
            Voter::Majority(label) => Some(Value::Int(majority_vote(
                scores.iter().map(|(p, s)| label(p, *s)),
            ))),
            Voter::Borda => {
                let ranks = descending_ranks(scores);
                let winner = borda_count(&ranks, None);
                ranks
                    .iter()
                    .position(|r| *r == winner)
                    .map(|i| Value::Str(scores[i].0.clone()))
            }
            Voter::Custom(f) => f(scores),
        }
    }
}

/// 1-based rank of each entry by descending score, earlier entries first on ties.
fn descending_ranks(scores: &[(String, f64)]) -> Vec<i64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].1.total_cmp(&scores[a].1).then(a.cmp(&b)));
    let mut ranks = vec![0; scores.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = rank as i64 + 1;
    }
    ranks
}

impl fmt::Debug for Voter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Voter::Argmax => f.write_str("Argmax"),
            Voter::Weighted(w) => f.debug_tuple("Weighted").field(w).finish(),
            Voter::Majority(_) => f.write_str("Majority(..)"),
            Voter::Borda => f.write_str("Borda"),
            Voter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scores(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&scores(&[("a", 1.0), ("b", 3.0), ("c", 3.0)])), Some("b".into()));
        assert_eq!(argmax::<String>(&[]), None);
        assert_eq!(argmax(&scores(&[("a", f64::NAN), ("b", -1.0)])), Some("b".into()));
    }

    #[test]
    fn majority_threshold_is_half() {
        assert_eq!(majority_vote([true, false]), 1);
        assert_eq!(majority_vote([true, false, false]), 0);
        assert_eq!(majority_vote([true, true, false]), 1);
        assert_eq!(majority_vote(std::iter::empty()), 1);
    }

    #[test]
    fn weighted_vote_prefers_last_on_ties() {
        let weights = BTreeMap::from([("a".to_string(), 2.0), ("b".to_string(), 1.0)]);
        assert_eq!(
            weighted_vote(&scores(&[("a", 1.0), ("b", 2.0)]), &weights),
            Some("b".into())
        );
        assert_eq!(
            weighted_vote(&scores(&[("a", 2.0), ("b", 1.0)]), &weights),
            Some("a".into())
        );
        assert_eq!(weighted_vote(&[], &BTreeMap::new()), None);
    }

    #[test]
    fn weight_only_keys_score_zero() {
        let weights = BTreeMap::from([("ghost".to_string(), 5.0)]);
        assert_eq!(
            weighted_vote(&scores(&[("a", -1.0)]), &weights),
            Some("ghost".into())
        );
    }

    #[test]
    fn borda_picks_lowest_rank() {
        assert_eq!(borda_count(&[3, 1, 2], None), 1);
        assert_eq!(borda_count(&[2, 2, 4], Some(10)), 2);
        assert_eq!(borda_count(&[], None), 0);
    }

    #[test]
    fn rules_parse_case_insensitively() {
        assert_eq!("ArgMax".parse::<VotingRule>(), Ok(VotingRule::Argmax));
        assert_eq!("borda".parse::<VotingRule>(), Ok(VotingRule::Borda));
        assert_eq!(
            "plurality".parse::<VotingRule>(),
            Err(VotingError::UnknownRule("plurality".into()))
        );
        assert_eq!(VotingRule::Weighted.to_string(), "weighted");
    }

    #[test]
    fn voters_return_winners() {
        let group = scores(&[("a", 1.0), ("b", 4.0), ("c", -2.0)]);
        assert_eq!(Voter::Argmax.vote(&group), Some(Value::from("b")));
        assert_eq!(Voter::Borda.vote(&group), Some(Value::from("b")));
        let weighted =
            Voter::from_rule(VotingRule::Weighted, BTreeMap::from([("a".to_string(), 10.0)]));
        assert_eq!(weighted.vote(&group), Some(Value::from("a")));
        let majority = Voter::from_rule(VotingRule::Majority, BTreeMap::new());
        assert_eq!(majority.vote(&group), Some(Value::Int(1)));
        let custom = Voter::custom(|g| Some(Value::from(g.len())));
        assert_eq!(custom.vote(&group), Some(Value::Int(3)));
    }

    proptest! {
        #[test]
        fn argmax_returns_a_maximum(values in proptest::collection::vec(-1e6f64..1e6, 1..20)) {
            let entries: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
            let winner = argmax(&entries).unwrap();
            let top = values.iter().cloned().fold(f64::MIN, f64::max);
            prop_assert_eq!(values[winner], top);
            prop_assert!(values[..winner].iter().all(|v| *v < top));
        }

        #[test]
        fn majority_matches_count(labels in proptest::collection::vec(any::<bool>(), 0..50)) {
            let yes = labels.iter().filter(|l| **l).count();
            let expected = if 2 * yes >= labels.len() { 1 } else { 0 };
            prop_assert_eq!(majority_vote(labels.clone()), expected);
        }
    }
}
