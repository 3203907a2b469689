//! Daily cross-sectional ranking into long/neutral/short directions.
//!
//! For one date:
//! 1. each active factor's eligible scores are z-scored across instruments,
//! 2. an instrument's composite is the sum of its z-scores, kept only when
//!    every active factor scored it,
//! 3. composites are sorted ascending; the bottom quartile goes short and
//!    the top quartile goes long, with at least one instrument per side,
//! 4. when every composite is equal nothing is ranked.

use std::collections::{BTreeMap, HashMap};

use crate::domain::alpha::AlphaScores;
use crate::domain::cross_section::standardize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Short,
    Neutral,
    Long,
}

/// One date's signal set, ordered by code. Empty when nothing could be
/// ranked.
pub type Signals = BTreeMap<String, Direction>;

/// Composite score per instrument on row `t`.
pub fn composite_scores(alphas: &[AlphaScores], t: usize) -> Vec<(String, f64)> {
    if alphas.is_empty() {
        return Vec::new();
    }

    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for scores in alphas {
        for (code, z) in standardize(&scores.cross_section(t)) {
            let entry = totals.entry(code).or_insert((0.0, 0));
            entry.0 += z;
            entry.1 += 1;
        }
    }

    let mut composite: Vec<(String, f64)> = totals
        .into_iter()
        .filter(|(_, (_, seen))| *seen == alphas.len())
        .map(|(code, (total, _))| (code.to_string(), total))
        .collect();
    composite.sort_by(|a, b| a.0.cmp(&b.0));
    composite
}

/// Assigns directions to composites. Ties in score are broken by code so the
/// outcome never depends on hash order. The short side is assigned before
/// the long side, so when the two quartiles overlap (a single ranked
/// instrument) the overlap ends up long.
///
/// Two or more composites with no spread at all carry no ranking
/// information and produce an empty signal set.
pub fn rank(mut composite: Vec<(String, f64)>) -> Signals {
    composite.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let n = composite.len();
    let mut signals = Signals::new();
    if n == 0 || (n > 1 && has_no_spread(&composite)) {
        return signals;
    }

    let quartile = (n / 4).max(1);
    for (i, (code, _)) in composite.into_iter().enumerate() {
        let mut direction = Direction::Neutral;
        if i < quartile {
            direction = Direction::Short;
        }
        if i >= n - quartile {
            direction = Direction::Long;
        }
        signals.insert(code, direction);
    }
    signals
}

fn has_no_spread(composite: &[(String, f64)]) -> bool {
    composite.windows(2).all(|w| w[0].1 == w[1].1)
}

/// Signal set for row `t` of the active factors.
pub fn generate(alphas: &[AlphaScores], t: usize) -> Signals {
    rank(composite_scores(alphas, t))
}
