use crate::model::AmbiguityReason;

/// Tie-break score. Lower is better (lexicographic comparison): fewest
/// transactions first, then the smallest sorted sequence of ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CoverScore<'a> {
    size: usize,
    ids: Vec<&'a str>,
}

impl<'a> CoverScore<'a> {
    fn new(cover: &[usize], ids: &[&'a str]) -> Self {
        let mut sorted: Vec<&str> = cover.iter().map(|&i| ids[i]).collect();
        sorted.sort_unstable();
        Self {
            size: cover.len(),
            ids: sorted,
        }
    }
}

/// The single cover picked for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Candidate indices, ordered by transaction id.
    pub chosen: Vec<usize>,
    /// Covers sharing the winning size (the winner included).
    pub tied: usize,
    pub ambiguous: bool,
    pub ambiguity_reason: Option<AmbiguityReason>,
    pub tie_break_reason: Option<String>,
}

/// Compute the ambiguity reason from the combination of tied covers and cap hit.
fn ambiguity_reason(tied: usize, cap_hit: bool) -> Option<AmbiguityReason> {
    match (tied > 1, cap_hit) {
        (true, true) => Some(AmbiguityReason::TiedAndCapHit),
        (true, false) => Some(AmbiguityReason::TiedSolutions),
        (false, true) => Some(AmbiguityReason::SearchCapHit),
        (false, false) => None,
    }
}

/// Pick exactly one cover, or `None` when there are none.
///
/// `covers` index into `ids`. The choice depends only on sizes and ids, never
/// on the order covers were produced in.
pub fn resolve(covers: &[Vec<usize>], ids: &[&str], cap_hit: bool) -> Option<Resolution> {
    let mut scored: Vec<(CoverScore<'_>, &Vec<usize>)> = covers
        .iter()
        .map(|cover| (CoverScore::new(cover, ids), cover))
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0));

    let (best_score, best_cover) = scored.first()?;
    let tied = scored.iter().filter(|(s, _)| s.size == best_score.size).count();

    let tie_break_reason = if scored.len() == 1 {
        None
    } else if tied == 1 {
        Some("fewest_transactions".to_string())
    } else {
        Some("lexicographic_ids".to_string())
    };

    let mut chosen = (*best_cover).clone();
    chosen.sort_by(|&a, &b| ids[a].cmp(ids[b]));

    Some(Resolution {
        chosen,
        tied,
        ambiguous: tied > 1 || cap_hit,
        ambiguity_reason: ambiguity_reason(tied, cap_hit),
        tie_break_reason,
    })
}
