//! Dashboard aggregation over a full audit log replay
//!
//! Every call recomputes from the records it is given. There is no
//! incremental index, so cost is linear in the size of the log.

use notecheck_types::{Denomination, PredictionRecord, Verdict};
use serde::{Serialize, Serializer};

/// Most frequent denomination, or "not applicable"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MostCommon {
    Denomination(Denomination),
    NotApplicable,
}

impl std::fmt::Display for MostCommon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MostCommon::Denomination(d) => write!(f, "{}", d),
            MostCommon::NotApplicable => write!(f, "not applicable"),
        }
    }
}

impl Serialize for MostCommon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenominationTally {
    pub denomination: Denomination,
    pub count: usize,
}

/// Summary statistics exposed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub total: usize,
    pub genuine_count: usize,
    pub counterfeit_count: usize,
    /// One entry per known denomination, in canonical order
    pub denomination_counts: Vec<DenominationTally>,
    pub most_common_denomination: MostCommon,
}

/// Single pass over the records.
///
/// Unknown denominations are not tallied. Ties for the most common
/// denomination go to the earlier one in canonical order (₹100, ₹200, ₹500).
/// When nothing was tallied the result is `NotApplicable`.
pub fn summarize<'a, I>(records: I) -> AggregateSummary
where
    I: IntoIterator<Item = &'a PredictionRecord>,
{
    let mut total = 0;
    let mut genuine_count = 0;
    let mut counterfeit_count = 0;
    let mut denomination_counts: Vec<DenominationTally> = Denomination::KNOWN
        .into_iter()
        .map(|denomination| DenominationTally {
            denomination,
            count: 0,
        })
        .collect();

    for record in records {
        total += 1;
        match record.verdict {
            Verdict::Genuine => genuine_count += 1,
            Verdict::Counterfeit => counterfeit_count += 1,
        }
        if let Some(tally) = denomination_counts
            .iter_mut()
            .find(|t| t.denomination == record.denomination)
        {
            tally.count += 1;
        }
    }

    let most_common_denomination = if total == 0 {
        MostCommon::NotApplicable
    } else {
        most_common(&denomination_counts)
    };

    AggregateSummary {
        total,
        genuine_count,
        counterfeit_count,
        denomination_counts,
        most_common_denomination,
    }
}

fn most_common(tallies: &[DenominationTally]) -> MostCommon {
    let mut best: Option<&DenominationTally> = None;
    for tally in tallies.iter().filter(|t| t.count > 0) {
        // strict comparison keeps the first maximum
        if best.map_or(true, |b| tally.count > b.count) {
            best = Some(tally);
        }
    }
    best.map(|t| MostCommon::Denomination(t.denomination))
        .unwrap_or(MostCommon::NotApplicable)
}
