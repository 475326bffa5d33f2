//! School → chiefdom → district → overall rollups.
//!
//! All three views are built from one pass over the enriched rows. Rows are
//! bucketed into maps keyed by [`DistrictKey`] and [`ChiefdomKey`], and every
//! bucket keeps its own per-class sums so a bad group never disturbs its
//! siblings.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::distribution::model::{
    CLASS_COUNT, ClassMetric, ColumnScheme, Contribution, EnrichedRecord, ExtractedLocation,
};

const CLASSES: usize = CLASS_COUNT as usize;
const METRICS: usize = ClassMetric::ALL.len();

/// Largest column sum that still converts to an exact count (2^53).
const MAX_EXACT_SUM: f64 = 9_007_199_254_740_992.0;

/// Enrollment, gender and ITN figures for one aggregation level.
///
/// Counts are summed as recorded. Negative cells are not rejected or clamped,
/// so a negative input lowers the totals and can make them negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricTotals {
    pub enrollment: i64,
    pub boys: i64,
    pub girls: i64,
    /// ITNs handed out, counted as `boys + girls`.
    pub itn: i64,
    /// `enrollment - itn`. Negative when more nets went out than pupils enrolled.
    pub itn_remaining: i64,
    pub coverage_pct: f64,
    pub gender_ratio_pct: f64,
}

impl MetricTotals {
    /// Derives ITN, coverage and gender ratio from the three summed counts.
    pub fn from_counts(enrollment: i64, boys: i64, girls: i64) -> Self {
        let itn = boys + girls;
        let coverage_pct = if enrollment > 0 {
            itn as f64 / enrollment as f64 * 100.0
        } else {
            0.0
        };
        let gender_ratio_pct = if boys > 0 {
            girls as f64 / boys as f64 * 100.0
        } else {
            0.0
        };
        Self {
            enrollment,
            boys,
            girls,
            itn,
            itn_remaining: enrollment - itn,
            coverage_pct,
            gender_ratio_pct,
        }
    }
}

/// Identity of a district group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DistrictKey(pub String);

/// Identity of a chiefdom group. Chiefdom names repeat across districts, so
/// the district is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChiefdomKey {
    pub district: String,
    pub chiefdom: String,
}

/// The aggregation level an issue belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupId {
    Overall,
    District(DistrictKey),
    Chiefdom(ChiefdomKey),
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Overall => f.write_str("overall"),
            GroupId::District(key) => write!(f, "district {}", key.0),
            GroupId::Chiefdom(key) => {
                write!(f, "chiefdom {} in district {}", key.chiefdom, key.district)
            }
        }
    }
}

/// A condition recovered while aggregating.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationIssue {
    /// No row carries this metric column; it contributes zero everywhere.
    ColumnMissing { column: String },
    /// Cells that could not be read as numbers and were counted as zero.
    ValueCoercion { column: String, cells: usize },
    /// A group's column sum could not be turned into a count. That column
    /// contributes zero to the group; the group is still reported.
    GroupComputation {
        group: GroupId,
        column: String,
        reason: String,
    },
}

impl fmt::Display for AggregationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationIssue::ColumnMissing { column } => {
                write!(f, "column '{column}' not found, counted as zero")
            }
            AggregationIssue::ValueCoercion { column, cells } => {
                write!(f, "{cells} non-numeric cell(s) in '{column}' counted as zero")
            }
            AggregationIssue::GroupComputation {
                group,
                column,
                reason,
            } => write!(f, "{group}: '{column}' counted as zero: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverallSummary {
    pub schools: usize,
    pub districts: usize,
    pub chiefdoms: usize,
    #[serde(flatten)]
    pub totals: MetricTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSummary {
    pub district: String,
    pub schools: usize,
    pub chiefdoms: usize,
    #[serde(flatten)]
    pub totals: MetricTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiefdomSummary {
    pub district: String,
    pub chiefdom: String,
    pub schools: usize,
    #[serde(flatten)]
    pub totals: MetricTotals,
}

/// Every view produced by [`summarize`]. Groups are listed in order of first
/// appearance in the input.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Summaries {
    pub overall: OverallSummary,
    pub districts: Vec<DistrictSummary>,
    pub chiefdoms: Vec<ChiefdomSummary>,
    #[serde(skip)]
    pub issues: Vec<AggregationIssue>,
}

impl Summaries {
    pub fn district(&self, district: &str) -> Option<&DistrictSummary> {
        self.districts.iter().find(|row| row.district == district)
    }

    pub fn chiefdom(&self, district: &str, chiefdom: &str) -> Option<&ChiefdomSummary> {
        self.chiefdoms
            .iter()
            .find(|row| row.district == district && row.chiefdom == chiefdom)
    }
}

/// Builds the overall, district and chiefdom summaries for `records`.
///
/// Never fails: absent columns, unreadable cells and unrepresentable sums all
/// degrade to zero contributions and are listed in [`Summaries::issues`].
#[instrument(level = "debug", skip_all, fields(rows = records.len()))]
pub fn summarize(records: &[EnrichedRecord]) -> Summaries {
    if records.is_empty() {
        return Summaries::default();
    }

    let columns = MetricColumns::new();
    let mut audit = ColumnAudit::default();
    let mut overall = OverallAcc::default();
    let mut districts: Groups<DistrictKey, DistrictAcc> = Groups::default();
    let mut chiefdoms: Groups<ChiefdomKey, ClassSums> = Groups::default();

    for record in records {
        let counts = columns.read(record, &mut audit);
        let location = &record.location;
        overall.add(location, &counts);

        let Some(district) = &location.district else {
            continue;
        };
        let district_acc = districts.entry(DistrictKey(district.clone()));
        district_acc.sums.add(&counts);
        if let Some(chiefdom) = &location.chiefdom {
            district_acc.chiefdoms.insert(chiefdom.clone());
            chiefdoms
                .entry(ChiefdomKey {
                    district: district.clone(),
                    chiefdom: chiefdom.clone(),
                })
                .add(&counts);
        }
    }

    let mut issues = audit.into_issues(&columns);

    let overall = OverallSummary {
        schools: overall.sums.rows,
        districts: overall.districts.len(),
        chiefdoms: overall.chiefdoms.len(),
        totals: overall.sums.totals(&columns, GroupId::Overall, &mut issues),
    };

    let districts = districts
        .into_entries()
        .map(|(key, acc)| DistrictSummary {
            schools: acc.sums.rows,
            chiefdoms: acc.chiefdoms.len(),
            totals: acc
                .sums
                .totals(&columns, GroupId::District(key.clone()), &mut issues),
            district: key.0,
        })
        .collect::<Vec<_>>();

    let chiefdoms = chiefdoms
        .into_entries()
        .map(|(key, sums)| ChiefdomSummary {
            schools: sums.rows,
            totals: sums.totals(&columns, GroupId::Chiefdom(key.clone()), &mut issues),
            district: key.district,
            chiefdom: key.chiefdom,
        })
        .collect::<Vec<_>>();

    for issue in &issues {
        warn!(%issue, "recovered aggregation issue");
    }
    info!(
        schools = overall.schools,
        districts = districts.len(),
        chiefdoms = chiefdoms.len(),
        "summaries computed"
    );

    Summaries {
        overall,
        districts,
        chiefdoms,
        issues,
    }
}

/// Headers of the fifteen class metric columns, indexed `[class][metric]`.
struct MetricColumns([[String; METRICS]; CLASSES]);

impl MetricColumns {
    fn new() -> Self {
        Self(std::array::from_fn(|class| {
            std::array::from_fn(|metric| {
                ColumnScheme::metric_column(ClassMetric::ALL[metric], class as u8 + 1)
            })
        }))
    }

    fn name(&self, class: usize, metric: usize) -> &str {
        &self.0[class][metric]
    }

    fn read(&self, record: &EnrichedRecord, audit: &mut ColumnAudit) -> RowCounts {
        let mut counts = RowCounts::default();
        for class in 0..CLASSES {
            for metric in 0..METRICS {
                let contribution = record.contribution(self.name(class, metric));
                audit.observe(class, metric, contribution);
                counts.0[class][metric] = contribution.amount();
            }
        }
        counts
    }
}

#[derive(Default)]
struct RowCounts([[f64; METRICS]; CLASSES]);

/// Tracks which metric columns exist and how many of their cells were unusable.
#[derive(Default)]
struct ColumnAudit {
    seen: [[bool; METRICS]; CLASSES],
    unparseable: [[usize; METRICS]; CLASSES],
}

impl ColumnAudit {
    fn observe(&mut self, class: usize, metric: usize, contribution: Contribution) {
        match contribution {
            Contribution::Absent => {}
            Contribution::Unparseable => {
                self.seen[class][metric] = true;
                self.unparseable[class][metric] += 1;
            }
            Contribution::Value(_) | Contribution::Blank => self.seen[class][metric] = true,
        }
    }

    fn into_issues(self, columns: &MetricColumns) -> Vec<AggregationIssue> {
        let mut issues = Vec::new();
        for class in 0..CLASSES {
            for metric in 0..METRICS {
                let column = columns.name(class, metric).to_string();
                if !self.seen[class][metric] {
                    issues.push(AggregationIssue::ColumnMissing { column });
                } else if self.unparseable[class][metric] > 0 {
                    issues.push(AggregationIssue::ValueCoercion {
                        column,
                        cells: self.unparseable[class][metric],
                    });
                }
            }
        }
        issues
    }
}

/// Running per-class sums for one group.
#[derive(Default)]
struct ClassSums {
    rows: usize,
    sums: [[f64; METRICS]; CLASSES],
}

impl ClassSums {
    fn add(&mut self, counts: &RowCounts) {
        self.rows += 1;
        for (sums, row) in self.sums.iter_mut().zip(counts.0.iter()) {
            for (sum, value) in sums.iter_mut().zip(row.iter()) {
                *sum += value;
            }
        }
    }

    /// Truncates each column sum to a count, then adds the classes together.
    fn totals(
        &self,
        columns: &MetricColumns,
        group: GroupId,
        issues: &mut Vec<AggregationIssue>,
    ) -> MetricTotals {
        let mut counts = [0i64; METRICS];
        for (class, sums) in self.sums.iter().enumerate() {
            for (metric, sum) in sums.iter().enumerate() {
                match exact_count(*sum) {
                    Some(count) => counts[metric] += count,
                    None => issues.push(AggregationIssue::GroupComputation {
                        group: group.clone(),
                        column: columns.name(class, metric).to_string(),
                        reason: format!("sum {sum} is outside the countable range"),
                    }),
                }
            }
        }
        let [enrollment, boys, girls] = counts;
        MetricTotals::from_counts(enrollment, boys, girls)
    }
}

fn exact_count(sum: f64) -> Option<i64> {
    (sum.is_finite() && sum.abs() <= MAX_EXACT_SUM).then(|| sum.trunc() as i64)
}

#[derive(Default)]
struct OverallAcc {
    sums: ClassSums,
    districts: HashSet<String>,
    chiefdoms: HashSet<String>,
}

impl OverallAcc {
    fn add(&mut self, location: &ExtractedLocation, counts: &RowCounts) {
        self.sums.add(counts);
        if let Some(district) = &location.district {
            self.districts.insert(district.clone());
        }
        if let Some(chiefdom) = &location.chiefdom {
            self.chiefdoms.insert(chiefdom.clone());
        }
    }
}

#[derive(Default)]
struct DistrictAcc {
    sums: ClassSums,
    chiefdoms: HashSet<String>,
}

/// Insertion-ordered map from group key to accumulator.
struct Groups<K, A> {
    index: HashMap<K, usize>,
    entries: Vec<(K, A)>,
}

impl<K, A> Default for Groups<K, A> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, A: Default> Groups<K, A> {
    fn entry(&mut self, key: K) -> &mut A {
        let position = match self.index.get(&key) {
            Some(position) => *position,
            None => {
                let position = self.entries.len();
                self.index.insert(key.clone(), position);
                self.entries.push((key, A::default()));
                position
            }
        };
        &mut self.entries[position].1
    }

    fn into_entries(self) -> impl Iterator<Item = (K, A)> {
        self.entries.into_iter()
    }
}
