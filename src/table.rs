use crate::lexicon::LexicalRecord;
use crate::raw_data::EMPTY_SLOT;
use crate::transcription::{Decoded, Stress};
use crate::PlurGenError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How many of the rightmost syllables to keep.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Limit {
    Count(usize),
    #[default]
    Unbounded,
}

impl Limit {
    pub fn keep(&self, width: usize) -> usize {
        match self {
            Limit::Count(k) => (*k).min(width),
            Limit::Unbounded => width,
        }
    }
}

impl FromStr for Limit {
    type Err = PlurGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Limit::Unbounded);
        }
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PlurGenError::Configuration(format!(
                "{:?} is neither a number nor ALL",
                s
            )));
        }
        Ok(Limit::Count(s.parse::<usize>()?))
    }
}

impl TryFrom<String> for Limit {
    type Error = PlurGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Limit> for String {
    fn from(value: Limit) -> Self {
        value.to_string()
    }
}

impl Display for Limit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Count(k) => write!(f, "{}", k),
            Limit::Unbounded => write!(f, "ALL"),
        }
    }
}

fn pad_left<T: Clone>(v: Vec<T>, width: usize, fill: T) -> Vec<T> {
    if v.len() >= width {
        return v;
    }
    let mut result = vec![fill; width - v.len()];
    result.extend(v);
    result
}

fn truncate_left<T>(v: &mut Vec<T>, width: usize) {
    if v.len() > width {
        v.drain(..v.len() - width);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlignedRow {
    pub(crate) stress: Vec<Stress>,
    pub(crate) slots: Vec<String>,
}

impl AlignedRow {
    fn placeholder(stress_width: usize, syllable_count: usize) -> Self {
        Self {
            stress: vec![Stress::Unstressed; stress_width],
            slots: vec![EMPTY_SLOT.to_string(); 3 * syllable_count],
        }
    }

    pub fn stress(&self) -> &[Stress] {
        &self.stress
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Coda of the last retained syllable.
    pub fn final_coda(&self) -> Option<&str> {
        self.slots.last().map(|s| s.as_str())
    }

    pub fn final_coda_mut(&mut self) -> Option<&mut String> {
        self.slots.last_mut()
    }

    pub fn cells(&self) -> impl Iterator<Item = String> + '_ {
        self.stress
            .iter()
            .map(|s| s.to_string())
            .chain(self.slots.iter().cloned())
    }
}

/// Rectangular stress and slot table keyed by transcription.
/// Syllables are right-aligned so the final syllable always lands in the last column.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    stress_width: usize,
    syllable_count: usize,
    rows: HashMap<String, AlignedRow>,
}

impl FeatureTable {
    pub fn build(
        decoded: &HashMap<String, Decoded>,
        stress_limit: Limit,
        syllable_limit: Limit,
    ) -> Self {
        let mut table = Self::pad(decoded);
        table.limit_stress(stress_limit);
        table.limit_syllables(syllable_limit);
        table
    }

    /// Left-pads every row to the longest transcription.
    pub fn pad(decoded: &HashMap<String, Decoded>) -> Self {
        let max_stress = decoded
            .values()
            .map(|d| d.stress_vector().len())
            .max()
            .unwrap_or(0);
        let max_feat = decoded
            .values()
            .map(|d| d.feature_vector().len())
            .max()
            .unwrap_or(0);
        debug!(
            "Padding {} transcriptions to {} stress and {} slot columns",
            decoded.len(),
            max_stress,
            max_feat
        );
        let rows = decoded
            .iter()
            .map(|(t, d)| {
                (
                    t.clone(),
                    AlignedRow {
                        stress: pad_left(d.stress_vector(), max_stress, Stress::Unstressed),
                        slots: pad_left(d.feature_vector(), max_feat, EMPTY_SLOT.to_string()),
                    },
                )
            })
            .collect();
        Self {
            stress_width: max_stress,
            syllable_count: max_feat / 3,
            rows,
        }
    }

    /// Drops the leftmost stress columns beyond the limit.
    pub fn limit_stress(&mut self, limit: Limit) {
        let width = limit.keep(self.stress_width);
        if width == self.stress_width {
            return;
        }
        for row in self.rows.values_mut() {
            truncate_left(&mut row.stress, width);
        }
        self.stress_width = width;
    }

    /// Drops whole leftmost syllables (three slot columns each) beyond the limit.
    pub fn limit_syllables(&mut self, limit: Limit) {
        let count = limit.keep(self.syllable_count);
        if count == self.syllable_count {
            return;
        }
        for row in self.rows.values_mut() {
            truncate_left(&mut row.slots, 3 * count);
        }
        self.syllable_count = count;
    }

    pub fn stress_width(&self) -> usize {
        self.stress_width
    }

    pub fn syllable_count(&self) -> usize {
        self.syllable_count
    }

    pub fn feature_width(&self) -> usize {
        3 * self.syllable_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, transcription: &str) -> Option<&AlignedRow> {
        self.rows.get(transcription)
    }

    pub fn final_codas_mut(&mut self) -> impl Iterator<Item = &mut String> + '_ {
        self.rows.values_mut().filter_map(|r| r.final_coda_mut())
    }

    /// Left outer join: every record gets exactly one row, in input order.
    pub fn join(&self, records: Vec<LexicalRecord>) -> Vec<AlignedRecord> {
        records
            .into_iter()
            .map(|record| {
                let row = match self.rows.get(&record.transcription) {
                    Some(r) => r.clone(),
                    None => {
                        warn!(
                            "No aligned row for {:?} ({}), using placeholders",
                            record.transcription, record.lemma
                        );
                        AlignedRow::placeholder(self.stress_width, self.syllable_count)
                    }
                };
                AlignedRecord { record, row }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlignedRecord {
    pub record: LexicalRecord,
    pub row: AlignedRow,
}
