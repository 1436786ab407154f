use crate::table::{AlignedRecord, AlignedRow};
use crate::PlurGenError::Configuration;
use crate::PlurGenResult;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum PluralClass {
    #[strum(serialize = "S")]
    S,
    #[strum(serialize = "EN")]
    En,
    #[strum(serialize = "IRR")]
    Irr,
    #[strum(serialize = "VAR")]
    Var,
}

/// Plural class from the orthographic suffix alone.
pub fn classify(surface_form: &str) -> PluralClass {
    let s = surface_form.to_lowercase();
    if s.ends_with('s') {
        PluralClass::S
    } else if s.ends_with("en") || s.ends_with('n') {
        PluralClass::En
    } else {
        PluralClass::Irr
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassifiedRecord {
    pub aligned: AlignedRecord,
    pub class: PluralClass,
}

impl ClassifiedRecord {
    pub fn lemma(&self) -> &str {
        &self.aligned.record.lemma
    }

    pub fn surface_form(&self) -> &str {
        &self.aligned.record.surface_form
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Discard,
}

impl Decision {
    /// Only an explicit `y` or `n` is an answer.
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" => Some(Decision::Keep),
            "n" => Some(Decision::Discard),
            _ => None,
        }
    }
}

/// Decides whether a flagged row survives review.
pub trait Reviewer {
    fn review(&mut self, record: &ClassifiedRecord) -> Decision;
}

impl<F: FnMut(&ClassifiedRecord) -> Decision> Reviewer for F {
    fn review(&mut self, record: &ClassifiedRecord) -> Decision {
        self(record)
    }
}

pub struct KeepAll;

impl Reviewer for KeepAll {
    fn review(&mut self, _: &ClassifiedRecord) -> Decision {
        Decision::Keep
    }
}

/// Append-only list of flagged rows, one `lemma,form,class` line per row.
pub struct AuditLog {
    writer: Box<dyn Write>,
    written: usize,
}

impl AuditLog {
    pub fn new<W: Write + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
            written: 0,
        }
    }

    pub fn open_append(path: &Path) -> PlurGenResult<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }

    pub fn append(&mut self, record: &ClassifiedRecord) -> PlurGenResult<()> {
        let mut line = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        line.write_record([
            record.lemma(),
            record.surface_form(),
            record.class.to_string().as_str(),
        ])?;
        let line = line
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

#[derive(Default)]
pub struct AuditLogs {
    pub removed: Option<AuditLog>,
    pub irregulars: Option<AuditLog>,
    pub variables: Option<AuditLog>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewOptions {
    pub review_irregulars: bool,
    pub keep_irregulars: bool,
    pub write_irregulars: bool,
    pub review_variables: bool,
    pub keep_variables: bool,
    pub write_variables: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            review_irregulars: false,
            keep_irregulars: false,
            write_irregulars: false,
            review_variables: false,
            keep_variables: true,
            write_variables: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedRecord {
    pub lemma: String,
    pub transcription: String,
    pub attributes: Vec<String>,
    pub row: AlignedRow,
    pub class: PluralClass,
}

/// Lowercases forms, classifies each one by its suffix and drops duplicate rows.
pub fn classify_records(records: Vec<AlignedRecord>) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|mut aligned| {
            aligned.record.surface_form = aligned.record.surface_form.to_lowercase();
            let class = classify(&aligned.record.surface_form);
            ClassifiedRecord { aligned, class }
        })
        .unique()
        .collect()
}

/// Marks every row of a lemma with an irregular form as irregular, so the
/// reviewer sees all of its forms.
pub fn shadow_irregulars(rows: &mut [ClassifiedRecord]) -> usize {
    let irregular = rows
        .iter()
        .filter(|r| r.class == PluralClass::Irr)
        .map(|r| r.lemma().to_string())
        .collect::<HashSet<_>>();
    for row in rows.iter_mut() {
        if irregular.contains(row.lemma()) {
            row.class = PluralClass::Irr;
        }
    }
    debug!("{} lemmas have an irregular form", irregular.len());
    irregular.len()
}

fn review<R: Reviewer + ?Sized>(
    rows: &mut Vec<ClassifiedRecord>,
    class: PluralClass,
    reviewer: &mut R,
    log: &mut Option<AuditLog>,
) -> PlurGenResult<usize> {
    let log = log.as_mut().ok_or_else(|| {
        Configuration(format!("reviewing {} rows needs a log for removed rows", class))
    })?;
    let mut kept = Vec::with_capacity(rows.len());
    let mut discarded = 0;
    for row in std::mem::take(rows) {
        if row.class == class && reviewer.review(&row) == Decision::Discard {
            log.append(&row)?;
            discarded += 1;
            continue;
        }
        kept.push(row);
    }
    *rows = kept;
    info!("Discarded {} {} rows during review", discarded, class);
    Ok(discarded)
}

fn write_all(
    rows: &[ClassifiedRecord],
    class: PluralClass,
    log: &mut Option<AuditLog>,
) -> PlurGenResult<()> {
    if let Some(log) = log.as_mut() {
        for row in rows.iter().filter(|r| r.class == class) {
            log.append(row)?;
        }
    }
    Ok(())
}

/// A lemma down to a single row of `class` gets the plain suffix class back.
fn reclassify_sole_survivors(rows: &mut [ClassifiedRecord], class: PluralClass) -> usize {
    let counts = rows.iter().counts_by(|r| r.lemma().to_string());
    let mut changed = 0;
    for row in rows.iter_mut() {
        if row.class == class && counts.get(row.lemma()) == Some(&1) {
            row.class = classify(row.surface_form());
            if row.class != class {
                changed += 1;
            }
        }
    }
    debug!("Reclassified {} sole {} rows", changed, class);
    changed
}

/// Marks every row of a lemma whose forms take both S and EN as variable.
fn escalate_variables(rows: &mut [ClassifiedRecord]) -> usize {
    let mut classes: HashMap<String, HashSet<PluralClass>> = HashMap::new();
    for row in rows.iter() {
        classes
            .entry(row.lemma().to_string())
            .or_default()
            .insert(row.class);
    }
    let variable = classes
        .into_iter()
        .filter(|(_, c)| c.contains(&PluralClass::S) && c.contains(&PluralClass::En))
        .map(|(l, _)| l)
        .collect::<HashSet<_>>();
    for row in rows.iter_mut() {
        if variable.contains(row.lemma()) {
            row.class = PluralClass::Var;
        }
    }
    info!("{} lemmas have variable plurals", variable.len());
    variable.len()
}

pub fn irregular_pass<R: Reviewer + ?Sized>(
    rows: &mut Vec<ClassifiedRecord>,
    options: &ReviewOptions,
    reviewer: &mut R,
    logs: &mut AuditLogs,
) -> PlurGenResult<()> {
    if options.review_irregulars {
        shadow_irregulars(rows);
        review(rows, PluralClass::Irr, reviewer, &mut logs.removed)?;
    }
    if options.write_irregulars {
        write_all(rows, PluralClass::Irr, &mut logs.irregulars)?;
    }
    reclassify_sole_survivors(rows, PluralClass::Irr);
    if !options.keep_irregulars {
        rows.retain(|r| r.class != PluralClass::Irr);
    }
    Ok(())
}

pub fn variable_pass<R: Reviewer + ?Sized>(
    rows: &mut Vec<ClassifiedRecord>,
    options: &ReviewOptions,
    reviewer: &mut R,
    logs: &mut AuditLogs,
) -> PlurGenResult<()> {
    escalate_variables(rows);
    if options.review_variables {
        review(rows, PluralClass::Var, reviewer, &mut logs.removed)?;
    }
    reclassify_sole_survivors(rows, PluralClass::Var);
    if options.write_variables {
        write_all(rows, PluralClass::Var, &mut logs.variables)?;
    }
    if !options.keep_variables {
        rows.retain(|r| r.class != PluralClass::Var);
    }
    Ok(())
}

/// Classifies, reviews and deduplicates down to one row per lemma and transcription.
pub fn resolve<R: Reviewer + ?Sized>(
    records: Vec<AlignedRecord>,
    options: &ReviewOptions,
    reviewer: &mut R,
    logs: &mut AuditLogs,
) -> PlurGenResult<Vec<ResolvedRecord>> {
    let mut rows = classify_records(records);
    irregular_pass(&mut rows, options, reviewer, logs)?;
    variable_pass(&mut rows, options, reviewer, logs)?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let record = r.aligned.record;
            ResolvedRecord {
                lemma: record.lemma,
                transcription: record.transcription,
                attributes: record.attributes,
                row: r.aligned.row,
                class: r.class,
            }
        })
        .unique()
        .collect())
}
