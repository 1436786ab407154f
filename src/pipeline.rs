use crate::lexicon::LexicalRecord;
use crate::plural::{resolve, AuditLogs, ResolvedRecord, ReviewOptions, Reviewer};
use crate::reconcile::reconcile_pronunciations;
use crate::rewrite::RewriteRuleCollection;
use crate::sounds::Alphabet;
use crate::table::{FeatureTable, Limit};
use crate::transcription::Decoder;
use crate::PlurGenResult;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Rightmost syllables whose stress is kept.
    pub stress_limiter: Limit,
    /// Rightmost syllables whose onset, nucleus and coda are kept.
    pub syllable_limiter: Limit,
    pub collapse_variable_pronunciations: bool,
    /// Neutralize word-final obstruents.
    pub use_underspecification: bool,
    pub include_final_letter: bool,
    #[serde(flatten)]
    pub review: ReviewOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stress_limiter: Limit::Unbounded,
            syllable_limiter: Limit::Unbounded,
            collapse_variable_pronunciations: true,
            use_underspecification: false,
            include_final_letter: false,
            review: Default::default(),
        }
    }
}

impl Options {
    pub fn from_json<R: io::Read>(reader: R) -> PlurGenResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> PlurGenResult<Self> {
        Self::from_json(File::open(path)?)
    }
}

/// Headerless output table, fully built before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub(crate) rows: Vec<Vec<String>>,
    pub(crate) stress_width: usize,
    pub(crate) feature_width: usize,
}

impl Output {
    fn new(
        records: Vec<ResolvedRecord>,
        stress_width: usize,
        feature_width: usize,
        include_final_letter: bool,
    ) -> Self {
        let rows = records
            .into_iter()
            .map(|r| {
                // lemma, then joined attributes, then the transcription
                let mut row = vec![r.lemma.clone()];
                row.extend(r.attributes);
                row.push(r.transcription);
                row.extend(r.row.cells());
                if include_final_letter {
                    row.push(r.lemma.chars().last().map(String::from).unwrap_or_default());
                }
                row.push(r.class.to_string());
                row
            })
            .collect();
        Self {
            rows,
            stress_width,
            feature_width,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn stress_width(&self) -> usize {
        self.stress_width
    }

    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> PlurGenResult<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Serializes in memory first so a failure never leaves a half-written file.
    pub fn write_to_path(&self, path: &Path) -> PlurGenResult<()> {
        let mut buf = vec![];
        self.write_csv(&mut buf)?;
        std::fs::write(path, buf)?;
        Ok(())
    }
}

/// Trims whitespace and quotes from a file name and makes sure it ends in `.csv`.
pub fn output_path(name: &str) -> PathBuf {
    let name = name.trim().trim_matches('"').trim_matches('\'');
    if name.to_lowercase().ends_with(".csv") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.csv", name))
    }
}

/// Decode, align, neutralize, reconcile, then classify and resolve.
pub struct Pipeline {
    options: Options,
    alphabet: Alphabet,
    neutralization: RewriteRuleCollection,
}

impl Pipeline {
    pub fn new(options: Options) -> PlurGenResult<Self> {
        Ok(Self {
            options,
            alphabet: Alphabet::disc()?,
            neutralization: RewriteRuleCollection::neutralization()?,
        })
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_neutralization(mut self, rules: RewriteRuleCollection) -> Self {
        self.neutralization = rules;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn run<R: Reviewer + ?Sized>(
        &self,
        records: Vec<LexicalRecord>,
        reviewer: &mut R,
        logs: &mut AuditLogs,
    ) -> PlurGenResult<Output> {
        info!("Processing {} records", records.len());
        let mut decoder = Decoder::new(self.alphabet.clone());
        let mut errors = vec![];
        for r in &records {
            if let Err(e) = decoder.decode(&r.transcription) {
                error!("{}: {}", r.lemma, e);
                errors.push(e);
            }
        }
        if !errors.is_empty() {
            error!("{} records have malformed transcriptions", errors.len());
            return Err(errors.remove(0));
        }
        info!("Decoded {} distinct transcriptions", decoder.cached_len());

        let mut table = FeatureTable::build(
            &decoder.into_cache(),
            self.options.stress_limiter,
            self.options.syllable_limiter,
        );
        info!(
            "Aligned to {} stress and {} slot columns",
            table.stress_width(),
            table.feature_width()
        );
        if self.options.use_underspecification {
            self.neutralization.apply_to_table(&mut table);
        }

        let mut aligned = table.join(records);
        if self.options.collapse_variable_pronunciations {
            aligned = reconcile_pronunciations(aligned);
        }
        let resolved = resolve(aligned, &self.options.review, reviewer, logs)?;
        info!("{} rows left after resolving plurals", resolved.len());
        Ok(Output::new(
            resolved,
            table.stress_width(),
            table.feature_width(),
            self.options.include_final_letter,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plural::{ClassifiedRecord, Decision, KeepAll};
    use crate::PlurGenError;

    fn records() -> Vec<LexicalRecord> {
        vec![
            LexicalRecord::new("hond", "honden", "'hOnt").with_attributes(vec!["de".into()]),
            LexicalRecord::new("bakker", "bakkers", "'bA-k@r").with_attributes(vec!["de".into()]),
            LexicalRecord::new("olifant", "olifanten", "'o-li-fAnt")
                .with_attributes(vec!["de".into()]),
            LexicalRecord::new("olifant", "olifanten", "o-li-'fAnt")
                .with_attributes(vec!["de".into()]),
            LexicalRecord::new("museum", "musea", "my-'ze-j}m").with_attributes(vec!["het".into()]),
            LexicalRecord::new("appel", "appels", "'A-p@l").with_attributes(vec!["de".into()]),
            LexicalRecord::new("appel", "appelen", "'A-p@l").with_attributes(vec!["de".into()]),
        ]
    }

    #[test]
    fn t_options_json() {
        let json = r#"{
            "stress_limiter": "2",
            "syllable_limiter": "ALL",
            "use_underspecification": true,
            "review_irregulars": true,
            "keep_variables": false
        }"#;
        let options = Options::from_json(json.as_bytes()).unwrap();
        assert_eq!(options.stress_limiter, Limit::Count(2));
        assert_eq!(options.syllable_limiter, Limit::Unbounded);
        assert!(options.use_underspecification);
        assert!(options.collapse_variable_pronunciations);
        assert!(options.review.review_irregulars);
        assert!(!options.review.keep_variables);
        assert!(!options.review.keep_irregulars);

        let bad = r#"{ "stress_limiter": "two" }"#;
        assert!(matches!(
            Options::from_json(bad.as_bytes()),
            Err(PlurGenError::Json(_))
        ));
    }

    #[test]
    fn t_end_to_end() {
        let options = Options {
            use_underspecification: true,
            include_final_letter: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(options).unwrap();
        let output = pipeline
            .run(records(), &mut KeepAll, &mut AuditLogs::default())
            .unwrap();
        assert_eq!(output.stress_width(), 3);
        assert_eq!(output.feature_width(), 9);
        // lemma, gender, transcription, 3 stress, 9 slots, final letter, class
        assert!(output.rows().iter().all(|r| r.len() == 17));
        let lemmas = output.rows().iter().map(|r| r[0].as_str()).collect::<Vec<_>>();
        assert_eq!(lemmas, vec!["hond", "bakker", "olifant", "appel"]);

        let hond = &output.rows()[0];
        assert_eq!(hond[1], "de");
        assert_eq!(hond[2], "'hOnt");
        assert_eq!(&hond[3..6], &["-", "-", "+"]);
        assert_eq!(&hond[12..15], &["h", "O", "n?"]);
        assert_eq!(hond[15], "d");
        assert_eq!(hond[16], "EN");

        let olifant = &output.rows()[2];
        assert_eq!(olifant[2], "'o-li-fAnt");
        assert_eq!(&olifant[3..6], &["+", "-", "-"]);
        assert_eq!(olifant[14], "n?");

        let appel = &output.rows()[3];
        assert_eq!(appel[16], "VAR");
    }

    #[test]
    fn t_limited_widths() {
        let options = Options {
            stress_limiter: Limit::Count(1),
            syllable_limiter: Limit::Count(2),
            collapse_variable_pronunciations: false,
            ..Default::default()
        };
        let output = Pipeline::new(options)
            .unwrap()
            .run(records(), &mut KeepAll, &mut AuditLogs::default())
            .unwrap();
        assert_eq!(output.stress_width(), 1);
        assert_eq!(output.feature_width(), 6);
        assert!(output.rows().iter().all(|r| r.len() == 3 + 1 + 6 + 1));
        // both pronunciations of olifant survive without collapsing
        assert_eq!(output.rows().iter().filter(|r| r[0] == "olifant").count(), 2);
    }

    #[test]
    fn t_bad_transcription_aborts() {
        let mut input = records();
        input.push(LexicalRecord::new("xyz", "xyzs", "'bk"));
        let mut logs = AuditLogs::default();
        let mut reviewer = |_: &ClassifiedRecord| -> Decision { panic!("no review expected") };
        let result = Pipeline::new(Options::default())
            .unwrap()
            .run(input, &mut reviewer, &mut logs);
        assert!(matches!(
            result,
            Err(PlurGenError::TranscriptionFormat { vowels: 0, .. })
        ));
    }

    #[test]
    fn t_write_csv() {
        let output = Pipeline::new(Options::default())
            .unwrap()
            .run(
                vec![LexicalRecord::new("kat", "katten", "'kAt")],
                &mut KeepAll,
                &mut AuditLogs::default(),
            )
            .unwrap();
        let mut buf = vec![];
        output.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["kat,'kAt,+,k,A,t,EN"]);
    }

    #[test]
    fn t_custom_rules() {
        let options = Options {
            use_underspecification: true,
            ..Default::default()
        };
        let output = Pipeline::new(options)
            .unwrap()
            .with_neutralization(RewriteRuleCollection::try_parse("r|R").unwrap())
            .run(
                vec![
                    LexicalRecord::new("bakker", "bakkers", "'bA-k@r"),
                    LexicalRecord::new("hond", "honden", "'hOnt"),
                ],
                &mut KeepAll,
                &mut AuditLogs::default(),
            )
            .unwrap();
        let codas = output.rows().iter().map(|r| r[r.len() - 2].as_str()).collect::<Vec<_>>();
        assert_eq!(codas, vec!["R", "nt"]);
    }

    #[test]
    fn t_output_path() {
        assert_eq!(output_path(" \"result\" "), PathBuf::from("result.csv"));
        assert_eq!(output_path("'data.CSV'"), PathBuf::from("data.CSV"));
        assert_eq!(output_path("out.csv"), PathBuf::from("out.csv"));
    }
}
