use crate::PlurGenError::InputFormat;
use crate::PlurGenResult;
use itertools::Itertools;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

pub const LEMMA: &str = "Lemma";
pub const SURFACE_FORM: &str = "Word";
pub const TRANSCRIPTION: &str = "PhonStrsDISC";

const PHONOLOGY_UNUSED: [&str; 5] = ["IdNum", "Inl", "IdNumLemma", "PhonCVBR", "PhonSylBCLX"];
const SINGULARS_UNUSED: [&str; 1] = ["Frequency"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexicalRecord {
    pub lemma: String,
    pub surface_form: String,
    pub transcription: String,
    /// Remaining joined columns, in table order.
    pub attributes: Vec<String>,
}

impl LexicalRecord {
    pub fn new(
        lemma: impl Into<String>,
        surface_form: impl Into<String>,
        transcription: impl Into<String>,
    ) -> Self {
        Self {
            lemma: lemma.into(),
            surface_form: surface_form.into(),
            transcription: transcription.into(),
            attributes: vec![],
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A whole CSV file held in memory, column order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub(crate) name: String,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn from_reader<R: io::Read>(name: &str, reader: R) -> PlurGenResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| InputFormat(format!("{} not correctly formatted ({})", name, e)))?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let mut rows = vec![];
        for result in rdr.records() {
            let record =
                result.map_err(|e| InputFormat(format!("{} not correctly formatted ({})", name, e)))?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn from_path(name: &str, path: &Path) -> PlurGenResult<Self> {
        let file = File::open(path)
            .map_err(|e| InputFormat(format!("Could not open {} ({})", path.display(), e)))?;
        let table = Self::from_reader(name, file)?;
        info!(
            "Read {} rows from {} ({})",
            table.rows.len(),
            path.display(),
            name
        );
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require(&self, name: &str) -> PlurGenResult<usize> {
        self.column(name).ok_or(InputFormat(format!(
            "{} has no {:?} column",
            self.name, name
        )))
    }

    /// Removes the named columns; names that are not present are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep = self
            .headers
            .iter()
            .map(|h| !names.contains(&h.as_str()))
            .collect::<Vec<_>>();
        let filter = |row: Vec<String>| {
            row.into_iter()
                .zip(keep.iter())
                .filter(|(_, k)| **k)
                .map(|(v, _)| v)
                .collect::<Vec<_>>()
        };
        self.headers = filter(std::mem::take(&mut self.headers));
        self.rows = std::mem::take(&mut self.rows)
            .into_iter()
            .map(filter)
            .collect();
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(i) = self.column(from) {
            self.headers[i] = to.to_string();
        }
    }

    /// Drops repeated rows, keeping the first occurrence.
    pub fn dedup(&mut self) {
        self.rows = std::mem::take(&mut self.rows).into_iter().unique().collect();
    }

    /// Inner join on one key column. Rows come out in left order, then right order.
    pub fn inner_join(&self, other: &CsvTable, on: &str) -> PlurGenResult<CsvTable> {
        let left_key = self.require(on)?;
        let right_key = other.require(on)?;
        let mut by_key: HashMap<&str, Vec<&Vec<String>>> = HashMap::new();
        for row in &other.rows {
            if let Some(k) = row.get(right_key) {
                by_key.entry(k.as_str()).or_default().push(row);
            }
        }
        let mut headers = self.headers.clone();
        for (i, h) in other.headers.iter().enumerate() {
            if i == right_key {
                continue;
            }
            if headers.contains(h) {
                headers.push(format!("{}_{}", h, other.name));
            } else {
                headers.push(h.clone());
            }
        }
        let mut rows = vec![];
        for left in &self.rows {
            let Some(matches) = left.get(left_key).and_then(|k| by_key.get(k.as_str())) else {
                continue;
            };
            for right in matches {
                let mut row = left.clone();
                row.extend(
                    right
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != right_key)
                        .map(|(_, v)| v.clone()),
                );
                rows.push(row);
            }
        }
        Ok(CsvTable {
            name: format!("{}+{}", self.name, other.name),
            headers,
            rows,
        })
    }

    pub fn into_records(self) -> PlurGenResult<Vec<LexicalRecord>> {
        let lemma = self.require(LEMMA)?;
        let surface_form = self.require(SURFACE_FORM)?;
        let transcription = self.require(TRANSCRIPTION)?;
        let fixed = [lemma, surface_form, transcription];
        self.rows
            .into_iter()
            .map(|row| {
                if row.len() != self.headers.len() {
                    return Err(InputFormat(format!(
                        "{} row has {} fields, expected {}",
                        self.name,
                        row.len(),
                        self.headers.len()
                    )));
                }
                let attributes = row
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !fixed.contains(i))
                    .map(|(_, v)| v.clone())
                    .collect();
                Ok(LexicalRecord {
                    lemma: row[lemma].clone(),
                    surface_form: row[surface_form].clone(),
                    transcription: row[transcription].clone(),
                    attributes,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconPaths {
    pub phonology: PathBuf,
    pub singulars: PathBuf,
    pub plurals: PathBuf,
}

impl Default for LexiconPaths {
    fn default() -> Self {
        Self {
            phonology: PathBuf::from("dpw.csv"),
            singulars: PathBuf::from("lexicon_singulars.csv"),
            plurals: PathBuf::from("lexicon_plurals.csv"),
        }
    }
}

impl LexiconPaths {
    pub fn missing(&self) -> Vec<&Path> {
        [&self.phonology, &self.singulars, &self.plurals]
            .into_iter()
            .filter(|p| !p.exists())
            .map(|p| p.as_path())
            .collect()
    }

    /// Reports every missing file before failing.
    pub fn check_presence(&self) -> PlurGenResult<()> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        for p in &missing {
            error!("Could not find {}", p.display());
        }
        Err(InputFormat(format!(
            "missing input files: {}",
            missing.iter().map(|p| p.display()).join(", ")
        )))
    }

    pub fn load_records(&self) -> PlurGenResult<Vec<LexicalRecord>> {
        self.check_presence()?;
        let phonology = CsvTable::from_path("phonology", &self.phonology)?;
        let singulars = CsvTable::from_path("singulars", &self.singulars)?;
        let plurals = CsvTable::from_path("plurals", &self.plurals)?;
        prepare_records(phonology, singulars, plurals)
    }
}

/// Joins plurals with singulars and then with the phonological lexicon, all on lemma.
pub fn prepare_records(
    mut phonology: CsvTable,
    mut singulars: CsvTable,
    mut plurals: CsvTable,
) -> PlurGenResult<Vec<LexicalRecord>> {
    phonology.drop_columns(&PHONOLOGY_UNUSED);
    phonology.dedup();
    phonology.rename_column(SURFACE_FORM, LEMMA);
    phonology.require(TRANSCRIPTION)?;
    singulars.drop_columns(&SINGULARS_UNUSED);
    plurals.dedup();
    plurals.require(SURFACE_FORM)?;

    let joined = plurals
        .inner_join(&singulars, LEMMA)?
        .inner_join(&phonology, LEMMA)?;
    info!("Joined lexicons into {} records", joined.len());
    joined.into_records()
}

#[cfg(test)]
mod test {
    use super::*;

    const DPW: &str = "\
IdNum,Word,Inl,IdNumLemma,PhonStrsDISC,PhonCVBR,PhonSylBCLX
1,kat,10,1,'kAt,[CVC],[kAt]
1,kat,10,1,'kAt,[CVC],[kAt]
2,bakter,3,2,'bak-t@r,[CVV][CVC],[bak][t@r]
3,hond,5,3,'hOnt,[CVCC],[hOnt]";

    const SINGULARS: &str = "\
Lemma,Frequency,Gender
kat,120,de
bakter,4,de
hond,300,de";

    const PLURALS: &str = "\
Lemma,Word
kat,katten
kat,katten
bakter,bakters
bakter,bakkers
vis,vissen";

    fn tables() -> (CsvTable, CsvTable, CsvTable) {
        (
            CsvTable::from_reader("phonology", DPW.as_bytes()).unwrap(),
            CsvTable::from_reader("singulars", SINGULARS.as_bytes()).unwrap(),
            CsvTable::from_reader("plurals", PLURALS.as_bytes()).unwrap(),
        )
    }

    #[test]
    fn t_prepare() {
        let (p, s, pl) = tables();
        let records = prepare_records(p, s, pl).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].lemma, "kat");
        assert_eq!(records[0].surface_form, "katten");
        assert_eq!(records[0].transcription, "'kAt");
        assert_eq!(records[0].attributes, vec!["de"]);
        assert_eq!(records[1].surface_form, "bakters");
        assert_eq!(records[2].surface_form, "bakkers");
        assert!(records.iter().all(|r| r.lemma != "vis" && r.lemma != "hond"));
    }

    #[test]
    fn t_drop_and_rename() {
        let (mut p, _, _) = tables();
        p.drop_columns(&PHONOLOGY_UNUSED);
        p.rename_column("Word", "Lemma");
        assert_eq!(p.headers(), &["Lemma", "PhonStrsDISC"]);
        p.dedup();
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn t_join_suffixes_duplicates() {
        let left = CsvTable::from_reader("a", "Lemma,X\nk,1\n".as_bytes()).unwrap();
        let right = CsvTable::from_reader("b", "X,Lemma\n2,k\n3,k\n".as_bytes()).unwrap();
        let joined = left.inner_join(&right, "Lemma").unwrap();
        assert_eq!(joined.headers(), &["Lemma", "X", "X_b"]);
        assert_eq!(joined.rows, vec![vec!["k", "1", "2"], vec!["k", "1", "3"]]);
    }

    #[test]
    fn t_missing_column() {
        let (p, s, _) = tables();
        let plurals = CsvTable::from_reader("plurals", "Lemma,Form\nkat,katten\n".as_bytes()).unwrap();
        assert!(matches!(
            prepare_records(p, s, plurals),
            Err(crate::PlurGenError::InputFormat(_))
        ));
    }

    #[test]
    fn t_missing_files() {
        let paths = LexiconPaths {
            phonology: PathBuf::from("/nonexistent/dpw.csv"),
            singulars: PathBuf::from("/nonexistent/lexicon_singulars.csv"),
            plurals: PathBuf::from("/nonexistent/lexicon_plurals.csv"),
        };
        assert_eq!(paths.missing().len(), 3);
        assert!(paths.check_presence().is_err());
        assert!(paths.load_records().is_err());
    }
}
