use crate::table::AlignedRecord;
use log::info;
use std::collections::{HashMap, HashSet};

/// Keeps, for every lemma, only the records carrying the first transcription seen for it.
/// Other surface forms under that transcription survive. Order is preserved.
pub fn reconcile_pronunciations(records: Vec<AlignedRecord>) -> Vec<AlignedRecord> {
    let mut canonical: HashMap<String, String> = HashMap::new();
    for r in &records {
        canonical
            .entry(r.record.lemma.clone())
            .or_insert_with(|| r.record.transcription.clone());
    }
    let before = records.len();
    let mut collapsed = HashSet::new();
    let result = records
        .into_iter()
        .filter(|r| {
            let keep = canonical
                .get(&r.record.lemma)
                .map(|t| *t == r.record.transcription)
                .unwrap_or(true);
            if !keep {
                collapsed.insert(r.record.lemma.clone());
            }
            keep
        })
        .collect::<Vec<_>>();
    info!(
        "Collapsed variable pronunciations of {} lemmas ({} records dropped)",
        collapsed.len(),
        before - result.len()
    );
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexicon::LexicalRecord;
    use crate::table::FeatureTable;
    use itertools::Itertools;

    fn aligned(records: Vec<LexicalRecord>) -> Vec<AlignedRecord> {
        FeatureTable::default().join(records)
    }

    #[test]
    fn t_reconcile() {
        let records = aligned(vec![
            LexicalRecord::new("tomaat", "tomaten", "to-'mat"),
            LexicalRecord::new("kat", "katten", "'kAt"),
            LexicalRecord::new("tomaat", "tomaats", "to-'mat"),
            LexicalRecord::new("tomaat", "tomaten", "t@-'mat"),
            LexicalRecord::new("tomaat", "tomaats", "t@-'mat"),
        ]);
        let result = reconcile_pronunciations(records);
        let pairs = result
            .iter()
            .map(|r| {
                (
                    r.record.lemma.as_str(),
                    r.record.surface_form.as_str(),
                    r.record.transcription.as_str(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("tomaat", "tomaten", "to-'mat"),
                ("kat", "katten", "'kAt"),
                ("tomaat", "tomaats", "to-'mat"),
            ]
        );
    }

    #[test]
    fn t_one_transcription_per_lemma() {
        let records = aligned(vec![
            LexicalRecord::new("a", "as", "x"),
            LexicalRecord::new("b", "bs", "y"),
            LexicalRecord::new("a", "as", "z"),
            LexicalRecord::new("c", "cs", "x"),
        ]);
        let lemmas_before = records.iter().map(|r| r.record.lemma.clone()).unique().count();
        let result = reconcile_pronunciations(records);
        let by_lemma = result
            .iter()
            .map(|r| (r.record.lemma.clone(), r.record.transcription.clone()))
            .unique()
            .collect::<Vec<_>>();
        assert_eq!(by_lemma.len(), lemmas_before);
        assert_eq!(result.len(), 3);
    }
}
