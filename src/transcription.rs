use crate::raw_data::{EMPTY_SLOT, STRESSED, STRESS_MARKER, SYLLABLE_DELIMITER, UNSTRESSED};
use crate::sounds::Alphabet;
use crate::{PlurGenError, PlurGenResult};
use log::debug;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Stress {
    Stressed,
    #[default]
    Unstressed,
}

impl Stress {
    pub fn token(&self) -> &'static str {
        match self {
            Stress::Stressed => STRESSED,
            Stress::Unstressed => UNSTRESSED,
        }
    }
}

impl Display for Stress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    pub(crate) stress: Stress,
    pub(crate) onset: Option<String>,
    pub(crate) nucleus: char,
    pub(crate) coda: Option<String>,
}

impl Syllable {
    /// Splits a single syllable into onset, nucleus and coda.
    /// On failure returns the number of vowel symbols found.
    pub fn parse(syllable: &str, alphabet: &Alphabet) -> Result<Self, usize> {
        let stress = if syllable.contains(STRESS_MARKER) {
            Stress::Stressed
        } else {
            Stress::Unstressed
        };
        let body = syllable.strip_prefix(STRESS_MARKER).unwrap_or(syllable);

        // Split on vowels, keeping each vowel as its own part.
        let mut parts: SmallVec<[String; 3]> = SmallVec::new();
        let mut buf = String::new();
        for c in body.chars() {
            if alphabet.is_vowel(c) {
                if !buf.is_empty() {
                    parts.push(std::mem::take(&mut buf));
                }
                parts.push(c.to_string());
            } else {
                buf.push(c);
            }
        }
        if !buf.is_empty() {
            parts.push(buf);
        }

        let vowels = parts
            .iter()
            .filter(|p| p.chars().count() == 1 && p.chars().all(|c| alphabet.is_vowel(c)))
            .count();
        if vowels != 1 {
            return Err(vowels);
        }
        let (onset, nucleus, coda) = match parts.as_slice() {
            [v] => (None, v, None),
            [o, v] if o.chars().all(|c| !alphabet.is_vowel(c)) => (Some(o.clone()), v, None),
            [v, c] => (None, v, Some(c.clone())),
            [o, v, c] => (Some(o.clone()), v, Some(c.clone())),
            _ => return Err(vowels),
        };
        let nucleus = nucleus.chars().next().ok_or(vowels)?;
        Ok(Self {
            stress,
            onset,
            nucleus,
            coda,
        })
    }

    pub fn stress(&self) -> Stress {
        self.stress
    }

    /// Onset, nucleus and coda tokens, with empty slots filled by the placeholder.
    pub fn slots(&self) -> [String; 3] {
        [
            self.onset.clone().unwrap_or_else(|| EMPTY_SLOT.to_string()),
            self.nucleus.to_string(),
            self.coda.clone().unwrap_or_else(|| EMPTY_SLOT.to_string()),
        ]
    }
}

impl Display for Syllable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.stress == Stress::Stressed {
                STRESS_MARKER.to_string()
            } else {
                String::new()
            },
            self.onset.as_deref().unwrap_or_default(),
            self.nucleus,
            self.coda.as_deref().unwrap_or_default()
        )
    }
}

/// A decoded transcription. Derived data: one stress marker and three slots per syllable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    pub(crate) syllables: SmallVec<[Syllable; 4]>,
}

impl Decoded {
    pub fn syllable_count(&self) -> usize {
        self.syllables.len()
    }

    pub fn syllables(&self) -> &[Syllable] {
        &self.syllables
    }

    pub fn stress_vector(&self) -> Vec<Stress> {
        self.syllables.iter().map(|s| s.stress).collect()
    }

    pub fn feature_vector(&self) -> Vec<String> {
        self.syllables.iter().flat_map(|s| s.slots()).collect()
    }
}

pub fn decode_transcription(transcription: &str, alphabet: &Alphabet) -> PlurGenResult<Decoded> {
    let mut syllables = SmallVec::new();
    for syllable in transcription.split(SYLLABLE_DELIMITER) {
        let parsed = Syllable::parse(syllable, alphabet).map_err(|vowels| {
            PlurGenError::TranscriptionFormat {
                transcription: transcription.to_string(),
                syllable: syllable.to_string(),
                vowels,
            }
        })?;
        syllables.push(parsed);
    }
    Ok(Decoded { syllables })
}

/// Decodes transcriptions, computing each distinct string only once.
#[derive(Debug, Clone)]
pub struct Decoder {
    alphabet: Alphabet,
    cache: HashMap<String, Decoded>,
}

impl Decoder {
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            cache: HashMap::new(),
        }
    }

    pub fn decode(&mut self, transcription: &str) -> PlurGenResult<&Decoded> {
        if !self.cache.contains_key(transcription) {
            let decoded = decode_transcription(transcription, &self.alphabet)?;
            debug!(
                "Decoded {:?} into {} syllables",
                transcription,
                decoded.syllable_count()
            );
            self.cache.insert(transcription.to_string(), decoded);
        }
        Ok(&self.cache[transcription])
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn into_cache(self) -> HashMap<String, Decoded> {
        self.cache
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(Alphabet::disc().unwrap())
    }

    #[test]
    fn t_bakter() {
        let mut decoder = decoder();
        let decoded = decoder.decode("'bak-t@r").unwrap();
        assert_eq!(
            decoded.stress_vector(),
            vec![Stress::Stressed, Stress::Unstressed]
        );
        assert_eq!(decoded.syllables[0].slots(), ["b", "a", "k"]);
        assert_eq!(decoded.syllables[1].slots(), ["t", "@", "r"]);
        assert_eq!(
            decoded.feature_vector(),
            vec!["b", "a", "k", "t", "@", "r"]
        );
    }

    #[test]
    fn t_empty_slots() {
        let mut decoder = decoder();
        let decoded = decoder.decode("a-'Ei").unwrap_err();
        // "Ei" holds two vowel symbols in DISC.
        assert!(matches!(
            decoded,
            PlurGenError::TranscriptionFormat { vowels: 2, .. }
        ));
        let decoded = decoder.decode("a-'K").unwrap();
        assert_eq!(decoded.feature_vector(), vec!["=", "a", "=", "=", "K", "="]);
        assert_eq!(
            decoded.stress_vector(),
            vec![Stress::Unstressed, Stress::Stressed]
        );
    }

    #[test]
    fn t_clusters() {
        let decoded = decode_transcription("'strOmp", &Alphabet::disc().unwrap()).unwrap();
        assert_eq!(decoded.feature_vector(), vec!["str", "O", "mp"]);
        assert_eq!(decoded.syllables[0].to_string(), "'strOmp");
    }

    #[test]
    fn t_no_vowel() {
        let err = decode_transcription("'bk-t@r", &Alphabet::disc().unwrap()).unwrap_err();
        match err {
            PlurGenError::TranscriptionFormat {
                syllable, vowels, ..
            } => {
                assert_eq!(syllable, "'bk");
                assert_eq!(vowels, 0);
            }
            e => panic!("unexpected error {}", e),
        }
        assert!(decode_transcription("", &Alphabet::disc().unwrap()).is_err());
    }

    #[test]
    fn t_memoized() {
        let mut decoder = decoder();
        let first = decoder.decode("'kAt").unwrap().clone();
        let second = decoder.decode("'kAt").unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(decoder.cached_len(), 1);
        decoder.decode("'kA-t@").unwrap();
        assert_eq!(decoder.cached_len(), 2);
    }

    #[test]
    fn t_three_slots_per_syllable() {
        let mut decoder = decoder();
        for t in ["'bak-t@r", "a", "'strOmp", "@-'lK-f@nt", "'o-p@-ra"] {
            let d = decoder.decode(t).unwrap();
            assert_eq!(d.feature_vector().len(), 3 * d.stress_vector().len());
        }
    }
}
