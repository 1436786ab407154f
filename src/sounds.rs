use crate::raw_data;
use crate::PlurGenError::InputFormat;
use crate::PlurGenResult;
use std::collections::{HashMap, HashSet};
use std::io;

pub fn parse_csv_to_map<R: io::Read>(reader: R) -> PlurGenResult<Vec<HashMap<String, String>>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = vec![];
    let headers = rdr.headers()?.clone();
    for result in rdr.records() {
        let record = result?;
        let mut map = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            map.insert(header.to_string(), value.to_string());
        }
        records.push(map);
    }
    Ok(records)
}

/// Closed set of single-character vowel symbols.
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    vowels: HashSet<char>,
}

impl Alphabet {
    pub fn disc() -> PlurGenResult<Self> {
        parse_alphabet(raw_data::VOWELS.as_bytes())
    }

    pub fn is_vowel(&self, c: char) -> bool {
        self.vowels.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.vowels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vowels.is_empty()
    }
}

pub fn parse_alphabet<R: io::Read>(input: R) -> PlurGenResult<Alphabet> {
    let records = parse_csv_to_map(input)?;
    let mut vowels = HashSet::new();
    for r in records {
        let symbol = r
            .get("symbol")
            .ok_or(InputFormat("No symbol defined".to_string()))?;
        let mut chars = symbol.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(InputFormat(format!(
                    "Vowel symbol {:?} is not a single character",
                    symbol
                )))
            }
        };
        if !vowels.insert(c) {
            return Err(InputFormat(format!("Vowel symbol {:?} is listed twice", c)));
        }
    }
    Ok(Alphabet { vowels })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn t_disc_alphabet() {
        let alphabet = Alphabet::disc().unwrap();
        assert_eq!(alphabet.len(), 22);
        for v in "i!auy()*<e|oKLMIE{AO}@".chars() {
            assert!(alphabet.is_vowel(v), "{} should be a vowel", v);
        }
        for c in "bdtkpxGfsz=-'".chars() {
            assert!(!alphabet.is_vowel(c));
        }
    }

    #[test]
    fn t_bad_alphabet() {
        let input = "symbol\nab\n";
        assert!(matches!(
            parse_alphabet(input.as_bytes()),
            Err(crate::PlurGenError::InputFormat(_))
        ));
        let input = "symbol\na\na\n";
        assert!(parse_alphabet(input.as_bytes()).is_err());
    }
}
