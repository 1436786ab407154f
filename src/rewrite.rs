use crate::raw_data::NEUTRALIZATION;
use crate::table::FeatureTable;
use crate::PlurGenError::Configuration;
use crate::PlurGenResult;
use log::debug;

pub struct RewriteRuleCollection {
    rules: Vec<FinalRewriteRule>,
}

impl RewriteRuleCollection {
    pub fn try_parse(input: &str) -> PlurGenResult<Self> {
        let rules = input
            .split('\n')
            .flat_map(|s| s.split(';'))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(FinalRewriteRule::try_parse)
            .collect::<PlurGenResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Word-final obstruent neutralization.
    pub fn neutralization() -> PlurGenResult<Self> {
        Self::try_parse(NEUTRALIZATION)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the first matching rule only.
    pub fn apply_to_str(&self, input: &str) -> String {
        self.rules
            .iter()
            .find(|r| r.matches(input))
            .map(|r| r.apply_to_str(input))
            .unwrap_or_else(|| input.to_string())
    }

    /// Rewrites the final slot of every row in place. Returns the number of changed slots.
    pub fn apply_to_table(&self, table: &mut FeatureTable) -> usize {
        let mut changed = 0;
        for coda in table.final_codas_mut() {
            let rewritten = self.apply_to_str(coda);
            if rewritten != *coda {
                *coda = rewritten;
                changed += 1;
            }
        }
        debug!("Neutralized {} final slots", changed);
        changed
    }
}

/// Replaces the last character of a slot when it belongs to `from`.
pub struct FinalRewriteRule {
    pub from: Vec<char>,
    pub to: char,
}

impl FinalRewriteRule {
    pub fn try_parse(input: &str) -> PlurGenResult<Self> {
        let split = input.split('|').collect::<Vec<_>>();
        if split.len() != 2 || split[0].is_empty() {
            return Err(Configuration(format!("Invalid rewrite rule {:?}", input)));
        }
        let mut to = split[1].chars();
        let to = match (to.next(), to.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(Configuration(format!(
                    "Rewrite target {:?} must be a single character",
                    split[1]
                )))
            }
        };
        Ok(Self {
            from: split[0].chars().collect(),
            to,
        })
    }

    pub fn matches(&self, input: &str) -> bool {
        input
            .chars()
            .last()
            .map(|c| self.from.contains(&c))
            .unwrap_or(false)
    }

    pub fn apply_to_str(&self, input: &str) -> String {
        if !self.matches(input) {
            return input.to_string();
        }
        let mut chars = input.chars();
        chars.next_back();
        let mut result = chars.as_str().to_string();
        result.push(self.to);
        result
    }
}
