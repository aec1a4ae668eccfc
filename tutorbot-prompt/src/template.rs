use std::collections::{BTreeSet, HashMap};

use regex::Regex;
use tutorbot_core::{TutorError, Value};

const VARIABLE_PATTERN: &str = r"\{\{\s*(\w+)\s*\}\}";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Names of the `{{var}}` placeholders, sorted and deduplicated.
    pub fn variables(&self) -> Result<BTreeSet<String>, TutorError> {
        let pattern =
            Regex::new(VARIABLE_PATTERN).map_err(|e| TutorError::InvalidConfig(e.to_string()))?;
        Ok(pattern
            .captures_iter(&self.template)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    /// Strings are inserted verbatim, other values as compact JSON.
    /// A placeholder without a matching variable is an error.
    pub fn render(&self, vars: &HashMap<String, Value>) -> Result<String, TutorError> {
        let pattern =
            Regex::new(VARIABLE_PATTERN).map_err(|e| TutorError::InvalidConfig(e.to_string()))?;

        if let Some(missing) = self
            .variables()?
            .into_iter()
            .find(|name| !vars.contains_key(name))
        {
            return Err(TutorError::InvalidConfig(format!(
                "missing prompt variable '{missing}'"
            )));
        }

        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            match vars.get(&caps[1]) {
                Some(value) => value
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| value.to_string()),
                None => String::new(),
            }
        });
        Ok(rendered.to_string())
    }
}
