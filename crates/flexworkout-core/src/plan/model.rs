use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};

/// One timed exercise as authored in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Duration in seconds.
    pub duration: u64,
}

impl Step {
    pub fn new(name: impl Into<String>, desc: impl Into<String>, duration: u64) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            duration,
        }
    }
}

/// A named group of steps, optionally repeated for several rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub tips: String,
    #[serde(default)]
    pub allow_rounds: bool,
    #[serde(default = "default_rounds")]
    pub default_rounds: u32,
    #[serde(default = "default_rounds")]
    pub max_rounds: u32,
    pub steps: Vec<Step>,
}

fn default_rounds() -> u32 {
    1
}

impl Section {
    /// Rounds to play for this section given an optional user override.
    ///
    /// Sections that do not allow rounds always play exactly once.
    pub fn effective_rounds(&self, configured: Option<u32>) -> u32 {
        if self.allow_rounds {
            configured.unwrap_or(self.default_rounds)
        } else {
            1
        }
    }

    /// Sum of the section's step durations for a single round.
    pub fn round_duration(&self) -> u64 {
        self.steps.iter().map(|s| s.duration).sum()
    }
}

/// Ordered list of sections. Order defines traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub sections: Vec<Section>,
}

impl Plan {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.steps.is_empty())
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Parse a plan from JSON (an array of sections) and validate it.
    /// A surrounding ```` ```json ```` or ```` ``` ```` fence is ignored.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the plan breaks a shape rule.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let plan: Plan = serde_json::from_str(strip_code_fence(json))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check the shape rules a plan source must satisfy before handing a
    /// plan to the engines.
    ///
    /// # Errors
    /// Returns the first rule violation found, walking sections in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sections.is_empty() {
            return Err(ValidationError::EmptyCollection("plan sections".into()));
        }
        for (si, section) in self.sections.iter().enumerate() {
            if section.name.trim().is_empty() {
                return Err(ValidationError::MissingName(format!("section #{}", si + 1)));
            }
            if section.steps.is_empty() {
                return Err(ValidationError::EmptyCollection(format!(
                    "steps of section '{}'",
                    section.name
                )));
            }
            if section.default_rounds < 1 || section.default_rounds > section.max_rounds {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.defaultRounds", section.name),
                    message: format!(
                        "must be between 1 and maxRounds ({}), got {}",
                        section.max_rounds, section.default_rounds
                    ),
                });
            }
            for (i, step) in section.steps.iter().enumerate() {
                if step.name.trim().is_empty() {
                    return Err(ValidationError::MissingName(format!(
                        "step #{} of section '{}'",
                        i + 1,
                        section.name
                    )));
                }
                if step.duration < 1 {
                    return Err(ValidationError::InvalidValue {
                        field: format!("{}.{}.duration", section.name, step.name),
                        message: "must be at least 1 second".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Drop a markdown code fence around pasted JSON.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, allow: bool, default: u32, max: u32) -> Section {
        Section {
            name: name.into(),
            tips: String::new(),
            allow_rounds: allow,
            default_rounds: default,
            max_rounds: max,
            steps: vec![Step::new("a", "", 10)],
        }
    }

    #[test]
    fn effective_rounds_ignores_override_when_rounds_disallowed() {
        let s = section("warm", false, 3, 3);
        assert_eq!(s.effective_rounds(Some(2)), 1);
        assert_eq!(s.effective_rounds(None), 1);
    }

    #[test]
    fn effective_rounds_prefers_override() {
        let s = section("strength", true, 2, 4);
        assert_eq!(s.effective_rounds(None), 2);
        assert_eq!(s.effective_rounds(Some(4)), 4);
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"[{"name":"Warm-up","tips":"easy","allowRounds":true,
            "defaultRounds":2,"maxRounds":3,
            "steps":[{"name":"Neck circles","desc":"slow","duration":60}]}]"#;
        let plan: Plan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.sections.len(), 1);
        assert!(plan.sections[0].allow_rounds);
        assert_eq!(plan.sections[0].steps[0].duration, 60);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn validate_rejects_rounds_above_max() {
        let plan = Plan::new(vec![section("s", true, 3, 2)]);
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_duration_and_blank_names() {
        let mut s = section("s", false, 1, 1);
        s.steps[0].duration = 0;
        assert!(Plan::new(vec![s]).validate().is_err());

        let blank = section("  ", false, 1, 1);
        assert_eq!(
            Plan::new(vec![blank]).validate(),
            Err(ValidationError::MissingName("section #1".into()))
        );
        assert!(Plan::default().validate().is_err());
    }

    #[test]
    fn from_json_accepts_fenced_json() {
        let body = r#"[{"name":"A","steps":[{"name":"x","duration":5}]}]"#;
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(Plan::from_json(&fenced).unwrap().sections[0].name, "A");
        let bare = format!("  ```\n{body}\n```");
        assert_eq!(Plan::from_json(&bare).unwrap().sections[0].steps[0].duration, 5);
        assert_eq!(strip_code_fence(body), body);
        assert!(Plan::from_json("```json\n[{\n```").is_err());
    }

    #[test]
    fn from_json_rejects_malformed_and_invalid_plans() {
        assert!(matches!(Plan::from_json("[{"), Err(CoreError::Json(_))));
        assert!(matches!(
            Plan::from_json("[]"),
            Err(CoreError::Validation(ValidationError::EmptyCollection(_)))
        ));
        let plan = Plan::from_json(r#"[{"name":"A","steps":[{"name":"x","duration":5}]}]"#)
            .unwrap();
        assert_eq!(plan.sections[0].default_rounds, 1);
    }
}
