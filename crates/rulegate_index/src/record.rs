//! Raw rule records as delivered by the rule authoring pipeline.
//!
//! Records carry levels and effects as text. Conversion to a [`Rule`] is where
//! malformed input is caught and reported.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use rulegate_foundation::{Effect, Error, HierarchyLevel, IndexKey, Result, RuleId};

use crate::rule::{Qualifier, Rule};

/// One qualifying ancestor in a [`RuleRecord`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualifierRecord {
    /// Level name or depth.
    pub level: String,
    /// Node id at that level.
    pub id: String,
}

/// Structured rule record, already parsed from the rule language.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleRecord {
    /// Rule id.
    pub id: String,
    /// `"allow"` or `"block"`.
    pub effect: String,
    /// Level name (`"sport"`, ...) or depth (`"0"`..`"3"`).
    pub level: String,
    /// Target node id.
    pub target: String,
    /// Optional qualifying ancestors.
    #[cfg_attr(feature = "serde", serde(default))]
    pub qualifier: Vec<QualifierRecord>,
}

impl RuleRecord {
    /// Creates an unqualified record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        effect: impl Into<String>,
        level: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            effect: effect.into(),
            level: level.into(),
            target: target.into(),
            qualifier: Vec::new(),
        }
    }

    /// Adds a qualifying ancestor.
    #[must_use]
    pub fn under(mut self, level: impl Into<String>, id: impl Into<String>) -> Self {
        self.qualifier.push(QualifierRecord {
            level: level.into(),
            id: id.into(),
        });
        self
    }

    /// Converts the record into a validated rule.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRule` if the effect or a level is unknown, or if the
    /// resulting rule fails [`Rule::validate`].
    pub fn to_rule(&self) -> Result<Rule> {
        let rule_id = (!self.id.trim().is_empty()).then(|| RuleId::new(&self.id));
        let malformed = |reason: String| Error::malformed_rule(rule_id.clone(), reason);

        let effect: Effect = self.effect.parse().map_err(malformed)?;
        let level: HierarchyLevel = self
            .level
            .parse()
            .map_err(|e| malformed(format!("target {e}")))?;

        let mut qualifier = Qualifier::none();
        for q in &self.qualifier {
            let q_level: HierarchyLevel = q
                .level
                .parse()
                .map_err(|e| malformed(format!("qualifier {e}")))?;
            qualifier = qualifier.with(IndexKey::new(q_level, q.id.as_str()));
        }

        let rule = Rule::new(self.id.as_str(), effect, IndexKey::new(level, self.target.as_str()))
            .with_qualifier(qualifier);
        rule.validate()?;
        Ok(rule)
    }
}

impl TryFrom<&RuleRecord> for Rule {
    type Error = Error;

    fn try_from(record: &RuleRecord) -> Result<Self> {
        record.to_rule()
    }
}
