//! The five fixed evaluation criteria and the per-criterion score set.
//!
//! `Score` can only be constructed inside [1, 10], and `PerCriterion` always holds
//! exactly one value per criterion, so an `Evaluation` that exists is a valid one.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Confidence,
    ClarityStructure,
    TechnicalDepth,
    CommunicationSkills,
    Relevance,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Confidence,
        Criterion::ClarityStructure,
        Criterion::TechnicalDepth,
        Criterion::CommunicationSkills,
        Criterion::Relevance,
    ];

    /// Stable key used in the persisted score shape and in the output schema.
    pub fn key(self) -> &'static str {
        match self {
            Criterion::Confidence => "confidence",
            Criterion::ClarityStructure => "clarity_structure",
            Criterion::TechnicalDepth => "technical_depth",
            Criterion::CommunicationSkills => "communication_skills",
            Criterion::Relevance => "relevance",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// What the model is asked to judge for this criterion.
    pub fn rubric(self) -> &'static str {
        match self {
            Criterion::Confidence => {
                "How confident and self-assured does the candidate sound?"
            }
            Criterion::ClarityStructure => {
                "How well-structured and clear is the response? Does it follow the STAR method?"
            }
            Criterion::TechnicalDepth => {
                "How well does the response demonstrate relevant technical or domain knowledge?"
            }
            Criterion::CommunicationSkills => {
                "How effectively does the candidate communicate their ideas?"
            }
            Criterion::Relevance => {
                "How well does the response align with the question and the job requirements?"
            }
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An integer score in [`Score::MIN`, `Score::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 10;

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("score {0} is outside 1..=10")]
pub struct ScoreOutOfRange(pub i64);

impl TryFrom<i64> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(ScoreOutOfRange(value))
        }
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        i64::from(score.0)
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> Self {
        i16::from(score.0)
    }
}

/// Exactly one `T` per criterion. Serializes as an object keyed by criterion name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerCriterion<T> {
    pub confidence: T,
    pub clarity_structure: T,
    pub technical_depth: T,
    pub communication_skills: T,
    pub relevance: T,
}

impl<T> PerCriterion<T> {
    pub fn from_fn(mut f: impl FnMut(Criterion) -> T) -> Self {
        PerCriterion {
            confidence: f(Criterion::Confidence),
            clarity_structure: f(Criterion::ClarityStructure),
            technical_depth: f(Criterion::TechnicalDepth),
            communication_skills: f(Criterion::CommunicationSkills),
            relevance: f(Criterion::Relevance),
        }
    }

    pub fn get(&self, criterion: Criterion) -> &T {
        match criterion {
            Criterion::Confidence => &self.confidence,
            Criterion::ClarityStructure => &self.clarity_structure,
            Criterion::TechnicalDepth => &self.technical_depth,
            Criterion::CommunicationSkills => &self.communication_skills,
            Criterion::Relevance => &self.relevance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, &T)> {
        Criterion::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl<T> PerCriterion<Option<T>> {
    /// `Some` only when every criterion has a value.
    pub fn transpose(self) -> Option<PerCriterion<T>> {
        Some(PerCriterion {
            confidence: self.confidence?,
            clarity_structure: self.clarity_structure?,
            technical_depth: self.technical_depth?,
            communication_skills: self.communication_skills?,
            relevance: self.relevance?,
        })
    }
}

pub type Scores = PerCriterion<Score>;
pub type Feedback = PerCriterion<String>;

/// A complete, validated evaluation of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub scores: Scores,
    pub feedback: Feedback,
    pub overall_comment: Option<String>,
}
