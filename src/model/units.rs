//! Scorable Units
//!
//! Sentiment cells (concern level x perception category) and capability
//! constructs (dimension x construct index).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimulationError;

pub const LEVEL_COUNT: u8 = 5;
pub const CATEGORY_COUNT: u8 = 5;
pub const SENTIMENT_CELL_COUNT: usize = (LEVEL_COUNT as usize) * (CATEGORY_COUNT as usize);

pub const DIMENSION_COUNT: u8 = 8;
pub const CONSTRUCTS_PER_DIMENSION: u8 = 4;
pub const CONSTRUCT_COUNT: usize = (DIMENSION_COUNT as usize) * (CONSTRUCTS_PER_DIMENSION as usize);

/// What is at stake for the respondent, indexed 1..=5
pub const CONCERN_LEVEL_NAMES: [&str; 5] = [
    "Personal Workflow",
    "Collaboration",
    "Professional Trust",
    "Career Security",
    "Organizational Stability",
];

/// Why AI is viewed with resistance, indexed 1..=5
pub const PERCEPTION_CATEGORY_NAMES: [&str; 5] = [
    "Too Autonomous",
    "Too Inflexible",
    "Emotionless",
    "Too Opaque",
    "Prefer Human",
];

/// One (concern level, perception category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SentimentCell {
    level: u8,
    category: u8,
}

impl SentimentCell {
    pub fn new(level: u8, category: u8) -> Result<Self, SimulationError> {
        if !(1..=LEVEL_COUNT).contains(&level) {
            return Err(SimulationError::invalid_input(format!(
                "concern level {} outside 1..={}",
                level, LEVEL_COUNT
            )));
        }
        if !(1..=CATEGORY_COUNT).contains(&category) {
            return Err(SimulationError::invalid_input(format!(
                "perception category {} outside 1..={}",
                category, CATEGORY_COUNT
            )));
        }
        Ok(Self { level, category })
    }

    /// All 25 cells, level-major
    pub fn all() -> impl Iterator<Item = SentimentCell> {
        (1..=LEVEL_COUNT).flat_map(|level| (1..=CATEGORY_COUNT).map(move |category| SentimentCell { level, category }))
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn category(&self) -> u8 {
        self.category
    }

    /// Position in a level-major score array
    pub fn index(&self) -> usize {
        (self.level as usize - 1) * CATEGORY_COUNT as usize + (self.category as usize - 1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= SENTIMENT_CELL_COUNT {
            return None;
        }
        Some(Self {
            level: (index / CATEGORY_COUNT as usize) as u8 + 1,
            category: (index % CATEGORY_COUNT as usize) as u8 + 1,
        })
    }

    /// Legacy storage column (`sentiment_1` ..= `sentiment_25`)
    pub fn column_name(&self) -> String {
        format!("sentiment_{}", self.index() + 1)
    }

    pub fn level_name(&self) -> &'static str {
        CONCERN_LEVEL_NAMES[self.level as usize - 1]
    }

    pub fn category_name(&self) -> &'static str {
        PERCEPTION_CATEGORY_NAMES[self.category as usize - 1]
    }

    /// Accepts `L{level}_C{category}` or the legacy `sentiment_{n}` form
    pub fn parse(s: &str) -> Result<Self, SimulationError> {
        let s = s.trim();
        if let Some(n) = s.strip_prefix("sentiment_") {
            let n: usize = n
                .parse()
                .map_err(|_| SimulationError::invalid_input(format!("bad sentiment column '{}'", s)))?;
            return n
                .checked_sub(1)
                .and_then(Self::from_index)
                .ok_or_else(|| SimulationError::invalid_input(format!("sentiment column '{}' out of range", s)));
        }

        let (level, category) = s
            .strip_prefix('L')
            .and_then(|rest| rest.split_once("_C"))
            .ok_or_else(|| SimulationError::invalid_input(format!("bad sentiment cell id '{}'", s)))?;
        let level = level
            .parse()
            .map_err(|_| SimulationError::invalid_input(format!("bad concern level in '{}'", s)))?;
        let category = category
            .parse()
            .map_err(|_| SimulationError::invalid_input(format!("bad perception category in '{}'", s)))?;
        Self::new(level, category)
    }
}

impl fmt::Display for SentimentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}_C{}", self.level, self.category)
    }
}

impl FromStr for SentimentCell {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SentimentCell {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SentimentCell> for String {
    fn from(cell: SentimentCell) -> Self {
        cell.to_string()
    }
}

/// Organizational-maturity axis, 1..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CapabilityDimension {
    StrategyVision = 1,
    Data = 2,
    Technology = 3,
    TalentSkills = 4,
    OrganizationProcesses = 5,
    Innovation = 6,
    Adaptation = 7,
    Ethics = 8,
}

impl CapabilityDimension {
    pub const ALL: [CapabilityDimension; 8] = [
        CapabilityDimension::StrategyVision,
        CapabilityDimension::Data,
        CapabilityDimension::Technology,
        CapabilityDimension::TalentSkills,
        CapabilityDimension::OrganizationProcesses,
        CapabilityDimension::Innovation,
        CapabilityDimension::Adaptation,
        CapabilityDimension::Ethics,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get((id as usize).checked_sub(1)?).copied()
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            CapabilityDimension::StrategyVision => "Strategy & Vision",
            CapabilityDimension::Data => "Data Maturity",
            CapabilityDimension::Technology => "Technology Infrastructure",
            CapabilityDimension::TalentSkills => "Talent & Skills",
            CapabilityDimension::OrganizationProcesses => "Organization & Processes",
            CapabilityDimension::Innovation => "Innovation Capability",
            CapabilityDimension::Adaptation => "Adaptation & Adoption",
            CapabilityDimension::Ethics => "Ethics & Responsibility",
        }
    }

    /// The four constructs under this dimension
    pub fn constructs(&self) -> impl Iterator<Item = ConstructId> {
        let dimension = *self;
        (1..=CONSTRUCTS_PER_DIMENSION).map(move |index| ConstructId { dimension, index })
    }
}

impl TryFrom<u8> for CapabilityDimension {
    type Error = SimulationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_id(value).ok_or_else(|| {
            SimulationError::invalid_input(format!("capability dimension {} outside 1..={}", value, DIMENSION_COUNT))
        })
    }
}

impl From<CapabilityDimension> for u8 {
    fn from(dimension: CapabilityDimension) -> Self {
        dimension.id()
    }
}

impl fmt::Display for CapabilityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One measurable sub-component of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstructId {
    dimension: CapabilityDimension,
    index: u8,
}

impl ConstructId {
    pub fn new(dimension: CapabilityDimension, index: u8) -> Result<Self, SimulationError> {
        if !(1..=CONSTRUCTS_PER_DIMENSION).contains(&index) {
            return Err(SimulationError::invalid_input(format!(
                "construct index {} outside 1..={}",
                index, CONSTRUCTS_PER_DIMENSION
            )));
        }
        Ok(Self { dimension, index })
    }

    pub fn all() -> impl Iterator<Item = ConstructId> {
        CapabilityDimension::ALL.into_iter().flat_map(|d| d.constructs())
    }

    pub fn dimension(&self) -> CapabilityDimension {
        self.dimension
    }

    pub fn construct_index(&self) -> u8 {
        self.index
    }

    /// Position in a dimension-major score array
    pub fn index(&self) -> usize {
        (self.dimension.id() as usize - 1) * CONSTRUCTS_PER_DIMENSION as usize + (self.index as usize - 1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CONSTRUCT_COUNT {
            return None;
        }
        let dimension = CapabilityDimension::from_id((index / CONSTRUCTS_PER_DIMENSION as usize) as u8 + 1)?;
        Some(Self {
            dimension,
            index: (index % CONSTRUCTS_PER_DIMENSION as usize) as u8 + 1,
        })
    }

    /// Parses `dim{d}_construct{i}`
    pub fn parse(s: &str) -> Result<Self, SimulationError> {
        let s = s.trim();
        let (dim, idx) = s
            .strip_prefix("dim")
            .and_then(|rest| rest.split_once("_construct"))
            .ok_or_else(|| SimulationError::invalid_input(format!("bad construct id '{}'", s)))?;
        let dim: u8 = dim
            .parse()
            .map_err(|_| SimulationError::invalid_input(format!("bad dimension in '{}'", s)))?;
        let idx: u8 = idx
            .parse()
            .map_err(|_| SimulationError::invalid_input(format!("bad construct index in '{}'", s)))?;
        Self::new(CapabilityDimension::try_from(dim)?, idx)
    }
}

impl fmt::Display for ConstructId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dim{}_construct{}", self.dimension.id(), self.index)
    }
}

impl FromStr for ConstructId {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
