use crate::utils::error::{EventflowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 計時來源發出的整數
pub type Tick = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SubscriptionMode {
    /// Every subscription starts its own producer.
    #[default]
    Independent,
    /// One producer feeds a relay shared by all subscribers.
    Shared,
}

impl fmt::Display for SubscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionMode::Independent => write!(f, "independent"),
            SubscriptionMode::Shared => write!(f, "shared"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateSpec {
    Even,
    Odd,
    Positive,
    GreaterThan(i64),
    LessThan(i64),
    MultipleOf(i64),
}

impl PredicateSpec {
    pub fn test(&self, value: &Tick) -> bool {
        match *self {
            PredicateSpec::Even => value % 2 == 0,
            PredicateSpec::Odd => value % 2 != 0,
            PredicateSpec::Positive => *value > 0,
            PredicateSpec::GreaterThan(n) => *value > n,
            PredicateSpec::LessThan(n) => *value < n,
            // multiple_of(0) 只接受 0
            PredicateSpec::MultipleOf(0) => *value == 0,
            PredicateSpec::MultipleOf(n) => value.wrapping_rem(n) == 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpec {
    Identity,
    Square,
    Double,
    Negate,
    Add(i64),
    Multiply(i64),
}

impl TransformSpec {
    pub fn apply(&self, value: Tick) -> Tick {
        match *self {
            TransformSpec::Identity => value,
            TransformSpec::Square => value.wrapping_mul(value),
            TransformSpec::Double => value.wrapping_mul(2),
            TransformSpec::Negate => value.wrapping_neg(),
            TransformSpec::Add(n) => value.wrapping_add(n),
            TransformSpec::Multiply(n) => value.wrapping_mul(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldSpec {
    Add,
    Multiply,
    Max,
    Min,
}

impl FoldSpec {
    pub fn combine(&self, acc: Tick, value: Tick) -> Tick {
        match self {
            FoldSpec::Add => acc.wrapping_add(value),
            FoldSpec::Multiply => acc.wrapping_mul(value),
            FoldSpec::Max => acc.max(value),
            FoldSpec::Min => acc.min(value),
        }
    }

    /// Seed used when none is given.
    pub fn identity(&self) -> Tick {
        match self {
            FoldSpec::Add => 0,
            FoldSpec::Multiply => 1,
            FoldSpec::Max => Tick::MIN,
            FoldSpec::Min => Tick::MAX,
        }
    }
}

/// Serializable description of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageSpec {
    Take { count: u64 },
    Filter { predicate: PredicateSpec },
    Map { transform: TransformSpec },
    Scan { seed: Tick, fold: FoldSpec },
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageSpec::Take { count } => write!(f, "take({})", count),
            StageSpec::Filter { predicate } => write!(f, "filter({:?})", predicate),
            StageSpec::Map { transform } => write!(f, "map({:?})", transform),
            StageSpec::Scan { seed, fold } => write!(f, "scan({:?}, {})", fold, seed),
        }
    }
}

fn parse_number(input: &str, raw: Option<&str>) -> Result<i64> {
    let raw = raw.ok_or_else(|| EventflowError::StageParseError {
        input: input.to_string(),
        reason: "missing numeric argument".to_string(),
    })?;
    raw.trim()
        .parse::<i64>()
        .map_err(|e| EventflowError::StageParseError {
            input: input.to_string(),
            reason: format!("'{}' is not an integer: {}", raw, e),
        })
}

/// 命令列的精簡寫法：`take:10`、`filter:even`、`filter:gt:5`、`map:add:3`、`scan:add:0`
impl FromStr for StageSpec {
    type Err = EventflowError;

    fn from_str(input: &str) -> Result<Self> {
        let mut parts = input.split(':');
        let op = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let name = parts.next().map(|s| s.trim().to_ascii_lowercase());
        let arg = parts.next();

        let unknown = |what: &str, value: &str| EventflowError::StageParseError {
            input: input.to_string(),
            reason: format!("unknown {} '{}'", what, value),
        };

        let spec = match op.as_str() {
            "take" => {
                let count = parse_number(input, name.as_deref())?;
                if count < 0 {
                    return Err(EventflowError::StageParseError {
                        input: input.to_string(),
                        reason: "take count cannot be negative".to_string(),
                    });
                }
                StageSpec::Take {
                    count: count as u64,
                }
            }
            "filter" => {
                let name = name.unwrap_or_default();
                let predicate = match name.as_str() {
                    "even" => PredicateSpec::Even,
                    "odd" => PredicateSpec::Odd,
                    "positive" => PredicateSpec::Positive,
                    "gt" => PredicateSpec::GreaterThan(parse_number(input, arg)?),
                    "lt" => PredicateSpec::LessThan(parse_number(input, arg)?),
                    "mod" => PredicateSpec::MultipleOf(parse_number(input, arg)?),
                    other => return Err(unknown("predicate", other)),
                };
                StageSpec::Filter { predicate }
            }
            "map" => {
                let name = name.unwrap_or_default();
                let transform = match name.as_str() {
                    "identity" => TransformSpec::Identity,
                    "square" => TransformSpec::Square,
                    "double" => TransformSpec::Double,
                    "negate" => TransformSpec::Negate,
                    "add" => TransformSpec::Add(parse_number(input, arg)?),
                    "mul" => TransformSpec::Multiply(parse_number(input, arg)?),
                    other => return Err(unknown("transform", other)),
                };
                StageSpec::Map { transform }
            }
            "scan" => {
                let name = name.unwrap_or_default();
                let fold = match name.as_str() {
                    "add" => FoldSpec::Add,
                    "mul" => FoldSpec::Multiply,
                    "max" => FoldSpec::Max,
                    "min" => FoldSpec::Min,
                    other => return Err(unknown("fold", other)),
                };
                let seed = match arg {
                    Some(_) => parse_number(input, arg)?,
                    None => fold.identity(),
                };
                StageSpec::Scan { seed, fold }
            }
            other => return Err(unknown("stage", other)),
        };

        let takes_arg = matches!(
            spec,
            StageSpec::Filter {
                predicate: PredicateSpec::GreaterThan(_)
                    | PredicateSpec::LessThan(_)
                    | PredicateSpec::MultipleOf(_)
            } | StageSpec::Map {
                transform: TransformSpec::Add(_) | TransformSpec::Multiply(_)
            } | StageSpec::Scan { .. }
        );

        if (arg.is_some() && !takes_arg) || parts.next().is_some() {
            return Err(EventflowError::StageParseError {
                input: input.to_string(),
                reason: "too many ':' separated parts".to_string(),
            });
        }

        Ok(spec)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberSpec {
    pub name: String,
    #[serde(default)]
    pub join_after_ticks: u64,
    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

impl SubscriberSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            join_after_ticks: 0,
            stages: Vec::new(),
        }
    }

    pub fn joining_after(mut self, ticks: u64) -> Self {
        self.join_after_ticks = ticks;
        self
    }

    pub fn with_stages(mut self, stages: Vec<StageSpec>) -> Self {
        self.stages = stages;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberReport {
    pub name: String,
    pub join_after_ticks: u64,
    pub values: Vec<Tick>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub mode: SubscriptionMode,
    pub interval_ms: u64,
    pub subscribers: Vec<SubscriberReport>,
}

impl ScenarioReport {
    pub fn subscriber(&self, name: &str) -> Option<&SubscriberReport> {
        self.subscribers.iter().find(|s| s.name == name)
    }

    pub fn all_completed(&self) -> bool {
        self.subscribers.iter().all(|s| s.completed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_stages() {
        assert_eq!(
            "take:10".parse::<StageSpec>().unwrap(),
            StageSpec::Take { count: 10 }
        );
        assert_eq!(
            "filter:even".parse::<StageSpec>().unwrap(),
            StageSpec::Filter {
                predicate: PredicateSpec::Even
            }
        );
        assert_eq!(
            "filter:gt:5".parse::<StageSpec>().unwrap(),
            StageSpec::Filter {
                predicate: PredicateSpec::GreaterThan(5)
            }
        );
        assert_eq!(
            "map:add:-3".parse::<StageSpec>().unwrap(),
            StageSpec::Map {
                transform: TransformSpec::Add(-3)
            }
        );
        assert_eq!(
            "scan:add:0".parse::<StageSpec>().unwrap(),
            StageSpec::Scan {
                seed: 0,
                fold: FoldSpec::Add
            }
        );
        assert_eq!(
            "scan:mul".parse::<StageSpec>().unwrap(),
            StageSpec::Scan {
                seed: 1,
                fold: FoldSpec::Multiply
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("take".parse::<StageSpec>().is_err());
        assert!("take:-1".parse::<StageSpec>().is_err());
        assert!("filter:prime".parse::<StageSpec>().is_err());
        assert!("map:add".parse::<StageSpec>().is_err());
        assert!("map:square:2:3".parse::<StageSpec>().is_err());
        assert!("zip:1".parse::<StageSpec>().is_err());
    }

    #[test]
    fn test_catalog_functions() {
        assert!(PredicateSpec::Even.test(&4));
        assert!(!PredicateSpec::Even.test(&3));
        assert!(PredicateSpec::MultipleOf(3).test(&9));
        assert!(PredicateSpec::MultipleOf(0).test(&0));
        assert!(!PredicateSpec::MultipleOf(0).test(&5));
        // i64::MIN % -1 會溢位
        assert!(PredicateSpec::MultipleOf(-1).test(&i64::MIN));
        assert!(PredicateSpec::MultipleOf(-3).test(&-9));
        assert_eq!(TransformSpec::Square.apply(7), 49);
        assert_eq!(TransformSpec::Negate.apply(7), -7);
        assert_eq!(FoldSpec::Max.combine(FoldSpec::Max.identity(), -4), -4);
    }

    #[test]
    fn test_stage_spec_from_toml_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            stages: Vec<StageSpec>,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
stages = [
    { op = "take", count = 10 },
    { op = "filter", predicate = "even" },
    { op = "filter", predicate = { greater_than = 2 } },
    { op = "map", transform = "square" },
    { op = "scan", seed = 0, fold = "add" },
]
"#,
        )
        .unwrap();

        assert_eq!(wrapper.stages.len(), 5);
        assert_eq!(
            wrapper.stages[2],
            StageSpec::Filter {
                predicate: PredicateSpec::GreaterThan(2)
            }
        );
    }
}
