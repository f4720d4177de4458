use crate::domain::model::{StageSpec, Tick};
use std::fmt;
use std::rc::Rc;

/// One declarative step of a pipeline.
///
/// Functions are reference counted so a pipeline can be instantiated once per
/// subscription without cloning closures.
pub enum Stage<T> {
    Take(u64),
    Filter(Rc<dyn Fn(&T) -> bool>),
    Map(Rc<dyn Fn(T) -> T>),
    Scan {
        seed: T,
        fold: Rc<dyn Fn(T, T) -> T>,
    },
}

impl<T: Clone> Clone for Stage<T> {
    fn clone(&self) -> Self {
        match self {
            Stage::Take(n) => Stage::Take(*n),
            Stage::Filter(f) => Stage::Filter(f.clone()),
            Stage::Map(f) => Stage::Map(f.clone()),
            Stage::Scan { seed, fold } => Stage::Scan {
                seed: seed.clone(),
                fold: fold.clone(),
            },
        }
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Take(n) => write!(f, "Take({})", n),
            Stage::Filter(_) => write!(f, "Filter(..)"),
            Stage::Map(_) => write!(f, "Map(..)"),
            Stage::Scan { .. } => write!(f, "Scan(..)"),
        }
    }
}

impl From<StageSpec> for Stage<Tick> {
    fn from(spec: StageSpec) -> Self {
        match spec {
            StageSpec::Take { count } => Stage::Take(count),
            StageSpec::Filter { predicate } => Stage::Filter(Rc::new(move |v| predicate.test(v))),
            StageSpec::Map { transform } => Stage::Map(Rc::new(move |v| transform.apply(v))),
            StageSpec::Scan { seed, fold } => Stage::Scan {
                seed,
                fold: Rc::new(move |acc, v| fold.combine(acc, v)),
            },
        }
    }
}

/// A stage with the state of a single subscription.
pub(crate) enum ActiveStage<T> {
    Take { remaining: u64 },
    Filter(Rc<dyn Fn(&T) -> bool>),
    Map(Rc<dyn Fn(T) -> T>),
    Scan { acc: T, fold: Rc<dyn Fn(T, T) -> T> },
}

/// What a single stage did with a value.
pub(crate) enum Step<T> {
    Pass(T),
    /// Forward the value, then complete.
    Last(T),
    Drop,
    /// Complete without forwarding.
    Done,
}

impl<T: Clone> ActiveStage<T> {
    pub(crate) fn from_stage(stage: &Stage<T>) -> Self {
        match stage {
            Stage::Take(n) => ActiveStage::Take { remaining: *n },
            Stage::Filter(f) => ActiveStage::Filter(f.clone()),
            Stage::Map(f) => ActiveStage::Map(f.clone()),
            Stage::Scan { seed, fold } => ActiveStage::Scan {
                acc: seed.clone(),
                fold: fold.clone(),
            },
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        matches!(self, ActiveStage::Take { remaining: 0 })
    }

    pub(crate) fn step(&mut self, value: T) -> Step<T> {
        match self {
            ActiveStage::Take { remaining } => match *remaining {
                0 => Step::Done,
                1 => {
                    *remaining = 0;
                    Step::Last(value)
                }
                _ => {
                    *remaining -= 1;
                    Step::Pass(value)
                }
            },
            ActiveStage::Filter(predicate) => {
                if predicate(&value) {
                    Step::Pass(value)
                } else {
                    Step::Drop
                }
            }
            ActiveStage::Map(f) => Step::Pass(f(value)),
            ActiveStage::Scan { acc, fold } => {
                let next = fold(acc.clone(), value);
                *acc = next.clone();
                Step::Pass(next)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FoldSpec, PredicateSpec};

    #[test]
    fn test_take_counts_down_then_finishes() {
        let mut take = ActiveStage::<i64>::from_stage(&Stage::Take(2));
        assert!(matches!(take.step(7), Step::Pass(7)));
        assert!(matches!(take.step(8), Step::Last(8)));
        assert!(take.is_exhausted());
        assert!(matches!(take.step(9), Step::Done));
    }

    #[test]
    fn test_scan_keeps_accumulator() {
        let stage: Stage<Tick> = StageSpec::Scan {
            seed: 10,
            fold: FoldSpec::Add,
        }
        .into();
        let mut scan = ActiveStage::from_stage(&stage);
        assert!(matches!(scan.step(1), Step::Pass(11)));
        assert!(matches!(scan.step(2), Step::Pass(13)));
    }

    #[test]
    fn test_filter_from_spec() {
        let stage: Stage<Tick> = StageSpec::Filter {
            predicate: PredicateSpec::Odd,
        }
        .into();
        let mut filter = ActiveStage::from_stage(&stage);
        assert!(matches!(filter.step(2), Step::Drop));
        assert!(matches!(filter.step(3), Step::Pass(3)));
    }
}
