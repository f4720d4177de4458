use crate::core::stage::{ActiveStage, Stage, Step};
use crate::domain::model::{StageSpec, Tick};
use std::rc::Rc;

/// An ordered list of stages.
///
/// A pipeline is only a description; every subscription gets its own
/// [`Chain`] with fresh counters and accumulators.
#[derive(Debug)]
pub struct Pipeline<T> {
    stages: Vec<Stage<T>>,
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<T: Clone> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<T: Clone + 'static> Pipeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, stage: Stage<T>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn take(self, count: u64) -> Self {
        self.then(Stage::Take(count))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.then(Stage::Filter(Rc::new(predicate)))
    }

    pub fn map<F>(self, transform: F) -> Self
    where
        F: Fn(T) -> T + 'static,
    {
        self.then(Stage::Map(Rc::new(transform)))
    }

    pub fn scan<F>(self, seed: T, fold: F) -> Self
    where
        F: Fn(T, T) -> T + 'static,
    {
        self.then(Stage::Scan {
            seed,
            fold: Rc::new(fold),
        })
    }

    /// Appends every stage of `other` after the stages of `self`.
    pub fn extend(mut self, other: Pipeline<T>) -> Self {
        self.stages.extend(other.stages);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage<T>] {
        &self.stages
    }

    pub(crate) fn instantiate(&self) -> Chain<T> {
        Chain {
            stages: self.stages.iter().map(ActiveStage::from_stage).collect(),
        }
    }
}

impl Pipeline<Tick> {
    pub fn from_specs(specs: &[StageSpec]) -> Self {
        specs.iter().copied().map(Stage::from).collect()
    }
}

impl<T> FromIterator<Stage<T>> for Pipeline<T> {
    fn from_iter<I: IntoIterator<Item = Stage<T>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

/// Result of pushing one value through a chain.
#[derive(Debug, PartialEq)]
pub(crate) struct Flow<T> {
    pub value: Option<T>,
    pub complete: bool,
}

/// The per-subscription instance of a [`Pipeline`].
pub(crate) struct Chain<T> {
    stages: Vec<ActiveStage<T>>,
}

impl<T: Clone> Chain<T> {
    /// True when some `take` stage can never forward again.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.stages.iter().any(ActiveStage::is_exhausted)
    }

    pub(crate) fn push(&mut self, value: T) -> Flow<T> {
        let mut complete = false;
        let mut current = value;

        for stage in &mut self.stages {
            match stage.step(current) {
                Step::Pass(v) => current = v,
                // 最後一個值仍要流過後面的 stage
                Step::Last(v) => {
                    complete = true;
                    current = v;
                }
                Step::Drop => {
                    return Flow {
                        value: None,
                        complete,
                    }
                }
                Step::Done => {
                    return Flow {
                        value: None,
                        complete: true,
                    }
                }
            }
        }

        Flow {
            value: Some(current),
            complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pipeline: &Pipeline<i64>, input: impl IntoIterator<Item = i64>) -> (Vec<i64>, bool) {
        let mut chain = pipeline.instantiate();
        let mut out = Vec::new();
        for v in input {
            let flow = chain.push(v);
            out.extend(flow.value);
            if flow.complete {
                return (out, true);
            }
        }
        (out, false)
    }

    #[test]
    fn test_worked_example_stage_by_stage() {
        let evens = Pipeline::new().filter(|v: &i64| v % 2 == 0);
        assert_eq!(run(&evens, 0..10).0, vec![0, 2, 4, 6, 8]);

        let squares = Pipeline::new().map(|v: i64| v * v);
        assert_eq!(run(&squares, [0, 2, 4, 6, 8]).0, vec![0, 4, 16, 36, 64]);

        let sums = Pipeline::new().scan(0, |acc: i64, v| acc + v);
        assert_eq!(run(&sums, [0, 4, 16, 36, 64]).0, vec![0, 4, 20, 56, 120]);
    }

    #[test]
    fn test_take_completes_after_count() {
        let pipeline = Pipeline::new().take(3);
        assert_eq!(run(&pipeline, 0..), (vec![0, 1, 2], true));
    }

    #[test]
    fn test_last_value_flows_through_later_stages() {
        let pipeline = Pipeline::new().take(3).map(|v: i64| v * 10);
        assert_eq!(run(&pipeline, 0..), (vec![0, 10, 20], true));

        // 第三個值被過濾掉，但仍然完成
        let pipeline = Pipeline::new().take(3).filter(|v: &i64| v % 2 == 0);
        assert_eq!(run(&pipeline, 0..), (vec![0, 2], true));
    }

    #[test]
    fn test_order_of_stages_matters() {
        let take_then_filter = Pipeline::new().take(4).filter(|v: &i64| v % 2 == 0);
        let filter_then_take = Pipeline::new().filter(|v: &i64| v % 2 == 0).take(4);
        assert_eq!(run(&take_then_filter, 0..).0, vec![0, 2]);
        assert_eq!(run(&filter_then_take, 0..).0, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_each_chain_has_its_own_state() {
        let pipeline = Pipeline::new().take(2).scan(0, |acc: i64, v| acc + v);
        assert_eq!(run(&pipeline, [5, 5, 5]), (vec![5, 10], true));
        assert_eq!(run(&pipeline, [5, 5, 5]), (vec![5, 10], true));
    }

    #[test]
    fn test_take_zero_is_exhausted_up_front() {
        assert!(Pipeline::<i64>::new().take(0).instantiate().is_exhausted());
        assert!(!Pipeline::<i64>::new().take(1).instantiate().is_exhausted());
        assert!(!Pipeline::<i64>::new().instantiate().is_exhausted());
    }

    #[test]
    fn test_from_specs() {
        let specs: Vec<StageSpec> = ["take:10", "filter:even", "map:square", "scan:add:0"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let pipeline = Pipeline::from_specs(&specs);
        assert_eq!(pipeline.len(), 4);
        assert_eq!(run(&pipeline, 0..), (vec![0, 4, 20, 56, 120], true));
    }
}
