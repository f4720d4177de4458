pub mod deferred;
pub mod lessons;
pub mod scenario;

pub use deferred::{Deferred, Resolver};
pub use lessons::{all_lessons, run_all_lessons, LessonOutcome};
pub use scenario::ScenarioRunner;
