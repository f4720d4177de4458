pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::TomlConfig, ScenarioConfig};

pub use app::{Deferred, ScenarioRunner};
pub use core::engine::{run_local, StreamEngine};
pub use core::observable::{Observable, Source};
pub use core::observer::{from_fn, from_fns, Collector};
pub use core::pipeline::Pipeline;
pub use core::producer::IntervalProducer;
pub use core::stage::Stage;
pub use core::subject::Subject;
pub use core::subscription::Subscription;
pub use domain::model::{
    FoldSpec, PredicateSpec, ScenarioReport, StageSpec, SubscriberReport, SubscriberSpec,
    SubscriptionMode, Tick, TransformSpec,
};
pub use domain::ports::{ConfigProvider, Lesson, Observer, Scenario};
pub use utils::error::{EventflowError, Result};
