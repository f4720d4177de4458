pub mod engine;
pub mod observable;
pub mod observer;
pub mod pipeline;
pub mod producer;
pub mod stage;
pub mod subject;
pub mod subscription;

pub use crate::domain::model::{StageSpec, SubscriptionMode, Tick};
pub use crate::domain::ports::{ConfigProvider, Observer, Scenario};
pub use crate::utils::error::Result;
