pub mod app;
pub mod classify;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod policy;
pub mod replay;
pub mod runtime;

pub use classify::{cmd_classify, ClassifyArgs};
pub use policy::{cmd_policy, PolicyArgs};
pub use replay::{cmd_resolve, ResolveArgs, ResolveReport};
