//! `backup-conductor init`: create every declared repository.
//!
//! Each repository gets exactly one `restic init`.  A repository that fails
//! (bad config, restic error) is recorded and the batch moves on.

use crate::{
    commands::{BatchKind, BatchResult, for_each_repository},
    config::Config,
    engine::Engine,
    error::EngineUnavailable,
    runner::EngineCommand,
};

pub fn run(cfg: &Config, engine: &dyn Engine) -> Result<BatchResult, EngineUnavailable> {
    for_each_repository(cfg, engine, BatchKind::Init, EngineCommand::Init)
}
