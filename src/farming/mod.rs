//! Yield-farm positions.
//!
//! The farm's HTTP API lists pools; stakes are read from the pool's
//! MasterChef contract and merged into [`FarmPool`] rows.

mod client;
mod service;
mod staking;
mod types;

pub use client::FarmApiClient;
pub use service::FarmingService;
pub use staking::{StakeSource, StakingReader};
pub use types::{FarmPool, PoolInfo, StakeInfo};

#[cfg(test)]
pub(crate) use staking::MockStakeSource;
#[cfg(test)]
pub(crate) use types::tests::sample_pool;
