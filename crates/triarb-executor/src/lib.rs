//! Simulated execution for triarb.
//!
//! `ExecutionSimulator` is a two-state machine (`Active` → `Halted`). While
//! active, each signal goes through:
//! 1. Simulated latency (in the stage loop)
//! 2. Fill-probability draw; a miss rejects the order with no side effects
//! 3. Slippage draw from a normal distribution
//! 4. Profit on the lot size, applied to the shared account
//! 5. Halt check against the account boundary
//!
//! Randomness is injected through `RandomSource` so runs can be seeded and
//! individual paths scripted in tests.

pub mod config;
pub mod error;
pub mod random;
pub mod simulator;
pub mod stage;

pub use config::{ExecutionConfig, LotSizing};
pub use error::{ExecutorError, ExecutorResult};
pub use random::{RandomSource, SeededRandom};
pub use simulator::{ExecutionOutcome, ExecutionSimulator, ExecutionState};
pub use stage::ExecutionStage;
