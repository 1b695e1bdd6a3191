//! Deterministic tick engine for the political simulation.
//!
//! Everything in this crate is synchronous and free of I/O, wall-clock reads,
//! and host entropy: given the same initial state, the same ordered action
//! submissions, and the same advisor outputs, a tick produces an identical
//! post-tick state and content hash. The only randomness is the seeded
//! SHA-256 stream in [`rng`].

pub mod advisor;
pub mod hashing;
pub mod kernel;
pub mod rng;
mod world;

pub use advisor::{AdvisorError, AdvisorSuite, NoopAdvisors, ScriptedAdvisors};
pub use kernel::{BatchRejection, ModifierRejection};
pub use world::{GameWorld, JoinError, SubmitError, TickReport};
