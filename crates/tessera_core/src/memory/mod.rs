//! # Memory Management
//!
//! Slot recycling shared by the world and the compacted stores.
//!
//! ## Design Philosophy
//!
//! Slots are small integers handed out from a free list:
//! - Released slots are reused before new ones are minted
//! - Growth is monotonic and unbounded
//! - No per-acquire heap allocation once the free list has warmed up

mod pool;

pub use pool::IndexPool;
