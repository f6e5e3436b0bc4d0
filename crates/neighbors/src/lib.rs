//! # Neighbors Crate
//!
//! First stage of the user-based collaborative filter: find the users whose
//! reading overlaps with the target's.
//!
//! ## Components
//!
//! - **target**: builds the `TargetProfile` (history + rated-book set)
//! - **finder**: `NeighborFinder`, ranks other users by how many of the
//!   target's books they rated and keeps the top 100
//!
//! ## Example Usage
//!
//! ```ignore
//! use neighbors::{build_target_profile, NeighborFinder};
//! use std::sync::Arc;
//!
//! let index = Arc::new(dataset.ratings);
//! let target = build_target_profile(&index, user_id);
//! let finder = NeighborFinder::new(index.clone());
//!
//! for neighbor in finder.find(&target) {
//!     println!("user {} shares {} books", neighbor.user_id, neighbor.overlap);
//! }
//! ```

pub mod types;
pub mod target;
pub mod finder;

pub use finder::{NeighborFinder, DEFAULT_MAX_NEIGHBORS};
pub use target::build_target_profile;
pub use types::{Neighbor, TargetProfile};
