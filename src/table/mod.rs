//! The owning aggregate: one controller per table mount, composing
//! the projection pipeline, paging strategy, interaction state, and
//! host callbacks.

pub mod controller;
pub mod events;
pub mod pagination;
