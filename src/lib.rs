//! This crate provides the client side of a task manager backed by a remote REST service.
//!
//! It provides a client for the task service in the [`client`] module, that implements the [`TaskStore`](traits::TaskStore) trait.
//! An in-memory [`MockStore`](mock_store::MockStore) implements the same trait, for tests and demos. \
//! Stores never retry on their own, wrap them in a [`Retrying`](retry::Retrying) store if needed.
//!
//! On top of a store, a [`Session`] holds the canonical task collection of the main screen. It fetches it once, then
//! patches it locally every time the service confirms a write (see the [`state`] module). \
//! The [`filter`] module derives the "due on a given day" and "matching a search" views out of that collection, and the
//! [`view`] module turns them into rows that a front-end can render.

pub mod traits;

mod task;
pub use task::{DueDate, Task, TaskDraft, TaskId, TaskStatus};
pub mod error;
pub use error::{FormError, StoreError};

pub mod client;
pub mod retry;
pub mod mock_behaviour;
pub mod mock_store;

pub mod filter;
pub mod state;
pub mod form;
pub mod view;
pub mod session;
pub use session::Session;

pub mod config;
pub mod utils;
