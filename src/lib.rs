//! A factory-driven object-tree builder engine for embedding declarative
//! DSLs in Rust.
//!
//! The engine builds arbitrary object trees from nested, declarative call
//! syntax. Each node type is produced by a pluggable [`Factory`]; the
//! engine manages a stack of build contexts, resolves factories by name,
//! wires parent/child relationships through factory-supplied hooks, and
//! temporarily exposes node-constructor callables in a shared
//! [`Namespace`] so nested builder expressions don't have to thread a
//! builder reference through every call.
//!
//! ```ignore
//! let builder = Builder::named("tree");
//! builder.register_factory("tree", TreeFactory);
//! builder.register_factory("tip", TipFactory);
//!
//! let root = builder.build(|ns| {
//!     ns.call("tree", &["a".into()], Some(&|_: &TreeRef| {
//!         ns.call("tree", &["b".into()], Some(&|_| {
//!             ns.call("tip", &["c".into()], None)?;
//!             Ok(())
//!         }))?;
//!         ns.call("tip", &["d".into()], None)?;
//!         Ok(())
//!     }))
//! })?;
//! ```
//!
//! The engine is single-threaded and purely synchronous; nodes are opaque
//! handles it never inspects.

pub mod builder;
mod context;
pub mod errors;
pub mod events;
pub mod factory;
pub mod node;
pub mod scope;
pub mod util;

pub use builder::Builder;
pub use errors::{BuildError, BuildResult};
pub use events::{BuildEvent, EventKind};
pub use factory::Factory;
pub use node::Node;
pub use scope::{ConfigureFn, Namespace};
