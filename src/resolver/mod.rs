//! # Group Resolver
//!
//! Expands directory groups into a flat user to roles mapping:
//! - Recursive expansion of nested groups
//! - Roles of the top-level group propagated to every transitive member
//! - Termination on cyclic membership graphs
//! - Per-subtree failure isolation with typed failure records
//!
//! ## Example
//!
//! ```rust,no_run
//! use gsuite_role_sync::resolver::{GroupResolver, ResolverConfig};
//! use gsuite_role_sync::mapping::parse_rows;
//! use gsuite_role_sync::Directory;
//! use std::sync::Arc;
//!
//! # async fn example(directory: Arc<dyn Directory>) {
//! let rows = vec![
//!     vec!["group".to_string(), "roles".to_string()],
//!     vec!["eng@example.com".to_string(), "reader, writer".to_string()],
//! ];
//! let mapping = parse_rows(&rows);
//!
//! let resolver = GroupResolver::new(directory, ResolverConfig::default());
//! let resolution = resolver.resolve_all(&mapping).await;
//! println!("{} users resolved", resolution.users.len());
//! # }
//! ```

mod group_resolver;
mod outcome;
mod traversal;

pub use group_resolver::{GroupResolver, ResolverConfig};
pub use outcome::{Expansion, ExpansionFailure, Resolution};
