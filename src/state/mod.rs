/// State management module
///
/// This module handles all viewer state, including:
/// - Shared data structures (data.rs)
/// - Directory listing and ordering (scanner.rs)
/// - The operator's picks (selection.rs) and their sidecar file (sidecar.rs)
/// - The viewer loop state machine (session.rs)

pub mod data;
pub mod scanner;
pub mod selection;
pub mod session;
pub mod sidecar;
