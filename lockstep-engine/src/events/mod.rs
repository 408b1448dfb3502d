//! Events components can notify and listen on.

pub mod repeated;
