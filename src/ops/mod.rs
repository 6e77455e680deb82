//! Stateless drawing algorithms over raw surfaces.

pub mod draw;
