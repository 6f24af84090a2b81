//! Process bootstrap helpers shared by the binary.

pub mod bootstrap;
