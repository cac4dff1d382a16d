// # Domain Store Implementations
//
// This module provides implementations of the DomainStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileDomainStore;
pub use memory::MemoryDomainStore;
