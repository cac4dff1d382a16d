// # bypass-core
//
// Core library for the VPN bypass whitelist reconciler.
//
// ## Architecture Overview
//
// A set of whitelisted domains is resolved on a fixed interval and the
// resulting addresses are pushed to the VPN client as "exclude" subnets:
// - **DomainStore**: Trait for the operator-maintained domain whitelist
// - **Resolver**: Trait for turning a domain into IP addresses
// - **SettingsApplier**: Trait for pushing bypass subnets to the VPN client
// - **ReconciliationEngine**: Owns the cached bypass set and the reset counter
// - **Scheduler**: Drives the engine on an interval until cancelled
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic lives in the engine only;
//    collaborators perform I/O and report success or failure
// 2. **Explicit State**: The bypass set is owned by one engine instance,
//    never process-global
// 3. **Library-First**: The daemon is a thin wrapper around this crate
// 4. **Idempotency**: The applier is called only when the cache grows or is
//    cleared, and always with the full set

pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{ApplierConfig, BypassConfig, DomainStoreConfig, EngineConfig, ResolverConfig};
pub use engine::{EngineEvent, ReconciliationEngine, Scheduler, Termination, TickReport};
pub use error::{Error, Result};
pub use store::{FileDomainStore, MemoryDomainStore};
pub use traits::{
    BypassMode, BypassSettings, BypassSubnetDescriptor, DomainStore, IpFamily, Resolver,
    SettingsApplier,
};
