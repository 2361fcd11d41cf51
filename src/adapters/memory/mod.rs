//! In-memory adapters.
//!
//! - `InMemoryBillingStore` - implements every billing port behind one lock

mod billing_store;

pub use billing_store::InMemoryBillingStore;
