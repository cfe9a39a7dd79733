//! OFX Resource Layer
//!
//! Identified records and the store they live in.
//!
//! # Core Concepts
//!
//! - [`Resource`]: Trait for record types (kind, identifier, structural validation)
//! - [`ResourceId`]: Identifier assigned on creation, immutable afterwards
//! - [`SharedRecord`]: Handle to one record instance (identity, not content)
//! - [`ResourceStore`]: Ordered store with identifier lookup and identity removal
//! - [`PaginatedCollection`]: Page of records with total count
//!
//! # Example
//!
//! ```rust
//! use ofx_resource::{decode, entities::Client, ResourceId, ResourceStore, SharedRecord};
//!
//! let store = ResourceStore::<Client>::new();
//!
//! let decoded = decode::<Client>(r#"{ "secret": "s1" }"#);
//! assert!(decoded.is_valid());
//!
//! let (client, _) = decoded.into_parts();
//! let mut client = client.unwrap();
//! client.id = Some(ResourceId::generate());
//! store.insert(SharedRecord::new(client)).unwrap();
//!
//! assert_eq!(store.len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod pagination;
mod resource;
mod store;

pub mod entities;

// Re-exports
pub use pagination::{offset, PaginatedCollection};
pub use resource::{decode, encode, Decoded, Resource, ResourceError, ResourceId, SharedRecord};
pub use store::{ResourceStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::entities::{Client, Group};
    use super::*;

    #[test]
    fn create_list_remove_lifecycle() {
        let store = ResourceStore::<Client>::new();

        let ids: Vec<ResourceId> = (0..3)
            .map(|i| {
                let mut client = Client::new(format!("secret-{i}"));
                client.set_id(ResourceId::generate());
                store.insert(SharedRecord::new(client)).unwrap().id().unwrap()
            })
            .collect();

        let page = PaginatedCollection::new(store.page(1, 2), 1, 2, store.len());
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_count, 3);
        assert!(page.has_next());

        let first = store.find_by_id(&ids[0]).unwrap();
        assert!(store.remove(&first));
        assert!(store.find_by_id(&ids[0]).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let group = Group::new("ops").with_id(ResourceId::new("g1"));
        let json = encode(&group).unwrap();
        let decoded = decode::<Group>(&json);
        assert_eq!(decoded.resource(), Some(&group));
    }
}
