pub mod dynamic_registry;
pub mod frame_budget;
pub mod heap;
pub mod io;
pub mod registry;
pub mod request_queue;
pub mod work_timer;

use ahash::{AHashMap, AHashSet};
pub type SmallKeyHashMap<K, V> = AHashMap<K, V>;
pub type SmallKeyHashSet<K> = AHashSet<K>;

// Re-exports.
pub use byteorder;
pub use parking_lot;
pub use static_assertions;

pub use dynamic_registry::{DynamicRegistry, ABSENT_ID};
pub use frame_budget::FrameBudget;
pub use heap::{EntryId, Heap, HeapEntry, HeapError};
pub use registry::{Registry, RegistryEntry, RegistryError};
pub use request_queue::{Request, RequestQueue};
pub use work_timer::WorkTimer;
