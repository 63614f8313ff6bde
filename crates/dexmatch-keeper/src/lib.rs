//! # dexmatch-keeper
//!
//! **State plane**: everything the engine reads from or writes to the
//! chain's state between blocks, plus the block-scoped order buffer.
//!
//! ## Architecture
//!
//! 1. **KvStore**: raw ordered key-value access (the ledger is external)
//! 2. **CacheStore / ScopedStore**: per-pair write-back overlay and whitelist
//! 3. **DexKeeper**: typed orderbook, price state and match result access
//! 4. **MemState**: orders and cancellations submitted in the current block
//! 5. **EventManager**: block events, replayed into the parent on success
//!
//! ## Pair execution view
//!
//! ```text
//! DexKeeper → ScopedStore(pair whitelist) → CacheStore(pair)
//!           → CacheStore(block) → parent KvStore
//! ```

pub mod events;
pub mod keeper;
pub mod mem_state;
pub mod store;

pub use events::{Event, EventManager};
pub use keeper::DexKeeper;
pub use mem_state::{BlockPairState, MemState};
pub use store::{CacheStore, KvStore, MemStore, ScopedStore, WriteBatch};
