//! Interpreter memory - owning buffers tied to an allocator family
//!
//! Design: Two allocator families with distinct free functions:
//! 1. General (`PyMem_Malloc` family, interpreter lock required)
//! 2. Raw (`PyMem_RawMalloc` family, usable without the lock)
//!
//! The family is a type parameter, so a block can only ever be released
//! through the family that produced it. Allocation failure is fatal.

mod buffer;
mod family;


pub use buffer::{Buffer, WideBuffer};
pub use family::{AllocatorFamily, General, Raw};

/// Buffer from the general family (`PyMem_Free`)
pub type Mem = Buffer<General>;

/// Buffer from the raw family (`PyMem_RawFree`)
pub type RawMem = Buffer<Raw>;

/// Wide buffer from the general family, as returned by wide-string export
pub type WideMem = WideBuffer<General>;

/// Wide buffer from the raw family, as returned by locale decoding
pub type RawWideMem = WideBuffer<Raw>;
