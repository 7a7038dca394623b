//! # imprint
//!
//! Zero-copy binary serialization for in-memory object graphs on a single,
//! trusted machine. A serialized buffer is a faithful, contiguous,
//! relocatable image of the in-memory representation: pointers are stored
//! as self-relative offsets and converted back to live pointers by a single
//! in-place fixup pass, or used in place, unconverted, with `Mode::CAST`.
//!
//! Cyclic graphs, shared references, strings, dynamic arrays and unique
//! ownership handles are supported; every reachable allocation is emitted
//! exactly once on its natural alignment.
//!
//! ```
//! use imprint::{deserialize, to_buffer, Imprint, Mode, Str, Unique};
//!
//! #[derive(Imprint)]
//! #[repr(C)]
//! struct Entry {
//! 	id: u64,
//! 	name: Str,
//! 	child: Unique<Entry>,
//! }
//!
//! let root = Entry {
//! 	id: 1,
//! 	name: Str::from("root"),
//! 	child: Unique::new(Entry {
//! 		id: 2,
//! 		name: Str::from("leaf"),
//! 		child: Unique::null(),
//! 	}),
//! };
//!
//! let mode = Mode::default();
//! let mut buffer = to_buffer(&root, mode).unwrap();
//! let entry: &Entry = deserialize(buffer.as_mut_slice(), mode).unwrap();
//! assert_eq!(entry.name, "root");
//! assert_eq!(entry.child.get().unwrap().name, "leaf");
//! ```

#[cfg(not(target_pointer_width = "64"))]
compile_error!("`target_pointer_width` must be 64");

// Derive macro
#[cfg(feature = "derive")]
pub use imprint_derive::Imprint;

mod reflect;
pub use reflect::Imprint;

mod ptr;
pub use ptr::{Offset, Ptr};

mod containers;
pub use containers::{Array, Str, Unique};

mod ser;
pub use ser::{serialize, to_buffer, SerContext};

mod deser;
pub use deser::{deserialize, deserialize_cast, DeserContext};

mod buffer;
pub use buffer::{Buffer, BUFFER_ALIGNMENT};

mod sink;
pub use sink::Sink;

mod error;
pub use error::{Error, Result};

mod hash;
pub use hash::{type_hash_of, TypeHasher};

mod mode;
pub use mode::Mode;

pub mod io;

pub mod util;

// `Imprint` implementations for primitives, composites and the crate's own
// pointer and container types
mod reflect_impls;
