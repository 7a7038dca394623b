use std::io;

/// Errors produced by serialization, deserialization and the file layer.
///
/// All errors surface at the top-level call; a partially-written buffer is
/// discarded by the caller. `Mode::UNCHECKED` suppresses [`OutOfBounds`] and
/// [`Misaligned`].
///
/// [`OutOfBounds`]: Error::OutOfBounds
/// [`Misaligned`]: Error::Misaligned
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The buffer's leading type hash does not match the expected root type.
	#[error("type hash mismatch: expected {expected:#018x}, found {found:#018x}")]
	VersionMismatch {
		/// Structural hash of the requested root type.
		expected: u64,
		/// Structural hash stored in the buffer.
		found: u64,
	},

	/// The buffer's trailing content hash does not match the payload bytes.
	#[error("content hash mismatch: expected {expected:#018x}, computed {computed:#018x}")]
	IntegrityMismatch {
		/// Content hash stored in the buffer.
		expected: u64,
		/// Content hash computed over the payload.
		computed: u64,
	},

	/// A resolved pointer, or the region it references, lies outside the
	/// payload. `pos` is the target's offset from the buffer start and may be
	/// negative for a delta pointing below it.
	#[error("pointer out of bounds: {len} byte(s) at offset {pos}")]
	OutOfBounds {
		/// Target offset relative to the buffer start.
		pos: i64,
		/// Size of the referenced region in bytes.
		len: usize,
	},

	/// A resolved pointer does not satisfy its target type's alignment.
	#[error("misaligned pointer at offset {pos}: alignment {align} required")]
	Misaligned {
		/// Target offset relative to the buffer start.
		pos: usize,
		/// Required alignment in bytes.
		align: usize,
	},

	/// The underlying sink failed during `append` or `patch`.
	#[error("sink failure: {0}")]
	Sink(#[from] io::Error),

	/// A value was claimed by more than one owning handle, or an owning handle
	/// claimed the interior of another emitted allocation.
	#[error("value at {addr:#x} is owned by more than one unique handle")]
	DuplicateOwner {
		/// Source address of the doubly-claimed value.
		addr: usize,
	},

	/// A pointer's target was never emitted: it is reachable from the root
	/// only through non-owning pointers.
	#[error("pointer slot at offset {slot} targets a value that was never serialized")]
	UnresolvedPointer {
		/// Buffer offset of the unresolved pointer slot.
		slot: usize,
	},

	/// A non-null pointer slot would store a delta of zero, which is the null
	/// sentinel. An object may not contain a pointer to itself at offset zero.
	#[error("non-null pointer slot at offset {slot} points at itself")]
	SelfPointer {
		/// Buffer offset of the offending slot.
		slot: usize,
	},

	/// A string payload is not valid UTF-8 (checked modes only).
	#[error("string payload at offset {pos} is not valid UTF-8")]
	InvalidUtf8 {
		/// Buffer offset of the payload.
		pos: usize,
	},
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
