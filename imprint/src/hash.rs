//! Structural type hashing and payload integrity hashing.
//!
//! Both hashes are 64-bit xxh3. The type hash is a fold over the declared
//! shape of a type (sizes, alignments, field hashes, and the names of
//! pointer targets); equal shapes hash equally within one build, which is
//! exactly the producer-equals-consumer contract the engine assumes.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

use crate::Imprint;

/// Streaming hasher fed by [`Imprint::type_hash`] implementations.
///
/// Wraps the xxh3 streaming state so that derived code needs no direct
/// dependency on the hash crate.
pub struct TypeHasher(Xxh3);

impl TypeHasher {
	/// Create a fresh hasher.
	#[inline]
	pub fn new() -> Self {
		Self(Xxh3::new())
	}

	/// Fold raw bytes into the hash.
	#[inline]
	pub fn update(&mut self, bytes: &[u8]) {
		self.0.update(bytes);
	}

	/// Fold an integer into the hash.
	#[inline]
	pub fn write_usize(&mut self, value: usize) {
		self.0.update(&(value as u64).to_le_bytes());
	}

	/// Finish and return the 64-bit digest.
	#[inline]
	pub fn finish(&self) -> u64 {
		self.0.digest()
	}
}

impl Default for TypeHasher {
	fn default() -> Self {
		Self::new()
	}
}

/// Structural hash of `T`, as embedded in versioned buffers.
pub fn type_hash_of<T: Imprint>() -> u64 {
	let mut hasher = TypeHasher::new();
	T::type_hash(&mut hasher);
	hasher.finish()
}

/// Content hash over payload bytes, as embedded in integrity-checked buffers.
#[inline]
pub(crate) fn content_hash(bytes: &[u8]) -> u64 {
	xxh3_64(bytes)
}
