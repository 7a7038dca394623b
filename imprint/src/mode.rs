use std::ops::{BitOr, BitOrAssign};

use crate::util::align_up_to;

/// Size in bytes of each envelope hash (type hash and content hash).
pub(crate) const HASH_SIZE: usize = 8;

/// Serialization/deserialization mode flags.
///
/// Producer and consumer must use identical envelope flags
/// ([`WITH_VERSION`], [`WITH_INTEGRITY`]): the buffer layout depends on them.
/// The remaining flags only affect deserialization.
///
/// ```
/// use imprint::Mode;
///
/// let mode = Mode::WITH_VERSION | Mode::WITH_INTEGRITY;
/// assert!(mode.contains(Mode::WITH_VERSION));
/// assert!(!mode.contains(Mode::UNCHECKED));
/// assert_eq!(mode, Mode::default());
/// ```
///
/// [`WITH_VERSION`]: Mode::WITH_VERSION
/// [`WITH_INTEGRITY`]: Mode::WITH_INTEGRITY
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Mode(u32);

impl Mode {
	/// No envelope, checked deserialization.
	pub const NONE: Mode = Mode(0);

	/// Embed and check a leading 64-bit structural type hash of the root type.
	pub const WITH_VERSION: Mode = Mode(1);

	/// Embed and check a trailing 64-bit content hash over the payload bytes.
	pub const WITH_INTEGRITY: Mode = Mode(1 << 1);

	/// Skip bounds and alignment validation during deserialization.
	/// The buffer is assumed to come from a trusted producer.
	pub const UNCHECKED: Mode = Mode(1 << 2);

	/// Reinterpret the buffer in place without rewriting offsets.
	/// Reads must use the self-relative `resolve` accessors.
	pub const CAST: Mode = Mode(1 << 3);

	/// Validate every pointer reachable from the root, following non-owning
	/// pointers into their targets rather than checking them only at entry.
	pub const DEEP_CHECK: Mode = Mode(1 << 4);

	/// Whether all flags of `other` are set in `self`.
	#[inline]
	pub const fn contains(self, other: Mode) -> bool {
		self.0 & other.0 == other.0
	}

	/// Position of the root object in a buffer produced with this mode, for a
	/// root type of alignment `align`. The leading type hash, if present,
	/// pushes the root to the next position aligned for it.
	#[inline]
	pub(crate) const fn payload_start(self, align: usize) -> usize {
		if self.contains(Mode::WITH_VERSION) {
			align_up_to(HASH_SIZE, align)
		} else {
			0
		}
	}
}

impl Default for Mode {
	/// The file layer's default: versioned and integrity-checked.
	fn default() -> Self {
		Mode::WITH_VERSION | Mode::WITH_INTEGRITY
	}
}

impl BitOr for Mode {
	type Output = Mode;

	#[inline]
	fn bitor(self, rhs: Mode) -> Mode {
		Mode(self.0 | rhs.0)
	}
}

impl BitOrAssign for Mode {
	#[inline]
	fn bitor_assign(&mut self, rhs: Mode) {
		self.0 |= rhs.0;
	}
}
