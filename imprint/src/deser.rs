use std::mem;

use ahash::AHashSet;
use tracing::trace;

use crate::{
	error::{Error, Result},
	hash::{content_hash, type_hash_of},
	mode::{Mode, HASH_SIZE},
	ptr::Offset,
	reflect::Imprint,
	util::is_aligned_to,
};

/// Per-call deserialization state: the buffer's base address and payload
/// extent, the mode, and the set of already-restored allocations (cyclic
/// graphs are common, so the fixup walk must not revisit).
pub struct DeserContext<'a> {
	base: usize,
	payload_start: usize,
	payload_end: usize,
	mode: Mode,
	visited: AHashSet<usize>,
	_buffer: std::marker::PhantomData<&'a mut [u8]>,
}

impl<'a> DeserContext<'a> {
	fn new(buffer: &'a mut [u8], payload_start: usize, payload_end: usize, mode: Mode) -> Self {
		Self {
			base: buffer.as_ptr() as usize,
			payload_start,
			payload_end,
			mode,
			visited: AHashSet::new(),
			_buffer: std::marker::PhantomData,
		}
	}

	/// Whether bounds and alignment are validated.
	#[inline]
	pub(crate) fn checked(&self) -> bool {
		!self.mode.contains(Mode::UNCHECKED)
	}

	/// Whether non-owning pointer targets are recursed into, rather than
	/// being checked only at their entry.
	#[inline]
	pub(crate) fn deep(&self) -> bool {
		self.mode.contains(Mode::DEEP_CHECK)
	}

	/// Mark `addr` restored. Returns `false` if it already was.
	#[inline]
	pub(crate) fn mark(&mut self, addr: usize) -> bool {
		self.visited.insert(addr)
	}

	/// Resolve the imaged pointer slot at address `slot` holding `delta`,
	/// referencing `len` bytes at alignment `align`. Returns the absolute
	/// target address.
	///
	/// In checked modes the referenced range must lie entirely inside the
	/// payload and satisfy `align`. The arithmetic is widened so a
	/// handcrafted delta cannot wrap its way back into bounds.
	pub(crate) fn resolve_slot(
		&self,
		slot: usize,
		delta: Offset,
		len: u128,
		align: usize,
	) -> Result<usize> {
		let target = slot as i128 + delta as i128;
		if self.checked() {
			let start = (self.base + self.payload_start) as i128;
			let end = (self.base + self.payload_end) as i128;
			if target < start || target + len as i128 > end {
				return Err(Error::OutOfBounds {
					pos: (target - self.base as i128) as i64,
					len: len as usize,
				});
			}
			if !is_aligned_to(target as usize, align) {
				return Err(Error::Misaligned {
					pos: (target as usize) - self.base,
					align,
				});
			}
		}
		Ok(target as usize)
	}

	/// Buffer offset of `addr`, for error reporting.
	#[inline]
	pub(crate) fn offset_of(&self, addr: usize) -> usize {
		addr - self.base
	}
}

/// Envelope validation: check the leading type hash and trailing content
/// hash per `mode`, and return `(root_pos, payload_end)`.
fn verify_envelope<T: Imprint>(buffer: &[u8], mode: Mode) -> Result<(usize, usize)> {
	let root_pos = mode.payload_start(mem::align_of::<T>());
	let mut payload_end = buffer.len();

	if mode.contains(Mode::WITH_VERSION) {
		if buffer.len() < HASH_SIZE {
			return Err(Error::OutOfBounds {
				pos: 0,
				len: HASH_SIZE,
			});
		}
		let found = u64::from_le_bytes(buffer[..HASH_SIZE].try_into().unwrap());
		let expected = type_hash_of::<T>();
		if found != expected {
			return Err(Error::VersionMismatch { expected, found });
		}
	}

	if mode.contains(Mode::WITH_INTEGRITY) {
		if payload_end < root_pos + HASH_SIZE {
			return Err(Error::OutOfBounds {
				pos: root_pos as i64,
				len: HASH_SIZE,
			});
		}
		payload_end -= HASH_SIZE;
		let expected = u64::from_le_bytes(buffer[payload_end..][..HASH_SIZE].try_into().unwrap());
		let computed = content_hash(&buffer[root_pos..payload_end]);
		if computed != expected {
			return Err(Error::IntegrityMismatch { expected, computed });
		}
		trace!(payload = payload_end - root_pos, "content hash verified");
	}

	if payload_end < root_pos || payload_end - root_pos < mem::size_of::<T>() {
		return Err(Error::OutOfBounds {
			pos: root_pos as i64,
			len: mem::size_of::<T>(),
		});
	}

	Ok((root_pos, payload_end))
}

/// Deserialize a buffer produced by [`serialize`] into a live graph, in
/// place.
///
/// Verifies the envelope per `mode`, then walks the root converting every
/// self-relative pointer slot back to an absolute pointer. In checked modes
/// (the default) every resolved pointer is bounds- and alignment-checked
/// and string payloads are validated as UTF-8. With [`Mode::UNCHECKED`] the
/// fixup walk runs without validation; the producer is trusted, and a
/// malformed buffer is undefined behavior. With [`Mode::DEEP_CHECK`]
/// non-owning pointers are followed into their targets as well.
///
/// The returned reference aliases the buffer: the live graph's lifetime is
/// the buffer's. Deserializing the same buffer twice is undefined.
///
/// If `mode` contains [`Mode::CAST`], no fixup runs; see
/// [`deserialize_cast`] for the access contract that applies then.
///
/// [`serialize`]: crate::serialize
pub fn deserialize<'a, T: Imprint>(buffer: &'a mut [u8], mode: Mode) -> Result<&'a T> {
	let (root_pos, payload_end) = verify_envelope::<T>(buffer, mode)?;

	let base = buffer.as_ptr() as usize;
	let root = base + root_pos;
	if !is_aligned_to(root, mem::align_of::<T>()) {
		return Err(Error::Misaligned {
			pos: root_pos,
			align: mem::align_of::<T>(),
		});
	}

	if mode.contains(Mode::CAST) {
		return Ok(unsafe { &*(root as *const T) });
	}

	let mut ctx = DeserContext::new(buffer, root_pos, payload_end, mode);
	ctx.mark(root);
	unsafe {
		T::restore(root as *mut T, &mut ctx)?;
		Ok(&*(root as *const T))
	}
}

/// Reinterpret a buffer in place without rewriting offsets.
///
/// Verifies the envelope and the root's extent and alignment, then returns
/// a typed reference into the unmodified buffer. Every pointer slot behind
/// the reference still holds its self-relative delta.
///
/// # Safety
///
/// The returned graph must be read exclusively through the self-relative
/// accessors ([`Ptr::resolve`], [`Str::resolve`], [`Array::resolve`],
/// [`Unique::resolve`]): the ordinary accessors would interpret deltas as
/// addresses. The buffer must have been produced by [`serialize`] with the
/// same root type and envelope flags.
///
/// [`Ptr::resolve`]: crate::Ptr::resolve
/// [`Str::resolve`]: crate::Str::resolve
/// [`Array::resolve`]: crate::Array::resolve
/// [`Unique::resolve`]: crate::Unique::resolve
/// [`serialize`]: crate::serialize
pub unsafe fn deserialize_cast<'a, T: Imprint>(buffer: &'a [u8], mode: Mode) -> Result<&'a T> {
	let (root_pos, _) = verify_envelope::<T>(buffer, mode)?;

	let root = buffer.as_ptr() as usize + root_pos;
	if !is_aligned_to(root, mem::align_of::<T>()) {
		return Err(Error::Misaligned {
			pos: root_pos,
			align: mem::align_of::<T>(),
		});
	}
	Ok(&*(root as *const T))
}
