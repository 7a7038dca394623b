use std::{mem, slice};

use ahash::AHashMap;
use tracing::trace;

use crate::{
	buffer::Buffer,
	error::{Error, Result},
	hash::{content_hash, type_hash_of},
	mode::{Mode, HASH_SIZE},
	reflect::Imprint,
	sink::Sink,
	util::align_up_to,
};

/// A pointer slot that was written before its target: `slot` (output
/// position) must later be patched with a delta to wherever `target`
/// (source address) gets emitted.
struct Pending {
	target: usize,
	slot: usize,
}

/// Per-call serialization state: the output sink, the visited map from
/// source address to output position, the pending forward-pointer patches,
/// and the block currently being traversed.
///
/// A block is one contiguous copy: the root, an owned pointee, or an
/// element run. `block_addr` is where it lives in the source and
/// `block_pos` where its copy starts in the output; a field keeps its byte
/// distance from the block start on both sides, which is what turns any
/// interior reference into a patchable slot position.
pub struct SerContext<'a, S: Sink> {
	sink: &'a mut S,
	visited: AHashMap<usize, usize>,
	pending: Vec<Pending>,
	block_addr: usize,
	block_pos: usize,
}

impl<'a, S: Sink> SerContext<'a, S> {
	fn new(sink: &'a mut S) -> Self {
		Self {
			sink,
			visited: AHashMap::new(),
			pending: Vec::new(),
			block_addr: 0,
			block_pos: 0,
		}
	}

	/// Output position of `value`, which must live inside the block
	/// currently being traversed.
	#[inline]
	pub fn pos_for<T>(&self, value: &T) -> usize {
		value as *const T as usize - self.block_addr + self.block_pos
	}

	/// Begin traversing the block copied from `addr` to `pos`. Returns the
	/// enclosing block for [`leave_block`](Self::leave_block).
	#[inline]
	fn enter_block(&mut self, addr: usize, pos: usize) -> (usize, usize) {
		let parent = (self.block_addr, self.block_pos);
		self.block_addr = addr;
		self.block_pos = pos;
		parent
	}

	/// Resume traversing the enclosing block.
	#[inline]
	fn leave_block(&mut self, parent: (usize, usize)) {
		(self.block_addr, self.block_pos) = parent;
	}

	/// Append a block of raw bytes at the given alignment. Returns the
	/// position the block starts at.
	#[inline]
	pub fn write_block(&mut self, bytes: &[u8], align: usize) -> Result<usize> {
		Ok(self.sink.append(bytes, align)?)
	}

	/// Overwrite an already-reserved region.
	#[inline]
	pub fn overwrite(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
		Ok(self.sink.patch(pos, bytes)?)
	}

	/// Write the null sentinel into a pointer slot.
	#[inline]
	pub(crate) fn patch_null(&mut self, slot: usize) -> Result<()> {
		self.overwrite(slot, &0u64.to_le_bytes())
	}

	/// Write the self-relative delta `target_pos - slot` into a pointer slot.
	pub(crate) fn patch_offset(&mut self, slot: usize, target_pos: usize) -> Result<()> {
		let delta = target_pos as i64 - slot as i64;
		if delta == 0 {
			// A zero delta would read back as null
			return Err(Error::SelfPointer { slot });
		}
		self.overwrite(slot, &delta.to_le_bytes())
	}

	/// Record that the source allocation at `addr` was emitted at `pos`.
	#[inline]
	pub(crate) fn register(&mut self, addr: usize, pos: usize) {
		self.visited.insert(addr, pos);
	}

	/// Resolve the pointer slot at `slot` against the source target `addr`:
	/// patch the delta if the target has been emitted, otherwise leave a
	/// null placeholder and defer the patch to the drain.
	pub(crate) fn translate(&mut self, addr: usize, slot: usize) -> Result<()> {
		match self.visited.get(&addr).copied() {
			Some(pos) => self.patch_offset(slot, pos),
			None => {
				self.pending.push(Pending { target: addr, slot });
				self.patch_null(slot)
			}
		}
	}

	/// Emit the pointee of an owning handle and patch the handle's slot.
	///
	/// The pointee is registered in the visited map *before* its own fields
	/// are traversed, so back-edges discovered during that traversal resolve
	/// to it instead of re-emitting it.
	pub(crate) fn emit_owned<T: Imprint>(&mut self, value: &T, slot: usize) -> Result<()> {
		let addr = value as *const T as usize;
		if self.visited.contains_key(&addr) {
			// Either a second owning handle, or a handle claiming the
			// interior of an allocation that was already emitted.
			return Err(Error::DuplicateOwner { addr });
		}

		let pos = self.write_block(bytes_of(value), mem::align_of::<T>())?;
		self.register(addr, pos);

		let parent = self.enter_block(addr, pos);
		value.imprint(self)?;
		self.leave_block(parent);

		self.patch_offset(slot, pos)
	}

	/// Emit a contiguous run of elements and traverse each of them as part
	/// of one block. Returns the block position.
	///
	/// Every element's source address is registered, so pointers aimed at
	/// individual elements resolve to their copies.
	pub(crate) fn emit_elements<T: Imprint>(&mut self, elements: &[T]) -> Result<usize> {
		let size = mem::size_of::<T>();
		let base = elements.as_ptr() as usize;
		let bytes =
			unsafe { slice::from_raw_parts(elements.as_ptr() as *const u8, size * elements.len()) };
		let block = self.write_block(bytes, mem::align_of::<T>())?;

		for index in 0..elements.len() {
			self.register(base + index * size, block + index * size);
		}

		let parent = self.enter_block(base, block);
		for element in elements {
			element.imprint(self)?;
		}
		self.leave_block(parent);

		Ok(block)
	}

	/// Resolve every pending forward pointer. A target that was never
	/// emitted means the graph holds a pointer to a value no owning handle
	/// reaches; that is an error, not a silent null.
	fn drain_pending(&mut self) -> Result<()> {
		trace!(patches = self.pending.len(), "draining pending pointer patches");
		for pending in mem::take(&mut self.pending) {
			match self.visited.get(&pending.target).copied() {
				Some(pos) => self.patch_offset(pending.slot, pos)?,
				None => return Err(Error::UnresolvedPointer { slot: pending.slot }),
			}
		}
		Ok(())
	}
}

/// Raw bytes of a value.
///
/// Padding bytes inside `T` are read as-is: callers wanting byte-identical
/// output across runs must keep padding in their aggregates zeroed.
#[inline]
fn bytes_of<T>(value: &T) -> &[u8] {
	unsafe { slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}

/// Serialize `value` into `sink`.
///
/// The sink must be fresh (position 0). On success the sink holds a
/// complete, relocatable image of the graph reachable from `value`:
/// optional leading type hash, the root object followed by every
/// transitively reachable allocation on its natural alignment, and an
/// optional trailing content hash.
///
/// The source graph is read-only for the duration of the call and must not
/// be mutated concurrently.
pub fn serialize<T: Imprint, S: Sink>(sink: &mut S, value: &T, mode: Mode) -> Result<()> {
	debug_assert_eq!(sink.pos(), 0, "sink must be fresh");

	if mode.contains(Mode::WITH_VERSION) {
		let hash = type_hash_of::<T>();
		sink.append(&hash.to_le_bytes(), HASH_SIZE)?;
	}

	let mut ctx = SerContext::new(&mut *sink);
	let addr = value as *const T as usize;
	let root_pos = ctx.write_block(bytes_of(value), mem::align_of::<T>())?;
	debug_assert_eq!(root_pos, mode.payload_start(mem::align_of::<T>()));

	ctx.register(addr, root_pos);
	ctx.enter_block(addr, root_pos);
	value.imprint(&mut ctx)?;
	ctx.drain_pending()?;

	if mode.contains(Mode::WITH_INTEGRITY) {
		let end = sink.pos();
		let padded = align_up_to(end, HASH_SIZE);
		if padded > end {
			sink.append(&[0u8; HASH_SIZE][..padded - end], 1)?;
		}
		let payload_start = mode.payload_start(mem::align_of::<T>());
		let hash = content_hash(&sink.bytes()[payload_start..]);
		sink.append(&hash.to_le_bytes(), HASH_SIZE)?;
	}

	Ok(())
}

/// Serialize `value` into a fresh in-memory [`Buffer`].
pub fn to_buffer<T: Imprint>(value: &T, mode: Mode) -> Result<Buffer> {
	let mut buffer = Buffer::new();
	serialize(&mut buffer, value, mode)?;
	Ok(buffer)
}
