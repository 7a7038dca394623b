//! The protocol for pointer-bearing types: how each slot kind is rewritten
//! on the way into a buffer and resolved on the way back out.

use std::{any::type_name, mem, ptr::addr_of_mut, slice, str};

use crate::{
	containers::{Array, Str, Unique},
	deser::DeserContext,
	error::{Error, Result},
	hash::TypeHasher,
	ptr::{Offset, Ptr},
	reflect::Imprint,
	ser::SerContext,
	sink::Sink,
};

impl<T: Imprint> Imprint for Ptr<T> {
	/// A non-owning pointer never emits its target; it resolves against the
	/// copy the target's owner emits. A target not yet emitted becomes a
	/// pending patch.
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		let slot = ctx.pos_for(self);
		if self.repr == 0 {
			return ctx.patch_null(slot);
		}
		ctx.translate(self.repr, slot)
	}

	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		let raw = unsafe { (*ptr).repr };
		if raw == 0 {
			return Ok(());
		}
		let slot = ptr as usize;
		let target = ctx.resolve_slot(
			slot,
			raw as Offset,
			mem::size_of::<T>() as u128,
			mem::align_of::<T>(),
		)?;
		unsafe { (*ptr).repr = target };
		if ctx.deep() && ctx.mark(target) {
			unsafe { T::restore(target as *mut T, ctx)? };
		}
		Ok(())
	}

	fn type_hash(hasher: &mut TypeHasher) {
		// Hashing the target's name rather than its shape terminates
		// recursive types (a node pointing at its own kind).
		hasher.update(b"ptr:");
		hasher.update(type_name::<T>().as_bytes());
	}
}

impl<T: Imprint> Imprint for Unique<T> {
	/// The owning handle is the emission site of its pointee. The pointee is
	/// registered before its fields are traversed, so back-edges to it
	/// resolve instead of re-emitting.
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		let slot = ctx.pos_for(self);
		match self.get() {
			Some(value) => ctx.emit_owned(value, slot),
			None => ctx.patch_null(slot),
		}
	}

	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		let raw = unsafe { (*ptr).ptr.repr };
		if raw == 0 {
			return Ok(());
		}
		let slot = ptr as usize;
		let target = ctx.resolve_slot(
			slot,
			raw as Offset,
			mem::size_of::<T>() as u128,
			mem::align_of::<T>(),
		)?;
		unsafe { (*ptr).ptr.repr = target };
		if ctx.mark(target) {
			unsafe { T::restore(target as *mut T, ctx)? };
		}
		Ok(())
	}

	fn type_hash(hasher: &mut TypeHasher) {
		hasher.update(b"unique:");
		hasher.update(type_name::<T>().as_bytes());
	}
}

impl Imprint for Str {
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		let slot = ctx.pos_for(&self.ptr);
		if self.len == 0 {
			return ctx.patch_null(slot);
		}
		let payload = ctx.write_block(self.as_bytes(), 1)?;
		ctx.patch_offset(slot, payload)
	}

	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		let len = unsafe { (*ptr).len };
		if len == 0 {
			unsafe { (*ptr).ptr.repr = 0 };
			return Ok(());
		}
		let slot = unsafe { addr_of_mut!((*ptr).ptr) } as usize;
		let raw = unsafe { (*ptr).ptr.repr };
		if raw == 0 {
			return Err(Error::OutOfBounds {
				pos: ctx.offset_of(slot) as i64,
				len: len as usize,
			});
		}
		let target = ctx.resolve_slot(slot, raw as Offset, len as u128, 1)?;
		if ctx.checked() {
			let payload = unsafe { slice::from_raw_parts(target as *const u8, len as usize) };
			if str::from_utf8(payload).is_err() {
				return Err(Error::InvalidUtf8 {
					pos: ctx.offset_of(target),
				});
			}
		}
		unsafe { (*ptr).ptr.repr = target };
		Ok(())
	}

	fn type_hash(hasher: &mut TypeHasher) {
		hasher.update(b"str");
	}
}

impl<T: Imprint> Imprint for Array<T> {
	/// The element block is emitted first so that each element's own pointer
	/// slots exist in the output before they are traversed; the header is
	/// then normalized: delta to the block, `capacity = len`, flag and
	/// padding cleared.
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		let slot = ctx.pos_for(&self.ptr);
		if self.len == 0 || mem::size_of::<T>() == 0 {
			ctx.patch_null(slot)?;
		} else {
			let block = ctx.emit_elements(self.as_slice())?;
			ctx.patch_offset(slot, block)?;
		}

		let capacity_pos = ctx.pos_for(&self.capacity);
		ctx.overwrite(capacity_pos, &self.len.to_le_bytes())?;
		let flags_pos = ctx.pos_for(&self.self_allocated);
		ctx.overwrite(flags_pos, &[0u8; 8])
	}

	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		// An image-backed array must never report its block as owned
		unsafe {
			(*ptr).self_allocated = 0;
			(*ptr)._pad = [0; 7];
		}

		let len = unsafe { (*ptr).len } as usize;
		if len == 0 {
			unsafe { (*ptr).ptr.repr = 0 };
			return Ok(());
		}
		let size = mem::size_of::<T>();
		if size == 0 {
			// Zero-sized elements carry no bytes; a dangling aligned pointer
			// is the canonical empty block.
			unsafe { (*ptr).ptr.repr = mem::align_of::<T>() };
			return Ok(());
		}

		let slot = unsafe { addr_of_mut!((*ptr).ptr) } as usize;
		let raw = unsafe { (*ptr).ptr.repr };
		if raw == 0 {
			return Err(Error::OutOfBounds {
				pos: ctx.offset_of(slot) as i64,
				len: len * size,
			});
		}
		let target = ctx.resolve_slot(
			slot,
			raw as Offset,
			len as u128 * size as u128,
			mem::align_of::<T>(),
		)?;
		unsafe { (*ptr).ptr.repr = target };

		for index in 0..len {
			let element = target + index * size;
			if ctx.mark(element) {
				unsafe { T::restore(element as *mut T, ctx)? };
			}
		}
		Ok(())
	}

	fn type_hash(hasher: &mut TypeHasher) {
		hasher.update(b"array:");
		hasher.update(type_name::<T>().as_bytes());
	}
}
