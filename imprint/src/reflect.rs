use crate::{deser::DeserContext, error::Result, hash::TypeHasher, ser::SerContext, sink::Sink};

/// Trait for types that can be written into and read back out of a
/// serialized image.
///
/// The three methods are the recursion hooks the engine dispatches through:
///
/// * [`imprint`] runs after the value's raw bytes have been copied into the
///   output; it emits reachable children and rewrites the copy's pointer
///   slots to self-relative deltas. The default is a no-op, which is correct
///   for any type without pointer slots.
/// * [`restore`] is the symmetric fixup pass: it converts an imaged value's
///   slots back to absolute pointers in place, validating them per the
///   deserializer's mode. The default is again a no-op.
/// * [`type_hash`] folds the type's declared shape into the structural hash
///   embedded in versioned buffers.
///
/// Implement this with `#[derive(Imprint)]` for plain `#[repr(C)]`
/// aggregates; hand-written implementations exist only for the pointer and
/// container primitives whose slots need actual work.
///
/// [`imprint`]: Imprint::imprint
/// [`restore`]: Imprint::restore
/// [`type_hash`]: Imprint::type_hash
pub trait Imprint: Sized {
	/// Emit this value's reachable children and rewrite its pointer slots.
	///
	/// `ctx` tracks the block currently being traversed;
	/// `ctx.pos_for(self)` is this value's position in the output.
	#[allow(unused_variables)]
	#[inline(always)]
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		Ok(())
	}

	/// Convert this value's slots from self-relative deltas back to absolute
	/// pointers, in place.
	///
	/// # Safety
	///
	/// `ptr` must point at a `Self` inside the buffer `ctx` describes, and
	/// each slot must still hold its imaged delta (double restoration is
	/// undefined).
	#[allow(unused_variables)]
	#[inline(always)]
	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		Ok(())
	}

	/// Fold this type's declared shape into `hasher`.
	fn type_hash(hasher: &mut TypeHasher);
}
