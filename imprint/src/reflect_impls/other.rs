use std::{marker::PhantomData, ptr::addr_of_mut};

use crate::{
	deser::DeserContext, error::Result, hash::TypeHasher, reflect::Imprint, ser::SerContext,
	sink::Sink,
};

impl<T: Imprint, const N: usize> Imprint for [T; N] {
	fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
		for element in self {
			element.imprint(ctx)?;
		}
		Ok(())
	}

	unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
		let base = ptr as *mut T;
		for index in 0..N {
			unsafe { T::restore(base.add(index), ctx)? };
		}
		Ok(())
	}

	fn type_hash(hasher: &mut TypeHasher) {
		hasher.update(b"fixed-array");
		hasher.write_usize(N);
		T::type_hash(hasher);
	}
}

impl<T> Imprint for PhantomData<T> {
	fn type_hash(hasher: &mut TypeHasher) {
		hasher.update(b"phantom");
	}
}

macro_rules! impl_tuple {
	($count:expr; $($index:tt $param:ident),+) => {
		impl<$($param: Imprint),+> Imprint for ($($param,)+) {
			fn imprint<S: Sink>(&self, ctx: &mut SerContext<'_, S>) -> Result<()> {
				$(self.$index.imprint(ctx)?;)+
				Ok(())
			}

			unsafe fn restore(ptr: *mut Self, ctx: &mut DeserContext<'_>) -> Result<()> {
				unsafe { $($param::restore(addr_of_mut!((*ptr).$index), ctx)?;)+ }
				Ok(())
			}

			fn type_hash(hasher: &mut TypeHasher) {
				hasher.update(b"tuple");
				hasher.write_usize($count);
				$($param::type_hash(hasher);)+
			}
		}
	};
}

impl_tuple!(1; 0 T0);
impl_tuple!(2; 0 T0, 1 T1);
impl_tuple!(3; 0 T0, 1 T1, 2 T2);
impl_tuple!(4; 0 T0, 1 T1, 2 T2, 3 T3);
