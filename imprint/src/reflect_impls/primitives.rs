use crate::{hash::TypeHasher, reflect::Imprint};

macro_rules! impl_primitive {
	($ty:ty) => {
		impl Imprint for $ty {
			// `imprint` and `restore` keep their no-op defaults: a primitive
			// is fully captured by its raw bytes.
			#[inline]
			fn type_hash(hasher: &mut TypeHasher) {
				hasher.update(stringify!($ty).as_bytes());
			}
		}
	};
}

impl_primitive!(u8);
impl_primitive!(u16);
impl_primitive!(u32);
impl_primitive!(u64);
impl_primitive!(u128);
impl_primitive!(usize);

impl_primitive!(i8);
impl_primitive!(i16);
impl_primitive!(i32);
impl_primitive!(i64);
impl_primitive!(i128);
impl_primitive!(isize);

impl_primitive!(f32);
impl_primitive!(f64);

impl_primitive!(bool);
impl_primitive!(char);

impl_primitive!(());
