use imprint::{deserialize, to_buffer, Array, Buffer, Imprint, Mode, Str, Unique};

mod common;
use common::{assert_document, document, Document};

#[test]
fn primitives() {
	#[derive(Imprint, Debug, PartialEq)]
	#[repr(C)]
	struct Foo {
		u8: u8,
		bool: bool,
		u16: u16,
		u32: u32,
		u64: u64,
		i8: i8,
		i16: i16,
		i32: i32,
		i64: i64,
		f32: f32,
		f64: f64,
		char: char,
	}

	let input = Foo {
		u8: 0x01,
		bool: true,
		u16: 0x0203,
		u32: 0x04050607,
		u64: 0x08090a0b0c0d0e0f,
		i8: -1,
		i16: 0x0203,
		i32: -0x04050607,
		i64: 0x08090a0b0c0d0e0f,
		f32: f32::MAX,
		f64: f64::MIN_POSITIVE,
		char: 'c',
	};

	let mut buffer = to_buffer(&input, Mode::default()).unwrap();
	let output: &Foo = deserialize(buffer.as_mut_slice(), Mode::default()).unwrap();
	assert_eq!(&input, output);
}

#[test]
fn fixed_arrays_and_tuples() {
	#[derive(Imprint, Debug, PartialEq)]
	#[repr(C)]
	struct Foo {
		triple: [u32; 3],
		pair: (u64, u64),
		empty: [u8; 0],
	}

	let input = Foo {
		triple: [0x06070809, 0x0a0b0c0d, 0x0e0f1011],
		pair: (1, 2),
		empty: [],
	};

	let mut buffer = to_buffer(&input, Mode::NONE).unwrap();
	let output: &Foo = deserialize(buffer.as_mut_slice(), Mode::NONE).unwrap();
	assert_eq!(&input, output);
}

#[test]
fn nested_aggregates_with_all_containers() {
	let input = document();
	let mode = Mode::default();
	let mut buffer = to_buffer(&input, mode).unwrap();
	let output: &Document = deserialize(buffer.as_mut_slice(), mode).unwrap();
	assert_document(output);
}

#[test]
fn owned_chain() {
	#[derive(Imprint)]
	#[repr(C)]
	struct Link {
		depth: u64,
		next: Unique<Link>,
	}

	fn chain(depth: u64) -> Link {
		let mut link = Link {
			depth: 0,
			next: Unique::null(),
		};
		for depth in 1..=depth {
			link = Link {
				depth,
				next: Unique::new(link),
			};
		}
		link
	}

	let input = chain(64);
	let mut buffer = to_buffer(&input, Mode::default()).unwrap();
	let output: &Link = deserialize(buffer.as_mut_slice(), Mode::default()).unwrap();

	let mut node = output;
	let mut expected = 64;
	loop {
		assert_eq!(node.depth, expected);
		match node.next.get() {
			Some(next) => node = next,
			None => break,
		}
		expected -= 1;
	}
	assert_eq!(expected, 0);
}

#[test]
fn empty_containers_serialize_as_null_headers() {
	#[derive(Imprint)]
	#[repr(C)]
	struct Empty {
		name: Str,
		items: Array<u64>,
	}

	let input = Empty {
		name: Str::new(),
		items: Array::new(),
	};

	// No envelope, so the buffer is exactly the root: a {ptr, len} string
	// header then a {ptr, len, capacity, flags} array header.
	let mut buffer = to_buffer(&input, Mode::NONE).unwrap();
	let words: Vec<u64> = buffer
		.as_slice()
		.chunks(8)
		.map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
		.collect();
	assert_eq!(words, vec![0, 0, 0, 0, 0, 0]);

	let output: &Empty = deserialize(buffer.as_mut_slice(), Mode::NONE).unwrap();
	assert_eq!(output.name, "");
	assert!(output.items.is_empty());
	assert_eq!(output.items.capacity(), 0);
}

#[test]
fn empty_array_with_spare_live_capacity_images_as_empty() {
	#[derive(Imprint)]
	#[repr(C)]
	struct Holder {
		items: Array<u32>,
	}

	// Live array owning spare capacity but holding no elements
	let items: Array<u32> = Array::from(Vec::with_capacity(8));
	assert!(items.is_empty());
	assert!(items.is_self_allocated());

	let input = Holder { items };
	let mut buffer = to_buffer(&input, Mode::NONE).unwrap();
	let output: &Holder = deserialize(buffer.as_mut_slice(), Mode::NONE).unwrap();
	assert!(output.items.is_empty());
	assert_eq!(output.items.capacity(), 0);
	assert!(!output.items.is_self_allocated());
}

#[test]
fn serialization_is_deterministic() {
	let input = document();
	let mode = Mode::default();
	let first = to_buffer(&input, mode).unwrap();
	let second = to_buffer(&input, mode).unwrap();
	assert_eq!(first.as_slice(), second.as_slice());
}

#[test]
fn images_are_position_independent() {
	let input = document();
	let mode = Mode::default();
	let original = to_buffer(&input, mode).unwrap();

	// Replay the same bytes from two different allocations; both must
	// deserialize to the same graph.
	for _ in 0..2 {
		let mut relocated = Buffer::with_len(original.len());
		relocated
			.as_mut_slice()
			.copy_from_slice(original.as_slice());
		assert_ne!(relocated.as_ptr(), original.as_ptr());
		let output: &Document = deserialize(relocated.as_mut_slice(), mode).unwrap();
		assert_document(output);
	}
}
