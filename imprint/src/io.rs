//! Filesystem layer: whole-image file write/read and memory-mapped access.
//!
//! Thin adapters over the core protocol. [`write`] serializes straight into
//! a growable memory-mapped file; [`read`] loads a file into an aligned
//! heap buffer and deserializes it; [`read_mmap`] maps the file
//! copy-on-write and deserializes in place, so pointer fixups land in
//! private pages and the file stays untouched.

use std::{
	fs::{File, OpenOptions},
	io::{self, Read as _},
	ops::Deref,
	path::Path,
	ptr::NonNull,
};

use memmap2::{MmapMut, MmapOptions};
use tracing::debug;

use crate::{
	buffer::Buffer,
	deser::deserialize,
	error::Result,
	mode::Mode,
	reflect::Imprint,
	ser::serialize,
	sink::Sink,
	util::align_up_to,
};

/// Initial length of a file being written through [`MmapSink`].
const INITIAL_FILE_LEN: usize = 1 << 16;

/// A [`Sink`] backed by a growable memory-mapped file.
///
/// The file is extended in powers of two as the image grows and truncated
/// to the exact image length by [`finish`](MmapSink::finish). Bytes past the
/// current file length are zero (fresh file pages), so alignment gaps are
/// deterministic without explicit fills.
pub struct MmapSink {
	file: File,
	map: MmapMut,
	len: usize,
}

impl MmapSink {
	/// Create (or truncate) the file at `path` and map it for writing.
	pub fn create(path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.open(path)?;
		file.set_len(INITIAL_FILE_LEN as u64)?;
		let map = unsafe { MmapOptions::new().map_mut(&file)? };
		Ok(Self { file, map, len: 0 })
	}

	/// Flush the mapping and truncate the file to the written length.
	pub fn finish(self) -> io::Result<()> {
		self.map.flush()?;
		drop(self.map);
		self.file.set_len(self.len as u64)?;
		self.file.sync_all()
	}

	/// Grow the file and remap. Separate and `#[cold]`: growth is an
	/// occasional event on the append path.
	#[cold]
	fn grow(&mut self, required: usize) -> io::Result<()> {
		let mut new_len = self.map.len();
		while new_len < required {
			new_len *= 2;
		}
		self.file.set_len(new_len as u64)?;
		self.map = unsafe { MmapOptions::new().map_mut(&self.file)? };
		Ok(())
	}
}

impl Sink for MmapSink {
	#[inline]
	fn pos(&self) -> usize {
		self.len
	}

	fn append(&mut self, bytes: &[u8], align: usize) -> io::Result<usize> {
		debug_assert!(align.is_power_of_two());

		let pos = align_up_to(self.len, align);
		let end = pos + bytes.len();
		if end > self.map.len() {
			self.grow(end)?;
		}
		self.map[pos..end].copy_from_slice(bytes);
		self.len = end;
		Ok(pos)
	}

	fn patch(&mut self, pos: usize, bytes: &[u8]) -> io::Result<()> {
		debug_assert!(pos + bytes.len() <= self.len);
		self.map[pos..pos + bytes.len()].copy_from_slice(bytes);
		Ok(())
	}

	#[inline]
	fn bytes(&self) -> &[u8] {
		&self.map[..self.len]
	}
}

/// Serialize `value` into the file at `path`.
///
/// The image is written through a memory mapping and the file is truncated
/// to the exact image length.
pub fn write<T: Imprint>(path: impl AsRef<Path>, value: &T, mode: Mode) -> Result<()> {
	let path = path.as_ref();
	let mut sink = MmapSink::create(path)?;
	serialize(&mut sink, value, mode)?;
	let len = sink.pos();
	sink.finish()?;
	debug!(path = %path.display(), len, "wrote image");
	Ok(())
}

/// Backing memory of an [`Image`]: an owned heap buffer or a file mapping.
enum ImageMem {
	Heap(Buffer),
	Mapped(MmapMut),
}

/// A deserialized graph together with ownership of its backing bytes.
///
/// The graph's lifetime is the buffer's, so the two travel as one value;
/// dereference to reach the root.
pub struct Image<T> {
	// Field order matters for drop only in that `root` is a raw pointer and
	// carries no drop glue; `mem` owns the bytes it points into.
	mem: ImageMem,
	root: NonNull<T>,
}

impl<T> Image<T> {
	/// The root of the deserialized graph.
	#[inline]
	pub fn get(&self) -> &T {
		// `root` points into `mem`, which this Image owns
		unsafe { self.root.as_ref() }
	}

	/// The raw bytes of the image.
	pub fn as_bytes(&self) -> &[u8] {
		match &self.mem {
			ImageMem::Heap(buffer) => buffer.as_slice(),
			ImageMem::Mapped(map) => &map[..],
		}
	}
}

impl<T> Deref for Image<T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		self.get()
	}
}

// An Image hands out only `&T`, so sending or sharing it across threads is
// sound exactly when shared references to T are.
unsafe impl<T: Sync> Send for Image<T> {}
unsafe impl<T: Sync> Sync for Image<T> {}

/// Read the file at `path` into an aligned heap buffer and deserialize it.
pub fn read<T: Imprint>(path: impl AsRef<Path>, mode: Mode) -> Result<Image<T>> {
	let path = path.as_ref();
	let mut file = File::open(path)?;
	let len = file.metadata()?.len() as usize;
	let mut buffer = Buffer::with_len(len);
	file.read_exact(buffer.as_mut_slice())?;
	debug!(path = %path.display(), len, "read image");

	let root = NonNull::from(deserialize::<T>(buffer.as_mut_slice(), mode)?);
	Ok(Image {
		mem: ImageMem::Heap(buffer),
		root,
	})
}

/// Memory-map the file at `path` copy-on-write and deserialize it in place.
///
/// Pointer fixups are written to private pages; the file itself is never
/// modified.
pub fn read_mmap<T: Imprint>(path: impl AsRef<Path>, mode: Mode) -> Result<Image<T>> {
	let path = path.as_ref();
	let file = File::open(path)?;
	let mut map = unsafe { MmapOptions::new().map_copy(&file)? };
	debug!(path = %path.display(), len = map.len(), "mapped image");

	let root = NonNull::from(deserialize::<T>(&mut map[..], mode)?);
	Ok(Image {
		mem: ImageMem::Mapped(map),
		root,
	})
}
