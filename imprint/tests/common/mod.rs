//! Shared fixture graphs for the integration suites.

// Not every suite uses every fixture
#![allow(dead_code)]

use imprint::{Array, Imprint, Ptr, Str, Unique};

/// A node in a singly-linked graph; `next` never owns its target.
#[derive(Imprint)]
#[repr(C)]
pub struct Node {
	pub id: u64,
	pub next: Ptr<Node>,
}

/// Three nodes owned by the root, wired into a cycle a → b → c → a through
/// non-owning edges.
#[derive(Imprint)]
#[repr(C)]
pub struct Triangle {
	pub a: Unique<Node>,
	pub b: Unique<Node>,
	pub c: Unique<Node>,
}

pub fn triangle() -> Triangle {
	let mut triangle = Triangle {
		a: Unique::new(Node {
			id: 0,
			next: Ptr::null(),
		}),
		b: Unique::new(Node {
			id: 1,
			next: Ptr::null(),
		}),
		c: Unique::new(Node {
			id: 2,
			next: Ptr::null(),
		}),
	};
	let a = triangle.a.as_ptr();
	let b = triangle.b.as_ptr();
	let c = triangle.c.as_ptr();
	triangle.a.get_mut().unwrap().next = Ptr::from_raw(b);
	triangle.b.get_mut().unwrap().next = Ptr::from_raw(c);
	triangle.c.get_mut().unwrap().next = Ptr::from_raw(a);
	triangle
}

/// Walk `steps` edges from `start` and return the visited ids.
pub fn walk(start: &Node, steps: usize) -> Vec<u64> {
	let mut ids = Vec::with_capacity(steps);
	let mut node = start;
	for _ in 0..steps {
		ids.push(node.id);
		node = unsafe { node.next.get() }.expect("edge must not be null");
	}
	ids
}

/// A document-shaped aggregate exercising every container kind at once.
#[derive(Imprint)]
#[repr(C)]
pub struct Document {
	pub id: u64,
	pub title: Str,
	pub word_counts: Array<u32>,
	pub sections: Array<Section>,
	pub appendix: Unique<Section>,
}

#[derive(Imprint)]
#[repr(C)]
pub struct Section {
	pub heading: Str,
	pub lines: Array<Str>,
}

pub fn document() -> Document {
	Document {
		id: 7,
		title: Str::from("zero-copy images"),
		word_counts: Array::from(vec![12, 0, 4051]),
		sections: Array::from(vec![
			Section {
				heading: Str::from("intro"),
				lines: Array::from(vec![Str::from("first line"), Str::from("second line")]),
			},
			Section {
				heading: Str::from(""),
				lines: Array::new(),
			},
		]),
		appendix: Unique::new(Section {
			heading: Str::from("appendix"),
			lines: Array::from(vec![Str::from("fin")]),
		}),
	}
}

pub fn assert_document(doc: &Document) {
	assert_eq!(doc.id, 7);
	assert_eq!(doc.title, "zero-copy images");
	assert_eq!(doc.word_counts.as_slice(), &[12, 0, 4051]);
	assert_eq!(doc.sections.len(), 2);
	assert_eq!(doc.sections[0].heading, "intro");
	assert_eq!(doc.sections[0].lines.len(), 2);
	assert_eq!(doc.sections[0].lines[0], "first line");
	assert_eq!(doc.sections[0].lines[1], "second line");
	assert_eq!(doc.sections[1].heading, "");
	assert!(doc.sections[1].lines.is_empty());
	let appendix = doc.appendix.get().unwrap();
	assert_eq!(appendix.heading, "appendix");
	assert_eq!(appendix.lines[0], "fin");
}

/// One owned string aliased by every element of a pointer array. The owner
/// comes first in declaration order, so the aliases resolve immediately.
#[derive(Imprint)]
#[repr(C)]
pub struct SharedString {
	pub owner: Unique<Str>,
	pub aliases: Array<Ptr<Str>>,
}

pub fn shared_string(text: &str, alias_count: usize) -> SharedString {
	let owner = Unique::new(Str::from(text));
	let target = owner.as_ptr();
	let aliases = (0..alias_count).map(|_| Ptr::from_raw(target)).collect();
	SharedString { owner, aliases }
}

/// A flat array large enough to exercise sink growth.
#[derive(Imprint)]
#[repr(C)]
pub struct Blob {
	pub items: Array<u64>,
}

/// Same shape with the aliases declared *before* the owner, so every alias
/// is serialized as a forward reference and resolved by the pending drain.
#[derive(Imprint)]
#[repr(C)]
pub struct SharedStringForward {
	pub aliases: Array<Ptr<Str>>,
	pub owner: Unique<Str>,
}

pub fn shared_string_forward(text: &str, alias_count: usize) -> SharedStringForward {
	let owner = Unique::new(Str::from(text));
	let target = owner.as_ptr();
	let aliases = (0..alias_count).map(|_| Ptr::from_raw(target)).collect();
	SharedStringForward { aliases, owner }
}
