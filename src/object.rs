use std::fmt;

/// Handle to an object living in a `Heap`. The generation ties it to one
/// lifetime of the registry, so a handle never outlives `free_objects`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: usize,
    generation: u32,
}

impl ObjRef {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        ObjRef { index, generation }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjType {
    String,
}

#[derive(Debug)]
pub enum Obj {
    String(ObjString),
}

impl Obj {
    pub fn obj_type(&self) -> ObjType {
        match self {
            Obj::String(_) => ObjType::String,
        }
    }

    pub(crate) fn size_in_bytes(&self) -> usize {
        match self {
            Obj::String(s) => s.len(),
        }
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obj::String(s) => f.write_fmt(format_args!("{}", s)),
        }
    }
}

// === ObjString ===
// Immutable once built. Equal contents do not imply the same object.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjString {
    chars: Box<str>,
}

impl ObjString {
    pub(crate) fn new(chars: Box<str>) -> Self {
        ObjString { chars }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }
}

impl fmt::Display for ObjString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chars)
    }
}
