use crate::error::{AllocError, ValueError};
use crate::object::{Obj, ObjRef, ObjString};
use std::cmp;
use std::ops::Index;

const MIN_CAPACITY: usize = 8;

/// Capacity to grow to when a buffer holding `capacity` elements is full.
pub fn grow_capacity(capacity: usize) -> usize {
    cmp::max(MIN_CAPACITY, capacity.saturating_mul(2))
}

/// Resizes `buffer` so it can hold `new_capacity` elements without further
/// allocation. Elements below `min(len, new_capacity)` are preserved and a
/// zero capacity releases the buffer entirely.
pub fn reallocate<T>(
    buffer: &mut Vec<T>,
    new_capacity: usize,
    ceiling: usize,
) -> Result<(), AllocError> {
    if new_capacity == 0 {
        *buffer = Vec::new();
        return Ok(());
    }
    if new_capacity > ceiling {
        return Err(AllocError::CeilingExceeded {
            requested: new_capacity,
            ceiling,
        });
    }
    if new_capacity < buffer.len() {
        buffer.truncate(new_capacity);
        buffer.shrink_to(new_capacity);
        return Ok(());
    }
    buffer
        .try_reserve_exact(new_capacity - buffer.len())
        .map_err(|_| AllocError::OutOfMemory {
            requested: new_capacity,
        })
}

/// A half-written buffer cannot be unwound mid-compile, so running out of
/// memory ends the process.
pub fn out_of_memory(err: AllocError) -> ! {
    log::error!("fatal allocation failure: {}", err);
    eprintln!("fatal: {}", err);
    std::process::exit(1)
}

/// Append-only array growing by `grow_capacity`. `capacity` is the logical
/// allocated length; `len` never exceeds it.
#[derive(Debug, Clone)]
pub struct DynArray<T> {
    values: Vec<T>,
    capacity: usize,
    ceiling: usize,
}

impl<T> DynArray<T> {
    pub fn new() -> Self {
        Self::with_ceiling(usize::MAX)
    }

    /// An array refusing to grow past `ceiling` elements. Growth beyond it
    /// fails the same way an exhausted allocator would.
    pub fn with_ceiling(ceiling: usize) -> Self {
        DynArray {
            values: Vec::new(),
            capacity: 0,
            ceiling,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Appends `value`, returning its index.
    pub fn try_write(&mut self, value: T) -> Result<usize, AllocError> {
        if self.capacity < self.values.len() + 1 {
            let new_capacity = grow_capacity(self.capacity);
            reallocate(&mut self.values, new_capacity, self.ceiling)?;
            self.capacity = new_capacity;
        }
        self.values.push(value);
        Ok(self.values.len() - 1)
    }

    pub fn write(&mut self, value: T) -> usize {
        self.try_write(value).unwrap_or_else(|err| out_of_memory(err))
    }

    /// Releases the buffer and returns to the freshly constructed state.
    pub fn free(&mut self) {
        self.values = Vec::new();
        self.capacity = 0;
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for DynArray<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.values[index]
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Registry of every heap object, addressed by `ObjRef`. Objects are never
/// removed individually; `free_objects` tears the whole registry down and
/// starts a new generation, invalidating every handle issued before it.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
    bytes_allocated: usize,
    generation: u32,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            objects: Vec::new(),
            bytes_allocated: 0,
            generation: 0,
        }
    }

    fn allocate(&mut self, obj: Obj) -> ObjRef {
        self.bytes_allocated += obj.size_in_bytes();
        let obj_ref = ObjRef::new(self.objects.len(), self.generation);
        self.objects.push(obj);
        log::trace!("allocated {:?} ({} bytes total)", obj_ref, self.bytes_allocated);
        obj_ref
    }

    /// Copies `chars` into a new string object.
    pub fn copy_string(&mut self, chars: &str) -> ObjRef {
        self.allocate(Obj::String(ObjString::new(chars.into())))
    }

    /// Adopts an already owned buffer as a new string object.
    pub fn take_string(&mut self, chars: String) -> ObjRef {
        self.allocate(Obj::String(ObjString::new(chars.into_boxed_str())))
    }

    pub fn get(&self, obj_ref: ObjRef) -> Result<&Obj, ValueError> {
        if obj_ref.generation() != self.generation {
            return Err(ValueError::DanglingRef(obj_ref));
        }
        self.objects
            .get(obj_ref.index())
            .ok_or(ValueError::DanglingRef(obj_ref))
    }

    pub fn string(&self, obj_ref: ObjRef) -> Result<&ObjString, ValueError> {
        match self.get(obj_ref)? {
            Obj::String(s) => Ok(s),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Walks objects newest first, the order a sweep would visit them.
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, &Obj)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .rev()
            .map(move |(ix, obj)| (ObjRef::new(ix, self.generation), obj))
    }

    pub fn free_objects(&mut self) {
        log::debug!(
            "freeing {} objects ({} bytes)",
            self.objects.len(),
            self.bytes_allocated
        );
        self.objects = Vec::new();
        self.bytes_allocated = 0;
        self.generation = self.generation.wrapping_add(1);
    }
}
