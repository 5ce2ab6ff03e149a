//! The tagged-union value store: a single relocatable buffer holding a
//! header, a block-chained value region, and an embedded
//! [`StringTable`](crate::string_table::StringTable). See the module
//! header comment on [`ConfigData`] for the on-disk layout.
use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::Vec as RawVec;

use crate::loc::{Kind, Loc};
use crate::string_table::{StringTable, StringTableView};

// Header layout, all fields little-endian u32:
//   0: total_bytes          (whole buffer, header included)
//   4: value_region_bytes   (capacity of the value region)
//   8: used_value_bytes     (high-water mark within the value region)
//  12: root                 (Loc of the document root, or Loc::NULL)
const HEADER_LEN: usize = 16;
const OFF_TOTAL_BYTES: usize = 0;
const OFF_VALUE_REGION_BYTES: usize = 4;
const OFF_USED_VALUE_BYTES: usize = 8;
const OFF_ROOT: usize = 12;

const BLOCK_HEADER_LEN: usize = 12;
const NO_BLOCK: u32 = u32::MAX;
const DEFAULT_ARRAY_CAPACITY: u32 = 16;
const DEFAULT_OBJECT_CAPACITY: u32 = 16;

/// Default size of a freshly created `ConfigData`'s value region.
pub const DEFAULT_VALUE_BYTES: usize = 8 * 1024;
/// Default size of a freshly created `ConfigData`'s string table.
pub const DEFAULT_STRING_BYTES: usize = 8 * 1024;

fn align_up(x: usize, align: usize) -> usize {
    (x + align - 1) / align * align
}

struct BlockHeader {
    allocated_capacity: u32,
    used_count: u32,
    next_block: u32,
}

/// A relocatable, pointer-free store of JSON-shaped values: null, bool,
/// number, string, array, and object, addressed by [`Loc`] handles that
/// stay valid across any growth of the buffer.
///
/// Layout: a fixed header, then a value region growing by appending new
/// blocks (numbers, and the block-chained payloads of arrays/objects),
/// then an embedded [`StringTable`] occupying the remainder of the
/// buffer. Both regions grow independently; the string table always
/// sits at the tail so growing it never disturbs value-region offsets,
/// and growing the value region only ever shifts the string table's
/// bytes as a whole (a single `copy_within`), never rehashes it.
///
/// Arrays and objects are singly linked chains of blocks, each double
/// the capacity of the last, so that appending past a block's capacity
/// never invalidates `Loc`s already handed out to earlier elements —
/// unlike a realloc-in-place vector, where growth can move existing
/// elements.
pub struct ConfigData<A: Allocator = Global> {
    buf: RawVec<u8, A>,
}

impl ConfigData<Global> {
    /// A new, empty document backed by the global allocator, sized for
    /// typical configuration files.
    pub fn new() -> ConfigData<Global> {
        ConfigData::new_in(Global, DEFAULT_VALUE_BYTES, DEFAULT_STRING_BYTES)
    }

    /// Like [`ConfigData::new`], but with caller-chosen initial region
    /// sizes. Both regions still grow on demand; this only avoids the
    /// first few reallocations for documents of a known rough size.
    pub fn with_capacity(value_bytes: usize, string_bytes: usize) -> ConfigData<Global> {
        ConfigData::new_in(Global, value_bytes, string_bytes)
    }
}

impl Default for ConfigData<Global> {
    fn default() -> Self {
        ConfigData::new()
    }
}

impl<A: Allocator> ConfigData<A> {
    /// A new, empty document backed by `alloc`.
    pub fn new_in(alloc: A, value_bytes: usize, string_bytes: usize) -> ConfigData<A> {
        let string_bytes = string_bytes.max(crate::string_table::MIN_BYTES);
        let total = HEADER_LEN + value_bytes + string_bytes;
        let mut buf = RawVec::with_capacity_in(total, alloc);
        buf.resize(total, 0);
        {
            let st_start = HEADER_LEN + value_bytes;
            StringTable::init(&mut buf[st_start..total], 8);
        }
        let mut data = ConfigData { buf };
        data.set_total_bytes(total as u32);
        data.set_value_region_bytes(value_bytes as u32);
        data.set_used_value_bytes(0);
        data.set_root(Loc::NULL);
        data
    }

    // --- header accessors ---

    fn get_u32(&self, off: usize) -> u32 {
        u32::from_le_bytes(self.buf[off..off + 4].try_into().unwrap())
    }

    fn set_u32(&mut self, off: usize, v: u32) {
        self.buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn total_bytes(&self) -> u32 {
        self.get_u32(OFF_TOTAL_BYTES)
    }

    fn set_total_bytes(&mut self, v: u32) {
        self.set_u32(OFF_TOTAL_BYTES, v);
    }

    pub fn value_region_bytes(&self) -> u32 {
        self.get_u32(OFF_VALUE_REGION_BYTES)
    }

    fn set_value_region_bytes(&mut self, v: u32) {
        self.set_u32(OFF_VALUE_REGION_BYTES, v);
    }

    pub fn used_value_bytes(&self) -> u32 {
        self.get_u32(OFF_USED_VALUE_BYTES)
    }

    fn set_used_value_bytes(&mut self, v: u32) {
        self.set_u32(OFF_USED_VALUE_BYTES, v);
    }

    /// The document's root value, or `Loc::NULL` if nothing has been set.
    pub fn root(&self) -> Loc {
        Loc::from_bits(self.get_u32(OFF_ROOT))
    }

    /// Set the document's root value. Parsers and callers building a
    /// document by hand both go through this.
    pub fn set_root(&mut self, loc: Loc) {
        self.set_u32(OFF_ROOT, loc.to_bits());
    }

    // --- value region ---

    fn value_region(&self) -> &[u8] {
        let end = HEADER_LEN + self.value_region_bytes() as usize;
        &self.buf[HEADER_LEN..end]
    }

    fn value_region_mut(&mut self) -> &mut [u8] {
        let end = HEADER_LEN + self.value_region_bytes() as usize;
        &mut self.buf[HEADER_LEN..end]
    }

    fn read_u32_at(&self, off: usize) -> u32 {
        let vr = self.value_region();
        u32::from_le_bytes(vr[off..off + 4].try_into().unwrap())
    }

    fn write_u32_at(&mut self, off: usize, v: u32) {
        let vr = self.value_region_mut();
        vr[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn read_f64_at(&self, off: usize) -> f64 {
        let vr = self.value_region();
        f64::from_le_bytes(vr[off..off + 8].try_into().unwrap())
    }

    fn write_f64_at(&mut self, off: usize, v: f64) {
        let vr = self.value_region_mut();
        vr[off..off + 8].copy_from_slice(&v.to_le_bytes());
    }

    fn read_block_header(&self, off: usize) -> BlockHeader {
        BlockHeader {
            allocated_capacity: self.read_u32_at(off),
            used_count: self.read_u32_at(off + 4),
            next_block: self.read_u32_at(off + 8),
        }
    }

    fn write_block_header(&mut self, off: usize, h: &BlockHeader) {
        self.write_u32_at(off, h.allocated_capacity);
        self.write_u32_at(off + 4, h.used_count);
        self.write_u32_at(off + 8, h.next_block);
    }

    /// Bump-allocate `len` bytes at `align`-byte alignment within the
    /// value region, growing it first if needed. Returns the
    /// value-region-relative offset of the new allocation.
    fn alloc_value(&mut self, len: usize, align: usize) -> u32 {
        let used = self.used_value_bytes() as usize;
        let padded = align_up(used, align);
        let end = padded + len;
        if end > self.value_region_bytes() as usize {
            self.grow_value_region_to(end);
        }
        self.set_used_value_bytes(end as u32);
        padded as u32
    }

    /// Grow the value region to at least `min_required` bytes, doubling
    /// each step. The string table, which follows it in the buffer, is
    /// memmoved to its new tail position; its own bytes are untouched,
    /// so no rehash is needed.
    fn grow_value_region_to(&mut self, min_required: usize) {
        let old_vrb = self.value_region_bytes() as usize;
        let mut new_vrb = old_vrb.max(64);
        while new_vrb < min_required {
            new_vrb *= 2;
        }
        if new_vrb == old_vrb {
            return;
        }
        let old_total = self.total_bytes() as usize;
        let new_total = old_total + (new_vrb - old_vrb);
        self.buf.resize(new_total, 0);
        let st_start_old = HEADER_LEN + old_vrb;
        let st_start_new = HEADER_LEN + new_vrb;
        self.buf.copy_within(st_start_old..old_total, st_start_new);
        self.buf[st_start_old..st_start_new].fill(0);
        self.set_total_bytes(new_total as u32);
        self.set_value_region_bytes(new_vrb as u32);
    }

    // --- string table ---

    fn string_table_range(&self) -> (usize, usize) {
        let start = HEADER_LEN + self.value_region_bytes() as usize;
        (start, self.total_bytes() as usize)
    }

    /// Intern `s` into the embedded string table, growing it (and
    /// retrying) as many times as necessary. Returns the symbol id.
    pub(crate) fn intern(&mut self, s: &str) -> u32 {
        loop {
            let (start, end) = self.string_table_range();
            let mut st = StringTable::from_existing(&mut self.buf[start..end]);
            if let Ok(sym) = st.to_symbol(s) {
                return sym;
            }
            self.grow_string_table();
        }
    }

    fn grow_string_table(&mut self) {
        let (start, old_total) = self.string_table_range();
        let old_st_bytes = old_total - start;
        let new_st_bytes = (old_st_bytes * 2).max(crate::string_table::MIN_BYTES);
        let new_total = start + new_st_bytes;
        self.buf.resize(new_total, 0);
        {
            let mut st = StringTable::from_existing(&mut self.buf[start..new_total]);
            st.grow();
        }
        self.set_total_bytes(new_total as u32);
    }

    fn to_symbol_const(&self, s: &str) -> Option<u32> {
        let (start, end) = self.string_table_range();
        StringTableView::new(&self.buf[start..end]).to_symbol_const(s)
    }

    fn string_bytes(&self, sym: u32) -> &[u8] {
        let (st_start, st_end) = self.string_table_range();
        let (rel_start, rel_end) = StringTableView::new(&self.buf[st_start..st_end]).string_range(sym);
        &self.buf[st_start + rel_start..st_start + rel_end]
    }

    /// Shrink the embedded string table to the minimum size its current
    /// contents need, then truncate the buffer to match. Returns the
    /// new total buffer size.
    pub fn pack_strings(&mut self) -> usize {
        let (start, end) = self.string_table_range();
        let new_st_bytes = {
            let mut st = StringTable::from_existing(&mut self.buf[start..end]);
            st.pack()
        };
        let new_total = start + new_st_bytes;
        self.buf.truncate(new_total);
        self.buf.shrink_to_fit();
        self.set_total_bytes(new_total as u32);
        new_total
    }

    // --- scalars ---

    /// The kind of value a `Loc` refers to. Does not consult the
    /// document; it is decoded entirely from the handle itself.
    pub fn kind(&self, loc: Loc) -> Kind {
        loc.kind()
    }

    /// Store `n` as a new Number value, returning its `Loc`.
    pub fn add_number(&mut self, n: f64) -> Loc {
        let off = self.alloc_value(8, 8);
        self.write_f64_at(off as usize, n);
        Loc::pack(Kind::Number, off)
    }

    /// Read the Number value `loc` refers to, or `None` if it isn't one.
    pub fn to_number(&self, loc: Loc) -> Option<f64> {
        if loc.kind() != Kind::Number {
            return None;
        }
        Some(self.read_f64_at(loc.offset() as usize))
    }

    /// Intern `s` and return it as a new String `Loc`.
    pub fn add_string(&mut self, s: &str) -> Loc {
        let sym = self.intern(s);
        Loc::pack(Kind::String, sym)
    }

    /// Read the String value `loc` refers to, or `None` if it isn't one
    /// or its bytes aren't valid UTF-8 (which should not happen for any
    /// `Loc` this `ConfigData` produced itself).
    pub fn to_str(&self, loc: Loc) -> Option<&str> {
        if loc.kind() != Kind::String {
            return None;
        }
        std::str::from_utf8(self.string_bytes(loc.offset())).ok()
    }

    // --- arrays ---

    /// Start a new, empty Array value with room for `capacity` items
    /// before it needs a second block (0 picks a default).
    pub fn add_array(&mut self, capacity: u32) -> Loc {
        let cap = if capacity == 0 {
            DEFAULT_ARRAY_CAPACITY
        } else {
            capacity
        };
        let block_len = BLOCK_HEADER_LEN + cap as usize * 4;
        let off = self.alloc_value(block_len, 4);
        self.write_block_header(
            off as usize,
            &BlockHeader {
                allocated_capacity: cap,
                used_count: 0,
                next_block: NO_BLOCK,
            },
        );
        Loc::pack(Kind::Array, off)
    }

    /// Number of items in `arr`, across its whole block chain.
    pub fn array_len(&self, arr: Loc) -> u32 {
        debug_assert_eq!(arr.kind(), Kind::Array);
        let mut off = arr.offset() as usize;
        let mut total = 0u32;
        loop {
            let h = self.read_block_header(off);
            total += h.used_count;
            if h.next_block == NO_BLOCK {
                return total;
            }
            off = h.next_block as usize;
        }
    }

    /// The item at `index` in `arr`, or `Loc::NULL` if out of bounds.
    pub fn array_item(&self, arr: Loc, index: u32) -> Loc {
        if arr.kind() != Kind::Array {
            return Loc::NULL;
        }
        let mut off = arr.offset() as usize;
        let mut remaining = index;
        loop {
            let h = self.read_block_header(off);
            if remaining < h.used_count {
                let entry_off = off + BLOCK_HEADER_LEN + remaining as usize * 4;
                return Loc::from_bits(self.read_u32_at(entry_off));
            }
            remaining -= h.used_count;
            if h.next_block == NO_BLOCK {
                return Loc::NULL;
            }
            off = h.next_block as usize;
        }
    }

    /// Append `item` to `arr`, linking a new block double the size of
    /// the last one if the current tail block is full.
    pub fn push(&mut self, arr: Loc, item: Loc) {
        debug_assert_eq!(arr.kind(), Kind::Array);
        let mut off = arr.offset() as usize;
        loop {
            let h = self.read_block_header(off);
            if h.used_count < h.allocated_capacity {
                let entry_off = off + BLOCK_HEADER_LEN + h.used_count as usize * 4;
                self.write_u32_at(entry_off, item.to_bits());
                self.write_u32_at(off + 4, h.used_count + 1);
                return;
            }
            if h.next_block != NO_BLOCK {
                off = h.next_block as usize;
                continue;
            }
            let new_cap = h.allocated_capacity * 2;
            let new_block_len = BLOCK_HEADER_LEN + new_cap as usize * 4;
            let new_off = self.alloc_value(new_block_len, 4);
            self.write_block_header(
                new_off as usize,
                &BlockHeader {
                    allocated_capacity: new_cap,
                    used_count: 0,
                    next_block: NO_BLOCK,
                },
            );
            self.write_u32_at(off + 8, new_off);
            off = new_off as usize;
        }
    }

    // --- objects ---

    /// Start a new, empty Object value with room for `capacity` entries
    /// before it needs a second block (0 picks a default).
    pub fn add_object(&mut self, capacity: u32) -> Loc {
        let cap = if capacity == 0 {
            DEFAULT_OBJECT_CAPACITY
        } else {
            capacity
        };
        let block_len = BLOCK_HEADER_LEN + cap as usize * 8;
        let off = self.alloc_value(block_len, 4);
        self.write_block_header(
            off as usize,
            &BlockHeader {
                allocated_capacity: cap,
                used_count: 0,
                next_block: NO_BLOCK,
            },
        );
        Loc::pack(Kind::Object, off)
    }

    /// Number of entries in `obj`, across its whole block chain.
    pub fn object_len(&self, obj: Loc) -> u32 {
        debug_assert_eq!(obj.kind(), Kind::Object);
        let mut off = obj.offset() as usize;
        let mut total = 0u32;
        loop {
            let h = self.read_block_header(off);
            total += h.used_count;
            if h.next_block == NO_BLOCK {
                return total;
            }
            off = h.next_block as usize;
        }
    }

    fn object_entry_at(&self, obj: Loc, index: u32) -> Option<usize> {
        if obj.kind() != Kind::Object {
            return None;
        }
        let mut off = obj.offset() as usize;
        let mut remaining = index;
        loop {
            let h = self.read_block_header(off);
            if remaining < h.used_count {
                return Some(off + BLOCK_HEADER_LEN + remaining as usize * 8);
            }
            remaining -= h.used_count;
            if h.next_block == NO_BLOCK {
                return None;
            }
            off = h.next_block as usize;
        }
    }

    /// The key at `index` in `obj`, as a String `Loc`, or `Loc::NULL` if
    /// out of bounds.
    pub fn object_key_loc(&self, obj: Loc, index: u32) -> Loc {
        match self.object_entry_at(obj, index) {
            Some(entry_off) => Loc::from_bits(self.read_u32_at(entry_off)),
            None => Loc::NULL,
        }
    }

    /// The value at `index` in `obj`, or `Loc::NULL` if out of bounds.
    pub fn object_value(&self, obj: Loc, index: u32) -> Loc {
        match self.object_entry_at(obj, index) {
            Some(entry_off) => Loc::from_bits(self.read_u32_at(entry_off + 4)),
            None => Loc::NULL,
        }
    }

    /// Find `key` in `obj` by string comparison (via the interned
    /// symbol, not a linear byte scan) and return its value, or
    /// `Loc::NULL` if absent or `key` was never interned at all.
    pub fn object_lookup(&self, obj: Loc, key: &str) -> Loc {
        let sym = match self.to_symbol_const(key) {
            Some(sym) => sym,
            None => return Loc::NULL,
        };
        let target = Loc::pack(Kind::String, sym).to_bits();
        debug_assert_eq!(obj.kind(), Kind::Object);
        let mut off = obj.offset() as usize;
        loop {
            let h = self.read_block_header(off);
            for i in 0..h.used_count {
                let entry_off = off + BLOCK_HEADER_LEN + i as usize * 8;
                if self.read_u32_at(entry_off) == target {
                    return Loc::from_bits(self.read_u32_at(entry_off + 4));
                }
            }
            if h.next_block == NO_BLOCK {
                return Loc::NULL;
            }
            off = h.next_block as usize;
        }
    }

    /// Set `obj[key_loc] = value`, overwriting any existing entry for
    /// that key, or appending a new one (linking a new block if the
    /// tail block is full).
    pub fn set_loc(&mut self, obj: Loc, key_loc: Loc, value: Loc) {
        debug_assert_eq!(obj.kind(), Kind::Object);
        let key_bits = key_loc.to_bits();
        let mut off = obj.offset() as usize;
        loop {
            let h = self.read_block_header(off);
            for i in 0..h.used_count {
                let entry_off = off + BLOCK_HEADER_LEN + i as usize * 8;
                if self.read_u32_at(entry_off) == key_bits {
                    self.write_u32_at(entry_off + 4, value.to_bits());
                    return;
                }
            }
            if h.next_block != NO_BLOCK {
                off = h.next_block as usize;
                continue;
            }
            if h.used_count < h.allocated_capacity {
                let entry_off = off + BLOCK_HEADER_LEN + h.used_count as usize * 8;
                self.write_u32_at(entry_off, key_bits);
                self.write_u32_at(entry_off + 4, value.to_bits());
                self.write_u32_at(off + 4, h.used_count + 1);
                return;
            }
            let new_cap = h.allocated_capacity * 2;
            let new_block_len = BLOCK_HEADER_LEN + new_cap as usize * 8;
            let new_off = self.alloc_value(new_block_len, 4);
            self.write_block_header(
                new_off as usize,
                &BlockHeader {
                    allocated_capacity: new_cap,
                    used_count: 0,
                    next_block: NO_BLOCK,
                },
            );
            self.write_u32_at(off + 8, new_off);
            off = new_off as usize;
        }
    }

    /// Intern `key` and set `obj[key] = value`. Equivalent to
    /// `set_loc(obj, self.add_string(key), value)` but does not waste a
    /// value-region Loc on the key string (the interned symbol is
    /// packed directly).
    pub fn set(&mut self, obj: Loc, key: &str, value: Loc) {
        let sym = self.intern(key);
        let key_loc = Loc::pack(Kind::String, sym);
        self.set_loc(obj, key_loc, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_roundtrip() {
        let mut data = ConfigData::new();
        let n = data.add_number(3.5);
        assert_eq!(data.to_number(n), Some(3.5));
        let s = data.add_string("hello");
        assert_eq!(data.to_str(s), Some("hello"));
        assert_eq!(data.kind(Loc::NULL), Kind::Null);
        assert_eq!(data.kind(Loc::TRUE), Kind::True);
    }

    #[test]
    fn array_push_and_index() {
        let mut data = ConfigData::new();
        let arr = data.add_array(0);
        for i in 0..5 {
            let n = data.add_number(i as f64);
            data.push(arr, n);
        }
        assert_eq!(data.array_len(arr), 5);
        for i in 0..5 {
            let item = data.array_item(arr, i);
            assert_eq!(data.to_number(item), Some(i as f64));
        }
        assert_eq!(data.array_item(arr, 5), Loc::NULL);
    }

    #[test]
    fn array_grows_past_initial_block() {
        let mut data = ConfigData::new();
        let arr = data.add_array(2);
        for i in 0..50 {
            let n = data.add_number(i as f64);
            data.push(arr, n);
        }
        assert_eq!(data.array_len(arr), 50);
        for i in 0..50 {
            assert_eq!(data.to_number(data.array_item(arr, i)), Some(i as f64));
        }
    }

    #[test]
    fn object_set_and_lookup() {
        let mut data = ConfigData::new();
        let obj = data.add_object(0);
        let one = data.add_number(1.0);
        data.set(obj, "a", one);
        let two = data.add_number(2.0);
        data.set(obj, "b", two);
        assert_eq!(data.to_number(data.object_lookup(obj, "a")), Some(1.0));
        assert_eq!(data.to_number(data.object_lookup(obj, "b")), Some(2.0));
        assert_eq!(data.object_lookup(obj, "c"), Loc::NULL);
        assert_eq!(data.object_len(obj), 2);
    }

    #[test]
    fn object_set_overwrites_existing_key() {
        let mut data = ConfigData::new();
        let obj = data.add_object(0);
        let one = data.add_number(1.0);
        data.set(obj, "a", one);
        let replacement = data.add_number(99.0);
        data.set(obj, "a", replacement);
        assert_eq!(data.object_len(obj), 1);
        assert_eq!(data.to_number(data.object_lookup(obj, "a")), Some(99.0));
    }

    #[test]
    fn object_grows_past_initial_block() {
        let mut data = ConfigData::new();
        let obj = data.add_object(2);
        for i in 0..40 {
            let key = format!("k{i}");
            let v = data.add_number(i as f64);
            data.set(obj, &key, v);
        }
        assert_eq!(data.object_len(obj), 40);
        for i in 0..40 {
            let key = format!("k{i}");
            assert_eq!(
                data.to_number(data.object_lookup(obj, &key)),
                Some(i as f64)
            );
        }
    }

    #[test]
    fn object_keys_are_string_locs() {
        let mut data = ConfigData::new();
        let obj = data.add_object(0);
        let v = data.add_number(7.0);
        data.set(obj, "x", v);
        let key_loc = data.object_key_loc(obj, 0);
        assert_eq!(key_loc.kind(), Kind::String);
        assert_eq!(data.to_str(key_loc), Some("x"));
        assert_eq!(data.object_value(obj, 0), v);
    }

    #[test]
    fn value_region_grows_without_disturbing_existing_locs() {
        let mut data = ConfigData::with_capacity(64, crate::string_table::MIN_BYTES);
        let first = data.add_number(1.0);
        for i in 0..200 {
            data.add_string(&format!("padding-{i}"));
        }
        assert_eq!(data.to_number(first), Some(1.0));
    }

    #[test]
    fn string_table_grows_without_disturbing_existing_locs() {
        let mut data = ConfigData::with_capacity(DEFAULT_VALUE_BYTES, 128);
        let mut locs = Vec::new();
        for i in 0..500 {
            locs.push(data.add_string(&format!("string number {i}")));
        }
        for (i, loc) in locs.iter().enumerate() {
            assert_eq!(data.to_str(*loc), Some(format!("string number {i}").as_str()));
        }
    }

    #[test]
    fn pack_strings_shrinks_and_preserves_values() {
        let mut data = ConfigData::with_capacity(DEFAULT_VALUE_BYTES, DEFAULT_VALUE_BYTES);
        let before = data.total_bytes();
        let s = data.add_string("short");
        data.pack_strings();
        assert!(data.total_bytes() < before);
        assert_eq!(data.to_str(s), Some("short"));
    }

    #[test]
    fn root_defaults_to_null_and_roundtrips() {
        let mut data = ConfigData::new();
        assert_eq!(data.root(), Loc::NULL);
        let obj = data.add_object(0);
        data.set_root(obj);
        assert_eq!(data.root(), obj);
    }
}
