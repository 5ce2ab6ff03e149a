//! Append-only string intern pool, stored in a single relocatable byte
//! slice with open-addressed hashing. See the header comment on
//! [`StringTable`] for the on-disk layout.
use crate::error::StringTableError;

// Header layout, all fields little-endian u32:
//   0: total_bytes
//   4: count
//   8: slot_width_is_16 (0 or 1)
//  12: num_slots
//  16: used_string_bytes
const HEADER_LEN: usize = 20;
const OFF_TOTAL_BYTES: usize = 0;
const OFF_COUNT: usize = 4;
const OFF_SLOT_WIDTH_IS_16: usize = 8;
const OFF_NUM_SLOTS: usize = 12;
const OFF_USED_STRING_BYTES: usize = 16;

const MIN_SLOTS: usize = 8;
/// Smallest buffer `init` will accept: header, minimum slot array, and
/// room for a few short strings.
pub const MIN_BYTES: usize = HEADER_LEN + MIN_SLOTS * 4 + 64;

const SIXTEEN_BIT_LIMIT: usize = 0xFFFF;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SlotWidth {
    W16,
    W32,
}

impl SlotWidth {
    fn bytes(self) -> usize {
        match self {
            SlotWidth::W16 => 2,
            SlotWidth::W32 => 4,
        }
    }
}

fn slot_width_for(total_bytes: usize) -> SlotWidth {
    if total_bytes <= SIXTEEN_BIT_LIMIT {
        SlotWidth::W16
    } else {
        SlotWidth::W32
    }
}

fn slot_count_for_load_factor(count: usize) -> usize {
    // Load factor target is 2.0: slots >= 2 * entries.
    (count * 2).max(MIN_SLOTS).next_power_of_two()
}

/// The Lua 4.x string hash: folds a xor-shift over each byte. Walking the
/// string to hash it also yields its length, so callers get both in one
/// pass.
fn hash_bytes(s: &[u8]) -> u32 {
    let mut h: u32 = 0;
    for &b in s {
        h ^= (h << 5).wrapping_add(h >> 2).wrapping_add(b as u32);
    }
    h
}

/// A view over a byte slice laid out as a StringTable: header, then an
/// open-addressed slot array (16- or 32-bit entries), then a packed
/// string arena. Symbol 0 is the reserved empty string; any other
/// symbol id is the byte offset of its (NUL-terminated) bytes within the
/// arena, so [`StringTable::to_string`] is a direct slice, no indirection
/// table needed.
///
/// `StringTable` does not own its bytes; the owner (`ConfigData`) hands it
/// a `&mut [u8]` subslice of its single relocatable buffer for the
/// duration of each call.
pub(crate) struct StringTable<'a> {
    bytes: &'a mut [u8],
}

impl<'a> StringTable<'a> {
    /// Lay out an empty table in `bytes`. `avg_strlen` is only a sizing
    /// hint for the initial slot count; it does not change behavior.
    pub fn init(bytes: &'a mut [u8], avg_strlen: usize) -> StringTable<'a> {
        assert!(
            bytes.len() >= MIN_BYTES,
            "StringTable buffer must be at least {MIN_BYTES} bytes"
        );
        let total_bytes = bytes.len();
        let slot_width = slot_width_for(total_bytes);
        let mut num_slots = initial_slot_count(total_bytes, avg_strlen);
        while HEADER_LEN + num_slots * slot_width.bytes() + 1 > total_bytes && num_slots > MIN_SLOTS {
            num_slots /= 2;
        }
        for b in bytes.iter_mut() {
            *b = 0;
        }
        let mut st = StringTable { bytes };
        st.set_total_bytes(total_bytes as u32);
        st.set_count(0);
        st.set_slot_width_is_16(slot_width == SlotWidth::W16);
        st.set_num_slots(num_slots as u32);
        st.set_used_string_bytes(1); // arena[0] == 0u8: the empty string
        st
    }

    /// Resume operating on a slice that already holds a table laid out by
    /// `init`/`grow`/`pack`.
    pub fn from_existing(bytes: &'a mut [u8]) -> StringTable<'a> {
        StringTable { bytes }
    }

    // --- header accessors ---

    fn get_u32(&self, off: usize) -> u32 {
        u32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap())
    }

    fn set_u32(&mut self, off: usize, v: u32) {
        self.bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn total_bytes(&self) -> u32 {
        self.get_u32(OFF_TOTAL_BYTES)
    }

    fn set_total_bytes(&mut self, v: u32) {
        self.set_u32(OFF_TOTAL_BYTES, v);
    }

    pub fn count(&self) -> u32 {
        self.get_u32(OFF_COUNT)
    }

    fn set_count(&mut self, v: u32) {
        self.set_u32(OFF_COUNT, v);
    }

    fn slot_width_is_16(&self) -> bool {
        self.get_u32(OFF_SLOT_WIDTH_IS_16) != 0
    }

    fn set_slot_width_is_16(&mut self, v: bool) {
        self.set_u32(OFF_SLOT_WIDTH_IS_16, v as u32);
    }

    fn slot_width(&self) -> SlotWidth {
        if self.slot_width_is_16() {
            SlotWidth::W16
        } else {
            SlotWidth::W32
        }
    }

    pub fn num_slots(&self) -> u32 {
        self.get_u32(OFF_NUM_SLOTS)
    }

    fn set_num_slots(&mut self, v: u32) {
        self.set_u32(OFF_NUM_SLOTS, v);
    }

    pub fn used_string_bytes(&self) -> u32 {
        self.get_u32(OFF_USED_STRING_BYTES)
    }

    fn set_used_string_bytes(&mut self, v: u32) {
        self.set_u32(OFF_USED_STRING_BYTES, v);
    }

    fn arena_start(&self) -> usize {
        HEADER_LEN + self.num_slots() as usize * self.slot_width().bytes()
    }

    // --- slot array ---

    fn get_slot(&self, i: usize) -> u32 {
        let off = HEADER_LEN + i * self.slot_width().bytes();
        match self.slot_width() {
            SlotWidth::W16 => u16::from_le_bytes([self.bytes[off], self.bytes[off + 1]]) as u32,
            SlotWidth::W32 => u32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap()),
        }
    }

    fn set_slot(&mut self, i: usize, sym: u32) {
        let width = self.slot_width();
        let off = HEADER_LEN + i * width.bytes();
        match width {
            SlotWidth::W16 => {
                self.bytes[off..off + 2].copy_from_slice(&(sym as u16).to_le_bytes())
            }
            SlotWidth::W32 => self.bytes[off..off + 4].copy_from_slice(&sym.to_le_bytes()),
        }
    }

    // --- string arena ---

    /// Bytes of the string identified by `sym`, without the NUL
    /// terminator. Undefined (may panic or return garbage) if `sym` is
    /// not a symbol this table actually produced.
    pub fn to_string(&self, sym: u32) -> &[u8] {
        let start = self.arena_start() + sym as usize;
        let rest = &self.bytes[start..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        &rest[..len]
    }

    /// Intern `s`, returning its symbol id. Inserts if absent.
    pub fn to_symbol(&mut self, s: &str) -> Result<u32, StringTableError> {
        if s.is_empty() {
            return Ok(0);
        }
        let bytes = s.as_bytes();
        let hash = hash_bytes(bytes);
        let num_slots = self.num_slots() as usize;
        let mut idx = hash as usize % num_slots;
        for _ in 0..num_slots {
            let sym = self.get_slot(idx);
            if sym == 0 {
                return self.insert_at(idx, bytes);
            }
            if self.to_string(sym) == bytes {
                return Ok(sym);
            }
            idx = (idx + 1) % num_slots;
        }
        Err(StringTableError::Full)
    }

    /// Look up `s` without inserting.
    pub fn to_symbol_const(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        let bytes = s.as_bytes();
        let hash = hash_bytes(bytes);
        let num_slots = self.num_slots() as usize;
        let mut idx = hash as usize % num_slots;
        for _ in 0..num_slots {
            let sym = self.get_slot(idx);
            if sym == 0 {
                return None;
            }
            if self.to_string(sym) == bytes {
                return Some(sym);
            }
            idx = (idx + 1) % num_slots;
        }
        None
    }

    fn insert_at(&mut self, slot_idx: usize, bytes: &[u8]) -> Result<u32, StringTableError> {
        let arena_start = self.arena_start();
        let used = self.used_string_bytes() as usize;
        let needed = bytes.len() + 1;
        let capacity = self.total_bytes() as usize - arena_start;
        if used + needed > capacity {
            return Err(StringTableError::Full);
        }
        let new_sym = used as u32;
        // Check the 16-bit bound *before* mutating anything: committing
        // the write first and discovering overflow after (as the system
        // this is modeled on does) would leave the arena and header out
        // of sync with the slot array.
        if self.slot_width_is_16() && (new_sym as usize + bytes.len()) > SIXTEEN_BIT_LIMIT {
            return Err(StringTableError::Full);
        }
        let at = arena_start + used;
        self.bytes[at..at + bytes.len()].copy_from_slice(bytes);
        self.bytes[at + bytes.len()] = 0;
        self.set_used_string_bytes((used + needed) as u32);
        self.set_slot(slot_idx, new_sym);
        self.set_count(self.count() + 1);
        Ok(new_sym)
    }

    /// Rebuild the table into its current (post-resize) `bytes` slice:
    /// chooses a new slot width if the buffer crossed the 64 KiB
    /// boundary, memmoves the arena to its new position, and rebuilds
    /// the hash index by walking the arena and re-hashing each string.
    /// The caller must already have grown the underlying buffer to its
    /// new size before calling this.
    pub fn grow(&mut self) {
        let new_total = self.bytes.len();
        let target_slots =
            (self.num_slots() as usize * 2).max(slot_count_for_load_factor(self.count() as usize));
        self.relayout(new_total, target_slots);
    }

    /// Shrink the slot count to the minimum that satisfies the load
    /// factor target for the current entry count, memmove the arena
    /// down, rebuild the index, and update `total_bytes`. Returns the
    /// new (smaller) logical size; the caller may then shrink the
    /// physical buffer to match. All existing symbol ids remain valid,
    /// since they are offsets relative to the arena, and the arena's
    /// internal byte order is unchanged by packing.
    pub fn pack(&mut self) -> usize {
        let count = self.count() as usize;
        let used_string_bytes = self.used_string_bytes() as usize;
        let target_slots = slot_count_for_load_factor(count);
        let mut width = SlotWidth::W16;
        let mut new_total;
        loop {
            let arena_start = HEADER_LEN + target_slots * width.bytes();
            new_total = arena_start + used_string_bytes;
            let desired = slot_width_for(new_total);
            if desired == width {
                break;
            }
            width = desired;
        }
        self.relayout(new_total, target_slots);
        new_total
    }

    fn relayout(&mut self, new_total_bytes: usize, new_num_slots: usize) {
        let old_arena_start = self.arena_start();
        let used_string_bytes = self.used_string_bytes() as usize;
        let count = self.count();
        let arena_bytes = self.bytes[old_arena_start..old_arena_start + used_string_bytes].to_vec();

        let new_slot_width = slot_width_for(new_total_bytes);
        let new_arena_start = HEADER_LEN + new_num_slots * new_slot_width.bytes();
        assert!(
            new_arena_start + used_string_bytes <= new_total_bytes,
            "relayout target too small for existing string arena"
        );

        for b in self.bytes.iter_mut() {
            *b = 0;
        }
        self.set_total_bytes(new_total_bytes as u32);
        self.set_slot_width_is_16(new_slot_width == SlotWidth::W16);
        self.set_num_slots(new_num_slots as u32);
        self.set_used_string_bytes(used_string_bytes as u32);
        self.set_count(count);
        self.bytes[new_arena_start..new_arena_start + used_string_bytes]
            .copy_from_slice(&arena_bytes);
        self.reindex_all(new_arena_start, used_string_bytes);
    }

    fn reindex_all(&mut self, arena_start: usize, used_string_bytes: usize) {
        let num_slots = self.num_slots() as usize;
        let mut pos = 1usize; // symbol 0 (the empty string) never gets a slot
        while pos < used_string_bytes {
            let rest = &self.bytes[arena_start + pos..arena_start + used_string_bytes];
            let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            let sym = pos as u32;
            let str_bytes = self.bytes[arena_start + pos..arena_start + pos + len].to_vec();
            let hash = hash_bytes(&str_bytes);
            let mut idx = hash as usize % num_slots;
            loop {
                if self.get_slot(idx) == 0 {
                    self.set_slot(idx, sym);
                    break;
                }
                idx = (idx + 1) % num_slots;
            }
            pos += len + 1;
        }
    }
}

/// Read-only counterpart of [`StringTable`], for `&self` lookups on
/// `ConfigData` that must not mutate the embedded table.
pub(crate) struct StringTableView<'a> {
    bytes: &'a [u8],
}

impl<'a> StringTableView<'a> {
    pub fn new(bytes: &'a [u8]) -> StringTableView<'a> {
        StringTableView { bytes }
    }

    fn get_u32(&self, off: usize) -> u32 {
        u32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap())
    }

    fn num_slots(&self) -> u32 {
        self.get_u32(OFF_NUM_SLOTS)
    }

    fn slot_width_is_16(&self) -> bool {
        self.get_u32(OFF_SLOT_WIDTH_IS_16) != 0
    }

    fn slot_width(&self) -> SlotWidth {
        if self.slot_width_is_16() {
            SlotWidth::W16
        } else {
            SlotWidth::W32
        }
    }

    fn arena_start(&self) -> usize {
        HEADER_LEN + self.num_slots() as usize * self.slot_width().bytes()
    }

    fn get_slot(&self, i: usize) -> u32 {
        let off = HEADER_LEN + i * self.slot_width().bytes();
        match self.slot_width() {
            SlotWidth::W16 => u16::from_le_bytes([self.bytes[off], self.bytes[off + 1]]) as u32,
            SlotWidth::W32 => u32::from_le_bytes(self.bytes[off..off + 4].try_into().unwrap()),
        }
    }

    /// Byte range of symbol `sym` within the slice this view was built
    /// from, so a caller holding the original `&'_ [u8]` (e.g. `&self`
    /// of an owning `ConfigData`) can re-slice it directly rather than
    /// borrowing through this short-lived view.
    pub fn string_range(&self, sym: u32) -> (usize, usize) {
        let start = self.arena_start() + sym as usize;
        let rest = &self.bytes[start..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        (start, start + len)
    }

    pub fn to_string(&self, sym: u32) -> &[u8] {
        let (start, end) = self.string_range(sym);
        &self.bytes[start..end]
    }

    pub fn to_symbol_const(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        let bytes = s.as_bytes();
        let hash = hash_bytes(bytes);
        let num_slots = self.num_slots() as usize;
        let mut idx = hash as usize % num_slots;
        for _ in 0..num_slots {
            let sym = self.get_slot(idx);
            if sym == 0 {
                return None;
            }
            if self.to_string(sym) == bytes {
                return Some(sym);
            }
            idx = (idx + 1) % num_slots;
        }
        None
    }
}

fn initial_slot_count(total_bytes: usize, avg_strlen: usize) -> usize {
    let avg = avg_strlen.max(1) + 1;
    // Budget roughly a third of the buffer to the slot array, leaving
    // the rest for the string arena.
    let estimated_strings = (total_bytes.saturating_sub(HEADER_LEN) / (avg * 3)).max(1);
    slot_count_for_load_factor(estimated_strings)
}
