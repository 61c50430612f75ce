//! Temporary arrays handed back to scripts by id
//!
//! Lists are indexed by integer and grow on write. Maps keep insertion order
//! and replace the value of an existing key.

use crate::value::TaggedValue;
use indexmap::IndexMap;
use log::debug;

/// Length passed to `create_temp_array` to request a map
pub const MAP_LENGTH: i32 = -1;

/// Most elements a list may hold. Longer lengths and higher indices are
/// rejected before anything is allocated.
pub const MAX_LIST_LEN: usize = 1 << 20;

/// Id returned when an array cannot be created; never names an array
pub const NO_ARRAY: i32 = 0;

/// Key of a map entry. Floats and pointers are stored by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i32),
    Float(u32),
    String(u32),
    Pointer(usize),
}

impl From<TaggedValue> for ArrayKey {
    fn from(value: TaggedValue) -> Self {
        match value {
            TaggedValue::Int(v) => ArrayKey::Int(v),
            TaggedValue::Float(v) => ArrayKey::Float(v.to_bits()),
            TaggedValue::String(handle) => ArrayKey::String(handle),
            TaggedValue::Pointer(ptr) => ArrayKey::Pointer(ptr),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArray {
    List(Vec<TaggedValue>),
    Map(IndexMap<ArrayKey, (TaggedValue, TaggedValue)>),
}

impl ScriptArray {
    pub fn len(&self) -> usize {
        match self {
            ScriptArray::List(items) => items.len(),
            ScriptArray::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ScriptArray::Map(_))
    }

    /// Element at a list index, or the value stored under a map key
    pub fn get(&self, key: TaggedValue) -> Option<TaggedValue> {
        match self {
            ScriptArray::List(items) => {
                let index = key.as_int().ok()?;
                usize::try_from(index).ok().and_then(|i| items.get(i).copied())
            }
            ScriptArray::Map(entries) => entries.get(&ArrayKey::from(key)).map(|(_, v)| *v),
        }
    }

    /// Key at a position: the index itself for lists, the stored key for maps
    pub fn key_at(&self, index: i32) -> Option<TaggedValue> {
        let position = usize::try_from(index).ok()?;
        match self {
            ScriptArray::List(items) if position < items.len() => Some(TaggedValue::Int(index)),
            ScriptArray::List(_) => None,
            ScriptArray::Map(entries) => entries.get_index(position).map(|(_, (key, _))| *key),
        }
    }

    /// Map entries as `(key, value)` in insertion order; list elements keyed by index
    pub fn entries(&self) -> Vec<(TaggedValue, TaggedValue)> {
        match self {
            ScriptArray::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (TaggedValue::Int(i as i32), *v))
                .collect(),
            ScriptArray::Map(entries) => entries.values().copied().collect(),
        }
    }
}

/// Owner of every array created during a run. Ids start at 1.
#[derive(Debug)]
pub struct ArrayStore {
    arrays: IndexMap<i32, ScriptArray>,
    next_id: i32,
}

impl Default for ArrayStore {
    fn default() -> Self {
        ArrayStore::new()
    }
}

impl ArrayStore {
    pub fn new() -> Self {
        ArrayStore {
            arrays: IndexMap::new(),
            next_id: 1,
        }
    }

    /// A negative length creates a map, otherwise a list of integer zeros.
    /// A list longer than [`MAX_LIST_LEN`] is refused with [`NO_ARRAY`].
    pub fn create(&mut self, len: i32) -> i32 {
        let array = match usize::try_from(len) {
            Err(_) => ScriptArray::Map(IndexMap::new()),
            Ok(len) if len > MAX_LIST_LEN => {
                debug!("temp_array: length {} exceeds {}", len, MAX_LIST_LEN);
                return NO_ARRAY;
            }
            Ok(len) => ScriptArray::List(vec![TaggedValue::Int(0); len]),
        };

        let id = self.next_id;
        self.next_id += 1;
        self.arrays.insert(id, array);
        debug!("created temp array {} (len {})", id, len);
        id
    }

    pub fn get(&self, id: i32) -> Option<&ScriptArray> {
        self.arrays.get(&id)
    }

    /// Store `value` under `key`. Returns `false` for an unknown id or a
    /// list index that is not a non-negative number.
    pub fn set(&mut self, id: i32, key: TaggedValue, value: TaggedValue) -> bool {
        let Some(array) = self.arrays.get_mut(&id) else {
            debug!("set_array: no array with id {}", id);
            return false;
        };

        match array {
            ScriptArray::List(items) => {
                let index = match key.as_int().ok().and_then(|i| usize::try_from(i).ok()) {
                    Some(index) if index < MAX_LIST_LEN => index,
                    _ => {
                        debug!("set_array: bad list index {} for array {}", key, id);
                        return false;
                    }
                };
                if index >= items.len() {
                    items.resize(index + 1, TaggedValue::Int(0));
                }
                items[index] = value;
            }
            ScriptArray::Map(entries) => {
                entries.insert(ArrayKey::from(key), (key, value));
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_zero_filled_and_grows() {
        let mut store = ArrayStore::new();
        let id = store.create(2);
        assert_eq!(store.get(id).unwrap().len(), 2);
        assert_eq!(store.get(id).unwrap().get(TaggedValue::Int(1)), Some(TaggedValue::Int(0)));

        assert!(store.set(id, TaggedValue::Int(4), TaggedValue::Int(9)));
        let array = store.get(id).unwrap();
        assert_eq!(array.len(), 5);
        assert_eq!(array.get(TaggedValue::Int(4)), Some(TaggedValue::Int(9)));
        assert!(!store.set(id, TaggedValue::Int(-1), TaggedValue::Int(0)));
    }

    #[test]
    fn test_map_replaces_existing_key() {
        let mut store = ArrayStore::new();
        let id = store.create(MAP_LENGTH);
        assert!(store.get(id).unwrap().is_map());

        store.set(id, TaggedValue::String(3), TaggedValue::Int(1));
        store.set(id, TaggedValue::String(4), TaggedValue::Int(2));
        store.set(id, TaggedValue::String(3), TaggedValue::Int(7));

        let array = store.get(id).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.key_at(1), Some(TaggedValue::String(4)));
        assert_eq!(array.key_at(2), None);
        assert_eq!(
            array.entries(),
            vec![
                (TaggedValue::String(3), TaggedValue::Int(7)),
                (TaggedValue::String(4), TaggedValue::Int(2)),
            ]
        );
    }

    #[test]
    fn test_ids_are_distinct_and_unknown_ids_rejected() {
        let mut store = ArrayStore::new();
        let a = store.create(0);
        let b = store.create(0);
        assert_ne!(a, b);
        assert!(a > 0 && b > 0);
        assert!(!store.set(99, TaggedValue::Int(0), TaggedValue::Int(0)));
    }

    #[test]
    fn test_list_length_is_bounded() {
        let mut store = ArrayStore::new();
        assert_eq!(store.create(2_000_000_000), NO_ARRAY);
        assert_eq!(store.create(MAX_LIST_LEN as i32 + 1), NO_ARRAY);
        assert!(store.get(NO_ARRAY).is_none());
        assert!(store.is_empty());

        let id = store.create(MAX_LIST_LEN as i32);
        assert_ne!(id, NO_ARRAY);
        assert_eq!(store.get(id).unwrap().len(), MAX_LIST_LEN);
    }

    #[test]
    fn test_list_index_is_bounded() {
        let mut store = ArrayStore::new();
        let id = store.create(1);
        assert!(!store.set(id, TaggedValue::Int(2_000_000_000), TaggedValue::Int(1)));
        assert!(!store.set(id, TaggedValue::Int(MAX_LIST_LEN as i32), TaggedValue::Int(1)));
        assert_eq!(store.get(id).unwrap().len(), 1);

        assert!(store.set(id, TaggedValue::Int(MAX_LIST_LEN as i32 - 1), TaggedValue::Int(1)));
        assert_eq!(store.get(id).unwrap().len(), MAX_LIST_LEN);
    }
}
