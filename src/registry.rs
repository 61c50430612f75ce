//! Name -> handler table for operations called by name
//!
//! Entries are fixed at first use. Lookup is an exact, case-sensitive match.

use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::metarules;
use indexmap::IndexMap;

/// Most arguments a named call can carry
pub const MAX_METARULE_ARGS: usize = 8;

/// Handler of a named operation. It receives the argument count and must
/// pop exactly that many values and push exactly one.
pub type MetaruleHandler = fn(&mut dyn ScriptContext, usize) -> Result<(), BridgeError>;

#[derive(Clone, Copy)]
pub struct OperationEntry {
    pub name: &'static str,
    pub handler: MetaruleHandler,
    pub min_args: usize,
    pub max_args: usize,
}

impl OperationEntry {
    const fn new(
        name: &'static str,
        handler: MetaruleHandler,
        min_args: usize,
        max_args: usize,
    ) -> Self {
        OperationEntry {
            name,
            handler,
            min_args,
            max_args,
        }
    }

    pub fn accepts(&self, args: usize) -> bool {
        self.min_args <= args && args <= self.max_args
    }
}

impl std::fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({}..={})", self.name, self.min_args, self.max_args)
    }
}

const METARULE_TABLE: &[OperationEntry] = &[
    OperationEntry::new("floor2", metarules::mf_floor2, 1, 1),
    OperationEntry::new("get_ini_section", metarules::mf_get_ini_section, 2, 2),
    OperationEntry::new("get_ini_sections", metarules::mf_get_ini_sections, 1, 1),
    OperationEntry::new("get_metarule_table", metarules::mf_get_metarule_table, 0, 0),
    OperationEntry::new("metarule_exist", metarules::mf_metarule_exist, 1, 1),
    OperationEntry::new("set_ini_setting", metarules::mf_set_ini_setting, 2, 2),
    OperationEntry::new("string_compare", metarules::mf_string_compare, 2, 3),
    OperationEntry::new("string_find", metarules::mf_string_find, 2, 3),
    OperationEntry::new("string_format", metarules::mf_string_format, 2, 8),
    OperationEntry::new("string_to_case", metarules::mf_string_to_case, 2, 2),
];

lazy_static! {
    static ref METARULES: IndexMap<&'static str, OperationEntry> = METARULE_TABLE
        .iter()
        .map(|entry| (entry.name, *entry))
        .collect();
}

pub fn lookup(name: &str) -> Option<&'static OperationEntry> {
    METARULES.get(name)
}

pub fn exists(name: &str) -> bool {
    METARULES.contains_key(name)
}

/// Registered names in table order
pub fn names() -> impl Iterator<Item = &'static str> {
    METARULES.keys().copied()
}
