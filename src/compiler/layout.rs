//! Object layout oracle
//!
//! Instance fields live in the object, not in registers: every access goes
//! through the receiver. The interference builder asks this oracle which
//! symbols are fields, and the code generator asks for their byte offsets
//! and for object sizes.
//!
//! Each class is laid out on its own, starting at offset 0. A subclass
//! object begins with its superclass's fields at the same offsets, followed
//! by its own fields in declaration order. Every field takes one word.

use std::collections::HashMap;

use super::CompileError;
use super::ir::{SymbolId, SymbolKind, SymbolTable};

/// Size of one field slot in bytes
pub const WORD_SIZE: usize = 4;

pub trait ObjectLayout {
    fn is_instance_field(&self, sym: SymbolId) -> bool;
    fn field_offset(&self, sym: SymbolId) -> Option<usize>;
    /// Object size in bytes, inherited fields included
    fn class_size(&self, class: SymbolId) -> Option<usize>;
}

/// Per-class field offsets
#[derive(Debug, Clone, Default)]
pub struct ObjectLayoutManager {
    /// Class -> every field of its objects, inherited ones first
    classes: HashMap<SymbolId, Vec<SymbolId>>,
    /// Fields declared outside any class share one anonymous object
    unowned: Vec<SymbolId>,
    offsets: HashMap<SymbolId, usize>,
}

impl ObjectLayoutManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out every class of the table together with its fields
    ///
    /// Superclasses are declared before their subclasses, so declaration
    /// order is also a valid layout order.
    pub fn from_symbols(symbols: &SymbolTable) -> Result<Self, CompileError> {
        let mut own_fields: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
        let mut unowned = Vec::new();
        for (id, info) in symbols.iter() {
            if info.kind != SymbolKind::Field {
                continue;
            }
            match info.owner {
                Some(class) if symbols.kind(class) == Some(SymbolKind::Class) => {
                    own_fields.entry(class).or_default().push(id);
                }
                _ => unowned.push(id),
            }
        }

        let mut layout = Self::new();
        for (class, info) in symbols.iter() {
            if info.kind != SymbolKind::Class {
                continue;
            }
            let fields = own_fields.remove(&class).unwrap_or_default();
            layout
                .add_class(class, info.owner, &fields)
                .map_err(|err| match (err, info.owner) {
                    (CompileError::UnknownParentClass { .. }, Some(parent)) => {
                        CompileError::UnknownParentClass {
                            class: symbols.name(class),
                            parent: symbols.name(parent),
                        }
                    }
                    (err, _) => err,
                })?;
        }

        for field in unowned {
            layout.add_field(field);
        }

        tracing::trace!(
            classes = layout.classes.len(),
            fields = layout.offsets.len(),
            "object layout"
        );
        Ok(layout)
    }

    /// Append a field to the anonymous object
    pub fn add_field(&mut self, sym: SymbolId) -> usize {
        if let Some(&offset) = self.offsets.get(&sym) {
            return offset;
        }
        let offset = self.unowned.len() * WORD_SIZE;
        self.unowned.push(sym);
        self.offsets.insert(sym, offset);
        offset
    }

    /// Lay out `class`: the fields of `parent` first, then `fields`
    ///
    /// The parent must already be laid out. Returns the object size in bytes.
    pub fn add_class(
        &mut self,
        class: SymbolId,
        parent: Option<SymbolId>,
        fields: &[SymbolId],
    ) -> Result<usize, CompileError> {
        let mut slots = match parent {
            Some(parent) => self.classes.get(&parent).cloned().ok_or_else(|| {
                CompileError::UnknownParentClass {
                    class: class.to_string(),
                    parent: parent.to_string(),
                }
            })?,
            None => Vec::new(),
        };
        slots.extend_from_slice(fields);

        for (slot, field) in slots.iter().enumerate() {
            self.offsets.insert(*field, slot * WORD_SIZE);
        }
        let size = slots.len() * WORD_SIZE;
        self.classes.insert(class, slots);
        Ok(size)
    }

    /// Fields of a class's objects in slot order
    pub fn fields_of(&self, class: SymbolId) -> Option<&[SymbolId]> {
        self.classes.get(&class).map(Vec::as_slice)
    }
}

impl ObjectLayout for ObjectLayoutManager {
    fn is_instance_field(&self, sym: SymbolId) -> bool {
        self.offsets.contains_key(&sym)
    }

    fn field_offset(&self, sym: SymbolId) -> Option<usize> {
        self.offsets.get(&sym).copied()
    }

    fn class_size(&self, class: SymbolId) -> Option<usize> {
        self.classes.get(&class).map(|fields| fields.len() * WORD_SIZE)
    }
}
