use crate::task::Task;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared slot holding one live task.
///
/// The registry and an in-flight tick pass both hold the slot; identity
/// (`Rc::ptr_eq`) tells whether a name still refers to the same task.
pub(crate) type TaskSlot = Rc<RefCell<Task>>;

/// Name-keyed task registry that iterates in insertion order.
///
/// Lookups go through a name index. Removal leaves a hole in `entries`; the
/// holes are compacted away once they outnumber the live tasks.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Option<(String, TaskSlot)>>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&TaskSlot> {
        let idx = *self.index.get(name)?;
        self.entries
            .get(idx)
            .and_then(Option::as_ref)
            .map(|(_, slot)| slot)
    }

    /// Whether `name` still maps to exactly this slot.
    pub(crate) fn is_current(&self, name: &str, slot: &TaskSlot) -> bool {
        self.get(name).is_some_and(|current| Rc::ptr_eq(current, slot))
    }

    /// Append a new entry. Hands the slot back if the name is taken.
    pub(crate) fn insert(&mut self, name: String, slot: TaskSlot) -> Result<(), TaskSlot> {
        if self.contains(&name) {
            return Err(slot);
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Some((name, slot)));
        Ok(())
    }

    /// Swap the task stored under `name`, keeping its position.
    /// Hands the new slot back if the name is unknown.
    pub(crate) fn replace(&mut self, name: &str, slot: TaskSlot) -> Result<TaskSlot, TaskSlot> {
        let current = self
            .index
            .get(name)
            .and_then(|&idx| self.entries.get_mut(idx))
            .and_then(Option::as_mut);
        match current {
            Some((_, current)) => Ok(std::mem::replace(current, slot)),
            None => Err(slot),
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<TaskSlot> {
        let idx = self.index.remove(name)?;
        let (_, slot) = self.entries.get_mut(idx)?.take()?;
        if self.index.len() * 2 < self.entries.len() {
            self.compact();
        }
        Some(slot)
    }

    /// Remove `name` only if it still refers to `slot`.
    pub(crate) fn remove_if_current(&mut self, name: &str, slot: &TaskSlot) -> Option<TaskSlot> {
        if self.is_current(name, slot) {
            self.remove(name)
        } else {
            None
        }
    }

    /// Take every entry out, leaving the registry empty.
    pub(crate) fn drain(&mut self) -> Vec<TaskSlot> {
        self.index.clear();
        std::mem::take(&mut self.entries)
            .into_iter()
            .flatten()
            .map(|(_, slot)| slot)
            .collect()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.live().map(|(name, _)| name.clone()).collect()
    }

    /// Copy of the entries, for iterating while the registry changes underneath.
    pub(crate) fn snapshot(&self) -> Vec<(String, TaskSlot)> {
        self.live()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect()
    }

    fn live(&self) -> impl Iterator<Item = &(String, TaskSlot)> {
        self.entries.iter().flatten()
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        for (idx, (name, _)) in self.entries.iter().flatten().enumerate() {
            if let Some(position) = self.index.get_mut(name) {
                *position = idx;
            }
        }
    }
}
