//! Parameter commands and the undo stack that records them.

use glam::Vec3;

/// Set `param` on operator `op` to a string-encoded value.
///
/// Vectors are encoded as three space-separated floats. Floats use Rust's
/// shortest round-trip formatting, so parsing returns the exact value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCommand {
    pub op: String,
    pub param: String,
    pub value: String,
}

impl ParamCommand {
    pub fn new(op: impl Into<String>, param: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            param: param.into(),
            value: value.into(),
        }
    }

    pub fn vec3(op: &str, param: &str, v: Vec3) -> Self {
        Self::new(op, param, format!("{} {} {}", v.x, v.y, v.z))
    }

    pub fn float(op: &str, param: &str, v: f32) -> Self {
        Self::new(op, param, format!("{}", v))
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        parse_vec3(&self.value)
    }

    pub fn as_float(&self) -> Option<f32> {
        self.value.trim().parse().ok()
    }

    fn key(&self) -> (&str, &str) {
        (&self.op, &self.param)
    }
}

pub fn parse_vec3(value: &str) -> Option<Vec3> {
    let mut it = value.split_whitespace().map(|s| s.parse::<f32>());
    let v = Vec3::new(it.next()?.ok()?, it.next()?.ok()?, it.next()?.ok()?);
    if it.next().is_some() {
        return None;
    }
    Some(v)
}

/// Identifies an undo entry for [`CommandSink::execute_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// Where manipulators submit their edits.
pub trait CommandSink {
    /// Apply without recording an undo entry.
    fn execute(&mut self, batch: Vec<ParamCommand>);

    /// Apply and fold into an existing entry.
    fn execute_child(&mut self, batch: Vec<ParamCommand>, parent: EntryId);

    /// Apply as an undoable step. With `merge`, the batch joins the most
    /// recent entry instead of starting a new one.
    fn execute_undoable(&mut self, batch: Vec<ParamCommand>, merge: bool);
}

/// Reads and writes the parameters commands refer to.
pub trait ParamTarget {
    /// Current encoded value, if the parameter exists.
    fn param_value(&self, op: &str, param: &str) -> Option<String>;

    fn apply(&mut self, command: &ParamCommand);
}

#[derive(Debug, Clone, PartialEq)]
struct Change {
    command: ParamCommand,
    previous: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    id: EntryId,
    changes: Vec<Change>,
}

impl UndoEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Final value of every parameter the entry touches.
    pub fn commands(&self) -> impl Iterator<Item = &ParamCommand> {
        self.changes.iter().map(|c| &c.command)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Later commands for a parameter overwrite the recorded "after" value;
    /// the "before" value stays the one seen when the parameter first
    /// entered the entry.
    fn record<T: ParamTarget>(&mut self, target: &T, command: ParamCommand) {
        if let Some(change) = self
            .changes
            .iter_mut()
            .find(|c| c.command.key() == command.key())
        {
            change.command = command;
            return;
        }
        let previous = target.param_value(&command.op, &command.param);
        self.changes.push(Change { command, previous });
    }
}

/// Bounded undo/redo history over a [`ParamTarget`].
#[derive(Debug)]
pub struct UndoStack<T> {
    target: T,
    entries: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
    limit: usize,
    next_id: u64,
}

impl<T: ParamTarget> UndoStack<T> {
    pub fn new(target: T, limit: usize) -> Self {
        Self {
            target,
            entries: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            next_id: 1,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn top(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
    }

    fn trim(&mut self) {
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    fn push_entry(&mut self, batch: Vec<ParamCommand>) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        let mut entry = UndoEntry {
            id,
            changes: Vec::with_capacity(batch.len()),
        };
        for command in batch {
            entry.record(&self.target, command);
        }
        log::debug!("Undo entry {} created ({} changes)", id.0, entry.len());
        self.entries.push(entry);
        self.trim();
        id
    }

    fn apply_all(&mut self, commands: &[ParamCommand]) {
        for command in commands {
            self.target.apply(command);
        }
    }

    /// Revert the most recent entry. Returns its id.
    pub fn undo(&mut self) -> Option<EntryId> {
        let entry = self.entries.pop()?;
        for change in entry.changes.iter().rev() {
            if let Some(previous) = &change.previous {
                let revert = ParamCommand::new(
                    change.command.op.clone(),
                    change.command.param.clone(),
                    previous.clone(),
                );
                self.target.apply(&revert);
            }
        }
        let id = entry.id;
        self.redo.push(entry);
        Some(id)
    }

    /// Re-apply the most recently undone entry.
    pub fn redo(&mut self) -> Option<EntryId> {
        let entry = self.redo.pop()?;
        for change in &entry.changes {
            self.target.apply(&change.command);
        }
        let id = entry.id;
        self.entries.push(entry);
        Some(id)
    }
}

impl<T: ParamTarget> CommandSink for UndoStack<T> {
    fn execute(&mut self, batch: Vec<ParamCommand>) {
        self.apply_all(&batch);
    }

    fn execute_child(&mut self, batch: Vec<ParamCommand>, parent: EntryId) {
        if batch.is_empty() {
            return;
        }
        let Some(idx) = self.entries.iter().position(|e| e.id == parent) else {
            log::warn!("Undo entry {} no longer exists; recording a new one", parent.0);
            self.execute_undoable(batch, false);
            return;
        };
        self.redo.clear();
        for command in &batch {
            self.entries[idx].record(&self.target, command.clone());
        }
        self.apply_all(&batch);
    }

    fn execute_undoable(&mut self, batch: Vec<ParamCommand>, merge: bool) {
        if batch.is_empty() {
            return;
        }
        self.redo.clear();
        if merge && !self.entries.is_empty() {
            if let Some(top) = self.entries.last_mut() {
                for command in &batch {
                    top.record(&self.target, command.clone());
                }
            }
        } else {
            self.push_entry(batch.clone());
        }
        self.apply_all(&batch);
    }
}
