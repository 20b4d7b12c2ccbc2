use std::collections::HashSet;

use tracing::{debug, trace};

use crate::columns::{ColumnId, ColumnSet};
use crate::domain::RosterError;

/// Display order of the columns. Always a permutation of the column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    ids: Vec<ColumnId>,
}

impl ColumnOrder {
    pub fn new(ids: Vec<ColumnId>) -> Result<Self, RosterError> {
        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RosterError::DuplicateColumn(dup.to_string()));
        }
        Ok(Self { ids })
    }

    pub fn from_set(columns: &ColumnSet) -> Self {
        Self {
            ids: columns.ids().collect(),
        }
    }

    pub fn ids(&self) -> &[ColumnId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<ColumnId> {
        self.ids.get(position).copied()
    }

    pub fn position(&self, id: ColumnId) -> Option<usize> {
        self.ids.iter().position(|c| *c == id)
    }

    fn require(&self, id: ColumnId) -> Result<usize, RosterError> {
        self.position(id)
            .ok_or_else(|| RosterError::UnknownColumn(id.to_string()))
    }

    /// Moves `source` to just before `target`. Returns whether the order changed.
    pub fn reorder(&mut self, source: ColumnId, target: ColumnId) -> Result<bool, RosterError> {
        let from = self.require(source)?;
        self.require(target)?;
        if source == target {
            return Ok(false);
        }

        let mut next = self.ids.clone();
        next.remove(from);
        let to = next.iter().position(|c| *c == target).unwrap_or(next.len());
        next.insert(to, source);

        let changed = next != self.ids;
        debug!("Reorder {source} before {target}: {:?} -> {:?}", self.ids, next);
        self.ids = next;
        Ok(changed)
    }

    /// True if the order holds every id of `columns` exactly once.
    pub fn is_permutation_of(&self, columns: &ColumnSet) -> bool {
        let own: HashSet<ColumnId> = self.ids.iter().copied().collect();
        let all: HashSet<ColumnId> = columns.ids().collect();
        own.len() == self.ids.len() && own == all
    }
}

/// A completed drag and drop gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDrop {
    pub source: ColumnId,
    pub target: ColumnId,
}

/// Per gesture state: `Idle -> Dragging -> Over* -> drop -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: ColumnId,
    },
    Over {
        source: ColumnId,
        target: ColumnId,
    },
}

impl DragState {
    /// Starts a gesture. Refused while another one is in flight.
    pub fn begin(&mut self, source: ColumnId) -> bool {
        match self {
            DragState::Idle => {
                trace!("Drag start {source}");
                *self = DragState::Dragging { source };
                true
            }
            _ => false,
        }
    }

    pub fn hover(&mut self, target: ColumnId) {
        if let Some(source) = self.source() {
            *self = DragState::Over { source, target };
        }
    }

    /// The pointer left every drop target, the gesture keeps its source.
    pub fn leave(&mut self) {
        if let Some(source) = self.source() {
            *self = DragState::Dragging { source };
        }
    }

    /// Ends the gesture. Yields a drop only for a target other than the source.
    pub fn release(&mut self) -> Option<ColumnDrop> {
        let state = std::mem::take(self);
        match state {
            DragState::Over { source, target } if source != target => {
                trace!("Drop {source} on {target}");
                Some(ColumnDrop { source, target })
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn source(&self) -> Option<ColumnId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { source } | DragState::Over { source, .. } => Some(*source),
        }
    }

    pub fn target(&self) -> Option<ColumnId> {
        match self {
            DragState::Over { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}
