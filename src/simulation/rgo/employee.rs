use crate::simulation::{PopRef, PopSize, PopTypeId};

/// The part of one pop an operation hired today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Employee {
    pop: PopRef,
    pop_type: PopTypeId,
    size: PopSize,
}

impl Employee {
    pub fn new(pop: PopRef, pop_type: PopTypeId, size: PopSize) -> Self {
        Self {
            pop,
            pop_type,
            size,
        }
    }

    pub fn pop(&self) -> PopRef {
        self.pop
    }

    pub fn pop_type(&self) -> PopTypeId {
        self.pop_type
    }

    pub fn size(&self) -> PopSize {
        self.size
    }
}
