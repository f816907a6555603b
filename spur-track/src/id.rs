// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Id

/// IDs that are unique across one evaluation
///
/// Each _log_/_trace_ event within the application is tagged with the ID of
/// the entity that emitted it.
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Id(pub u64);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
