// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use spur_track::entity::{Entity, toplevel};
use spur_track::test_helpers::create_tracker;

/// Create the top-level entity for a test, logging everything to a file
/// named after the test source.
#[must_use]
pub fn start_test(full_filepath: &str) -> Rc<Entity> {
    toplevel(&create_tracker(full_filepath), "top")
}
