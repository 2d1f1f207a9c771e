// Library surface of the celldelta CLI, shared with the binary and its tests

pub mod compare;
pub mod report;
