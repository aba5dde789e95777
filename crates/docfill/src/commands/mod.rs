//! CLI command implementations.

pub(crate) mod replace;
pub(crate) mod scan;
pub(crate) mod validate_pattern;

pub(crate) use replace::ReplaceArgs;
pub(crate) use scan::ScanArgs;
pub(crate) use validate_pattern::ValidatePatternArgs;
