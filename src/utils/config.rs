//! Configuration constants shared by the tracer, transforms and output.

/// Current snapshot schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Stack depth recorded when the frame count is unavailable
pub const UNKNOWN_DEPTH: i32 = -1;

/// Member name the runtime uses for constructors
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Spaces per nesting level in the text rendering
pub const INDENT_SIZE: usize = 4;

/// Owners excluded unless `std_excludes` is turned off
pub const STANDARD_EXCLUDES: &[&str] = &["java.*", "javax.*", "sun.*", "com.sun.*", "junit.*"];

/// Default output format when none is requested
pub const DEFAULT_FORMAT: &str = "text";
