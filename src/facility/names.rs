//! Canonical operation names
//!
//! All operation-name checks should use these constants instead of
//! hardcoding strings.

/// Read the full contents of a file
pub const READ: &str = "read";
/// Create or overwrite a file with a payload
pub const WRITE: &str = "write";
/// Append a payload to a file, creating it if needed
pub const APPEND: &str = "append";
/// Copy a file to a destination path
pub const COPY: &str = "copy";
/// Rename or move a file or directory
pub const RENAME: &str = "rename";
/// Remove a file
pub const REMOVE_FILE: &str = "remove_file";
/// Create a single directory
pub const CREATE_DIR: &str = "create_dir";
/// Create a directory and all missing parents
pub const CREATE_DIR_ALL: &str = "create_dir_all";
/// Remove an empty directory
pub const REMOVE_DIR: &str = "remove_dir";
/// Remove a directory and everything under it
pub const REMOVE_DIR_ALL: &str = "remove_dir_all";
/// List the entries of a directory
pub const READ_DIR: &str = "read_dir";
/// Metadata of a file, following symlinks
pub const METADATA: &str = "metadata";
/// Metadata of a file, not following symlinks
pub const SYMLINK_METADATA: &str = "symlink_metadata";
/// Whether a path exists
pub const TRY_EXISTS: &str = "try_exists";
/// Resolve a path to its canonical absolute form
pub const CANONICALIZE: &str = "canonicalize";
/// Target of a symbolic link
pub const READ_LINK: &str = "read_link";
/// Create a hard link at a destination path
pub const HARD_LINK: &str = "hard_link";

/// Reserved for operations that hand out live file handles
pub const OPEN: &str = "open";
/// Reserved for operations that hand out live writer handles
pub const CREATE: &str = "create";
/// Reserved for operations that hand out change watchers
pub const WATCH: &str = "watch";
