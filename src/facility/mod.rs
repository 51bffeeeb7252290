//! Shared filesystem facility
//!
//! The facility is the indirection every instrumented filesystem call routes
//! through: a mutable table mapping operation names to their current
//! implementations. A monitor attaches by swapping measuring shims into the
//! table and detaches by swapping the originals back; callers keep invoking
//! the same names (or the typed convenience methods) throughout.

pub mod names;
pub mod ops;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MonitorError;

/// Error type for facility operations
#[derive(Debug, Error)]
pub enum OpError {
    /// No operation registered under the name
    #[error("Operation not found: {0}")]
    NotFound(String),

    /// The call envelope is missing something the operation needs
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation returned a payload the caller did not expect
    #[error("Unexpected output from operation: {operation}")]
    UnexpectedOutput { operation: String },

    /// IO error from the underlying operation, passed through unchanged
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Monitor misuse surfaced through a shim
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Call envelope carrying the arguments of one facility invocation
#[derive(Debug, Clone, Default)]
pub struct OpCall {
    /// Primary path the operation acts on
    pub path: PathBuf,
    /// Destination path for two-path operations (copy, rename, link)
    pub target: Option<PathBuf>,
    /// Payload for write-like operations
    pub data: Option<Vec<u8>>,
}

impl OpCall {
    /// Envelope for a single-path operation
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            target: None,
            data: None,
        }
    }

    /// Add a destination path
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add a payload
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Destination path, or an invalid-arguments error
    pub fn require_target(&self) -> Result<&Path, OpError> {
        self.target
            .as_deref()
            .ok_or_else(|| OpError::InvalidArguments("destination path is required".to_string()))
    }

    /// Payload, or an invalid-arguments error
    pub fn require_data(&self) -> Result<&[u8], OpError> {
        self.data
            .as_deref()
            .ok_or_else(|| OpError::InvalidArguments("payload is required".to_string()))
    }
}

/// Result payload of a facility operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutput {
    /// Operation with no payload
    Unit,
    /// File contents
    Bytes(Vec<u8>),
    /// Number of bytes written or copied
    Written(u64),
    /// Directory entries
    Entries(Vec<PathBuf>),
    /// File metadata
    Stat(FileStat),
    /// Boolean result
    Flag(bool),
    /// Resolved path
    Path(PathBuf),
}

/// Metadata subset surfaced by facility operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Size in bytes
    pub size: u64,
    /// Whether the path is a regular file
    pub is_file: bool,
    /// Whether the path is a directory
    pub is_dir: bool,
    /// Whether the path is a symbolic link
    pub is_symlink: bool,
    /// Whether the file is read-only
    pub readonly: bool,
    /// Last modification time, when the platform provides one
    pub modified: Option<SystemTime>,
}

impl From<fs::Metadata> for FileStat {
    fn from(meta: fs::Metadata) -> Self {
        let file_type = meta.file_type();
        Self {
            size: meta.len(),
            is_file: file_type.is_file(),
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            readonly: meta.permissions().readonly(),
            modified: meta.modified().ok(),
        }
    }
}

/// A named filesystem operation callable through the facility
pub trait FsOperation: Send + Sync {
    /// Unique name within the facility
    fn name(&self) -> &str;

    /// Perform the operation
    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError>;

    /// Original operation this entry wraps, when the entry is a shim
    ///
    /// Plain operations return `None`; a monitor's detach pass restores
    /// every entry that returns `Some`.
    fn restore_target(&self) -> Option<Arc<dyn FsOperation>> {
        None
    }
}

/// Mutable table of named filesystem operations shared across the process
pub struct FsFacility {
    ops: Mutex<HashMap<String, Arc<dyn FsOperation>>>,
}

impl FsFacility {
    /// Create an empty facility
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(HashMap::new()),
        }
    }

    /// Facility pre-populated with the standard operation set
    pub fn with_builtin_ops() -> Self {
        let facility = Self::new();
        for op in ops::builtin_ops() {
            facility.register(op);
        }
        facility
    }

    /// Register an operation under its own name, replacing any existing entry
    pub fn register(&self, op: Arc<dyn FsOperation>) {
        self.ops.lock().insert(op.name().to_string(), op);
    }

    /// Swap the entry under `name`, returning the previous entry
    pub fn replace(&self, name: &str, op: Arc<dyn FsOperation>) -> Option<Arc<dyn FsOperation>> {
        self.ops.lock().insert(name.to_string(), op)
    }

    /// Current entry under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn FsOperation>> {
        self.ops.lock().get(name).cloned()
    }

    /// Whether an operation is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.ops.lock().contains_key(name)
    }

    /// Registered operation names
    pub fn names(&self) -> Vec<String> {
        self.ops.lock().keys().cloned().collect()
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> Vec<(String, Arc<dyn FsOperation>)> {
        self.ops
            .lock()
            .iter()
            .map(|(name, op)| (name.clone(), op.clone()))
            .collect()
    }

    /// Invoke the operation registered under `name`
    ///
    /// The entry is resolved under the lock and invoked outside it, so an
    /// operation may itself call back into the facility.
    pub fn call(&self, name: &str, call: &OpCall) -> Result<OpOutput, OpError> {
        let op = self
            .get(name)
            .ok_or_else(|| OpError::NotFound(name.to_string()))?;
        op.invoke(call)
    }

    /// Read the full contents of a file
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, OpError> {
        match self.call(names::READ, &OpCall::new(path.as_ref()))? {
            OpOutput::Bytes(bytes) => Ok(bytes),
            _ => Err(unexpected(names::READ)),
        }
    }

    /// Create or overwrite a file; returns the number of bytes written
    pub fn write(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Result<u64, OpError> {
        match self.call(names::WRITE, &OpCall::new(path.as_ref()).with_data(data))? {
            OpOutput::Written(written) => Ok(written),
            _ => Err(unexpected(names::WRITE)),
        }
    }

    /// Append to a file, creating it if needed; returns the bytes written
    pub fn append(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Result<u64, OpError> {
        match self.call(names::APPEND, &OpCall::new(path.as_ref()).with_data(data))? {
            OpOutput::Written(written) => Ok(written),
            _ => Err(unexpected(names::APPEND)),
        }
    }

    /// Copy a file; returns the number of bytes copied
    pub fn copy_to(
        &self,
        path: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<u64, OpError> {
        let envelope = OpCall::new(path.as_ref()).with_target(target.as_ref());
        match self.call(names::COPY, &envelope)? {
            OpOutput::Written(written) => Ok(written),
            _ => Err(unexpected(names::COPY)),
        }
    }

    /// Rename or move a file or directory
    pub fn rename_to(
        &self,
        path: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<(), OpError> {
        let envelope = OpCall::new(path.as_ref()).with_target(target.as_ref());
        self.call(names::RENAME, &envelope).map(|_| ())
    }

    /// Remove a file
    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<(), OpError> {
        self.call(names::REMOVE_FILE, &OpCall::new(path.as_ref()))
            .map(|_| ())
    }

    /// Create a single directory
    pub fn create_dir(&self, path: impl AsRef<Path>) -> Result<(), OpError> {
        self.call(names::CREATE_DIR, &OpCall::new(path.as_ref()))
            .map(|_| ())
    }

    /// Create a directory and all missing parents
    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> Result<(), OpError> {
        self.call(names::CREATE_DIR_ALL, &OpCall::new(path.as_ref()))
            .map(|_| ())
    }

    /// Remove an empty directory
    pub fn remove_dir(&self, path: impl AsRef<Path>) -> Result<(), OpError> {
        self.call(names::REMOVE_DIR, &OpCall::new(path.as_ref()))
            .map(|_| ())
    }

    /// Remove a directory and everything under it
    pub fn remove_dir_all(&self, path: impl AsRef<Path>) -> Result<(), OpError> {
        self.call(names::REMOVE_DIR_ALL, &OpCall::new(path.as_ref()))
            .map(|_| ())
    }

    /// List the entries of a directory, sorted by path
    pub fn read_dir(&self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>, OpError> {
        match self.call(names::READ_DIR, &OpCall::new(path.as_ref()))? {
            OpOutput::Entries(entries) => Ok(entries),
            _ => Err(unexpected(names::READ_DIR)),
        }
    }

    /// Metadata of a file, following symlinks
    pub fn metadata(&self, path: impl AsRef<Path>) -> Result<FileStat, OpError> {
        match self.call(names::METADATA, &OpCall::new(path.as_ref()))? {
            OpOutput::Stat(stat) => Ok(stat),
            _ => Err(unexpected(names::METADATA)),
        }
    }

    /// Metadata of a file, not following symlinks
    pub fn symlink_metadata(&self, path: impl AsRef<Path>) -> Result<FileStat, OpError> {
        match self.call(names::SYMLINK_METADATA, &OpCall::new(path.as_ref()))? {
            OpOutput::Stat(stat) => Ok(stat),
            _ => Err(unexpected(names::SYMLINK_METADATA)),
        }
    }

    /// Whether a path exists
    pub fn try_exists(&self, path: impl AsRef<Path>) -> Result<bool, OpError> {
        match self.call(names::TRY_EXISTS, &OpCall::new(path.as_ref()))? {
            OpOutput::Flag(exists) => Ok(exists),
            _ => Err(unexpected(names::TRY_EXISTS)),
        }
    }

    /// Resolve a path to its canonical absolute form
    pub fn canonicalize(&self, path: impl AsRef<Path>) -> Result<PathBuf, OpError> {
        match self.call(names::CANONICALIZE, &OpCall::new(path.as_ref()))? {
            OpOutput::Path(resolved) => Ok(resolved),
            _ => Err(unexpected(names::CANONICALIZE)),
        }
    }

    /// Target of a symbolic link
    pub fn read_link(&self, path: impl AsRef<Path>) -> Result<PathBuf, OpError> {
        match self.call(names::READ_LINK, &OpCall::new(path.as_ref()))? {
            OpOutput::Path(resolved) => Ok(resolved),
            _ => Err(unexpected(names::READ_LINK)),
        }
    }

    /// Create a hard link at `target` pointing at `path`
    pub fn hard_link(
        &self,
        path: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<(), OpError> {
        let envelope = OpCall::new(path.as_ref()).with_target(target.as_ref());
        self.call(names::HARD_LINK, &envelope).map(|_| ())
    }
}

impl Default for FsFacility {
    fn default() -> Self {
        Self::new()
    }
}

fn unexpected(operation: &str) -> OpError {
    OpError::UnexpectedOutput {
        operation: operation.to_string(),
    }
}

/// Process-global facility routed through by default
static GLOBAL_FACILITY: LazyLock<Arc<FsFacility>> =
    LazyLock::new(|| Arc::new(FsFacility::with_builtin_ops()));

/// The shared process-wide facility
pub fn global_facility() -> Arc<FsFacility> {
    GLOBAL_FACILITY.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FlagOp {
        name: &'static str,
    }

    impl FsOperation for FlagOp {
        fn name(&self) -> &str {
            self.name
        }

        fn invoke(&self, _call: &OpCall) -> Result<OpOutput, OpError> {
            Ok(OpOutput::Flag(true))
        }
    }

    #[test]
    fn test_builtin_set_is_registered() {
        let facility = FsFacility::with_builtin_ops();

        assert!(facility.contains(names::READ));
        assert!(facility.contains(names::HARD_LINK));
        assert_eq!(facility.names().len(), 17);
    }

    #[test]
    fn test_unknown_operation_is_not_found() {
        let facility = FsFacility::new();

        let err = facility.call("missing", &OpCall::new("x")).unwrap_err();
        assert!(matches!(err, OpError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn test_replace_returns_previous_entry() {
        let facility = FsFacility::with_builtin_ops();
        let original = facility.get(names::READ).unwrap();

        let previous = facility
            .replace(names::READ, Arc::new(FlagOp { name: names::READ }))
            .unwrap();

        assert!(Arc::ptr_eq(&previous, &original));
        assert!(!Arc::ptr_eq(&facility.get(names::READ).unwrap(), &original));
    }

    #[test]
    fn test_unexpected_output_is_reported() {
        let facility = FsFacility::new();
        facility.register(Arc::new(FlagOp { name: names::READ }));

        let err = facility.read("x").unwrap_err();
        assert!(matches!(
            err,
            OpError::UnexpectedOutput { operation } if operation == names::READ
        ));
    }

    #[test]
    fn test_missing_envelope_fields_are_rejected() {
        let facility = FsFacility::with_builtin_ops();

        let err = facility
            .call(names::WRITE, &OpCall::new("x"))
            .unwrap_err();
        assert!(matches!(err, OpError::InvalidArguments(_)));

        let err = facility.call(names::COPY, &OpCall::new("x")).unwrap_err();
        assert!(matches!(err, OpError::InvalidArguments(_)));
    }

    #[test]
    fn test_typed_surface_round_trip() {
        let facility = FsFacility::with_builtin_ops();
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");

        assert_eq!(facility.write(&file, b"alpha".to_vec()).unwrap(), 5);
        assert_eq!(facility.append(&file, b"beta".to_vec()).unwrap(), 4);
        assert_eq!(facility.read(&file).unwrap(), b"alphabeta");

        let stat = facility.metadata(&file).unwrap();
        assert!(stat.is_file);
        assert_eq!(stat.size, 9);

        assert!(facility.try_exists(&file).unwrap());

        let copied = dir.path().join("copy.txt");
        assert_eq!(facility.copy_to(&file, &copied).unwrap(), 9);

        let entries = facility.read_dir(dir.path()).unwrap();
        assert_eq!(entries, vec![copied.clone(), file.clone()]);

        facility.remove_file(&copied).unwrap();
        assert!(!facility.try_exists(&copied).unwrap());
    }

    #[test]
    fn test_io_failures_pass_through() {
        let facility = FsFacility::with_builtin_ops();
        let dir = TempDir::new().unwrap();

        let err = facility.read(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(
            err,
            OpError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_directory_lifecycle() {
        let facility = FsFacility::with_builtin_ops();
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        facility.create_dir_all(&nested).unwrap();
        assert!(facility.metadata(&nested).unwrap().is_dir);

        facility.remove_dir(&nested).unwrap();
        facility.remove_dir_all(dir.path().join("a")).unwrap();
        assert!(!facility.try_exists(dir.path().join("a")).unwrap());
    }
}
