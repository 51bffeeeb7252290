//! Builtin operations wrapping `std::fs`

use std::fs;
use std::io::Write;
use std::sync::Arc;

use super::names;
use super::{FsOperation, OpCall, OpError, OpOutput};

/// The standard operation set registered by `FsFacility::with_builtin_ops`
pub(crate) fn builtin_ops() -> Vec<Arc<dyn FsOperation>> {
    vec![
        Arc::new(ReadFile),
        Arc::new(WriteFile),
        Arc::new(AppendFile),
        Arc::new(Copy),
        Arc::new(Rename),
        Arc::new(RemoveFile),
        Arc::new(CreateDir),
        Arc::new(CreateDirAll),
        Arc::new(RemoveDir),
        Arc::new(RemoveDirAll),
        Arc::new(ReadDir),
        Arc::new(Metadata),
        Arc::new(SymlinkMetadata),
        Arc::new(TryExists),
        Arc::new(Canonicalize),
        Arc::new(ReadLink),
        Arc::new(HardLink),
    ]
}

/// `std::fs::read`
pub struct ReadFile;

impl FsOperation for ReadFile {
    fn name(&self) -> &str {
        names::READ
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Bytes(fs::read(&call.path)?))
    }
}

/// `std::fs::write`
pub struct WriteFile;

impl FsOperation for WriteFile {
    fn name(&self) -> &str {
        names::WRITE
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let data = call.require_data()?;
        fs::write(&call.path, data)?;
        Ok(OpOutput::Written(data.len() as u64))
    }
}

/// Append with create, `OpenOptions::append`
pub struct AppendFile;

impl FsOperation for AppendFile {
    fn name(&self) -> &str {
        names::APPEND
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let data = call.require_data()?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&call.path)?;
        file.write_all(data)?;
        Ok(OpOutput::Written(data.len() as u64))
    }
}

/// `std::fs::copy`
pub struct Copy;

impl FsOperation for Copy {
    fn name(&self) -> &str {
        names::COPY
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let target = call.require_target()?;
        Ok(OpOutput::Written(fs::copy(&call.path, target)?))
    }
}

/// `std::fs::rename`
pub struct Rename;

impl FsOperation for Rename {
    fn name(&self) -> &str {
        names::RENAME
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let target = call.require_target()?;
        fs::rename(&call.path, target)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::remove_file`
pub struct RemoveFile;

impl FsOperation for RemoveFile {
    fn name(&self) -> &str {
        names::REMOVE_FILE
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        fs::remove_file(&call.path)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::create_dir`
pub struct CreateDir;

impl FsOperation for CreateDir {
    fn name(&self) -> &str {
        names::CREATE_DIR
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        fs::create_dir(&call.path)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::create_dir_all`
pub struct CreateDirAll;

impl FsOperation for CreateDirAll {
    fn name(&self) -> &str {
        names::CREATE_DIR_ALL
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        fs::create_dir_all(&call.path)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::remove_dir`
pub struct RemoveDir;

impl FsOperation for RemoveDir {
    fn name(&self) -> &str {
        names::REMOVE_DIR
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        fs::remove_dir(&call.path)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::remove_dir_all`
pub struct RemoveDirAll;

impl FsOperation for RemoveDirAll {
    fn name(&self) -> &str {
        names::REMOVE_DIR_ALL
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        fs::remove_dir_all(&call.path)?;
        Ok(OpOutput::Unit)
    }
}

/// `std::fs::read_dir`, entries sorted by path
pub struct ReadDir;

impl FsOperation for ReadDir {
    fn name(&self) -> &str {
        names::READ_DIR
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&call.path)? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(OpOutput::Entries(entries))
    }
}

/// `std::fs::metadata`
pub struct Metadata;

impl FsOperation for Metadata {
    fn name(&self) -> &str {
        names::METADATA
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Stat(fs::metadata(&call.path)?.into()))
    }
}

/// `std::fs::symlink_metadata`
pub struct SymlinkMetadata;

impl FsOperation for SymlinkMetadata {
    fn name(&self) -> &str {
        names::SYMLINK_METADATA
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Stat(fs::symlink_metadata(&call.path)?.into()))
    }
}

/// `std::path::Path::try_exists`
pub struct TryExists;

impl FsOperation for TryExists {
    fn name(&self) -> &str {
        names::TRY_EXISTS
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Flag(call.path.try_exists()?))
    }
}

/// `std::fs::canonicalize`
pub struct Canonicalize;

impl FsOperation for Canonicalize {
    fn name(&self) -> &str {
        names::CANONICALIZE
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Path(fs::canonicalize(&call.path)?))
    }
}

/// `std::fs::read_link`
pub struct ReadLink;

impl FsOperation for ReadLink {
    fn name(&self) -> &str {
        names::READ_LINK
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        Ok(OpOutput::Path(fs::read_link(&call.path)?))
    }
}

/// `std::fs::hard_link`
pub struct HardLink;

impl FsOperation for HardLink {
    fn name(&self) -> &str {
        names::HARD_LINK
    }

    fn invoke(&self, call: &OpCall) -> Result<OpOutput, OpError> {
        let target = call.require_target()?;
        fs::hard_link(&call.path, target)?;
        Ok(OpOutput::Unit)
    }
}
