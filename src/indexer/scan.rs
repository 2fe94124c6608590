use crate::error::MasterIndexError;
use crate::indexer::CandidateFile;
use crate::indexer::IndexOptions;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Lists the candidate workbooks directly inside `directory`, sorted by file name.
///
/// The directory is canonicalized first, so candidate paths carry no `..` or
/// linked folders. Only regular files (or links to them) whose extension
/// matches the options are kept; the output file is excluded by exact name.
pub(crate) fn scan_candidates(directory: &Path, options: &IndexOptions) -> Result<Vec<CandidateFile>, MasterIndexError> {
    let access = |source: io::Error| MasterIndexError::DirectoryAccess {
        path: directory.to_path_buf(),
        source,
    };
    let root = dunce::canonicalize(directory).map_err(access)?;

    let mut candidates = Vec::new();
    for entry in fs::read_dir(&root).map_err(access)? {
        let entry = entry.map_err(access)?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name == options.output_file_name {
            debug!(file = %file_name, "skipping previous index output");
            continue;
        }
        if !options.matches_extension(Path::new(&file_name)) {
            continue;
        }
        let path = root.join(entry.file_name());
        if !path.is_file() {
            debug!(file = %file_name, "skipping non-file entry");
            continue;
        }
        debug!(file = %file_name, "found candidate");
        candidates.push(CandidateFile { file_name, path });
    }
    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}
