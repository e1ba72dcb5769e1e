use std::fs;
use std::path::Path;

use crate::RepoError;

/// Initialize a new repository.
///
/// Creates `<path>/.git/` with:
/// - `objects/`
/// - `refs/` and `refs/heads/`
/// - `HEAD` pointing at `refs/heads/master`
/// - an empty v2 index
pub fn init_repository(path: &Path) -> Result<(), RepoError> {
    let git_dir = path.join(".git");

    // Re-running init on an existing repository is a safe no-op; existing
    // data is never overwritten.
    if git_dir.join("HEAD").is_file() {
        return Ok(());
    }

    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;

    fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n")?;

    mingit_index::write_empty(git_dir.join("index"))?;

    Ok(())
}
