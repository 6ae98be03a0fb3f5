//! Recursive listing of plain file names.
use std::fs;
use std::io;
use std::path::Path;

/// Recursively collects the base names of every plain file under `folder`.
///
/// Entries are visited in name order. Symbolic links to files are listed;
/// symbolic links to directories are never followed, so link cycles cannot
/// make the walk loop.
///
/// # Examples
///
/// ```no_run
/// use sortdir::file_lister::list_files;
/// use std::path::Path;
///
/// let names = list_files(Path::new("/path/to/AUDIO")).unwrap();
/// println!("{} files", names.len());
/// ```
pub fn list_files(folder: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    collect_files(folder, &mut files)?;
    Ok(files)
}

fn collect_files(folder: &Path, files: &mut Vec<String>) -> io::Result<()> {
    let mut entries = fs::read_dir(folder)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(())
}
