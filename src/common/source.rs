use std::{fs, io, path::PathBuf, rc::Rc};

/// Some literal source code, with an associated path
/// telling which file it came from.
/// A `Source` is reference-counted so that spans and the
/// parser can refer to it without copying the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub contents: String,
    pub path: PathBuf,
}

impl Source {
    /// Reads a file to create a new `Source`.
    pub fn path(path: &std::path::Path) -> io::Result<Rc<Source>> {
        let contents = fs::read_to_string(path)?;
        Ok(Rc::new(Source {
            contents,
            path: path.to_path_buf(),
        }))
    }

    /// Wraps a string in a `Source` not tied to a file on disk.
    pub fn source(contents: &str) -> Rc<Source> {
        Rc::new(Source {
            contents: contents.to_string(),
            path: PathBuf::from("./source"),
        })
    }
}
