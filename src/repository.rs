//! Storage for the assembled library.
//!
//! The library is a single persisted table with no transactional guarantees.
//! Two builders racing on a missing library both write it; the last writer
//! wins. Both write the same content for the same sources.

use std::{
    cell::RefCell,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    consistency::CONSISTENCY_COLUMN,
    error::LookupError,
    frame::Frame,
    library::{COLOR_COLUMN, PRODUCT_COLUMN},
    manifest,
    tabular::{self, ReadOptions},
};

pub trait LibraryRepository {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<Frame, LookupError>;
    fn save(&self, library: &Frame) -> Result<(), LookupError>;
    /// Drops the persisted library so the next build starts from the sources.
    fn invalidate(&self) -> Result<(), LookupError>;
}

#[derive(Debug, Clone)]
pub struct FileLibraryRepository {
    path: PathBuf,
}

impl FileLibraryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> LookupError {
        LookupError::LibraryCorrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl LibraryRepository for FileLibraryRepository {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Frame, LookupError> {
        let frame = tabular::read_table(&self.path, &ReadOptions::default())
            .map_err(|err| self.corrupt(format!("{err:#}")))?;
        for required in [PRODUCT_COLUMN, COLOR_COLUMN] {
            if frame.find_column(required).is_none() {
                return Err(self.corrupt(format!("missing '{required}' column")));
            }
        }
        debug!(
            "Loaded library {:?}: {} row(s), {} column(s)",
            self.path,
            frame.len(),
            frame.width()
        );
        Ok(frame)
    }

    fn save(&self, library: &Frame) -> Result<(), LookupError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| LookupError::Storage {
                path: parent.to_path_buf(),
                reason: err.to_string(),
            })?;
        }
        tabular::write_table(library, Some(&self.path), None)
            .map_err(|err| LookupError::storage(&self.path, &err))?;
        info!("Library written to {:?} ({} row(s))", self.path, library.len());
        Ok(())
    }

    fn invalidate(&self) -> Result<(), LookupError> {
        for path in [self.path.clone(), manifest::manifest_path(&self.path)] {
            match fs::remove_file(&path) {
                Ok(()) => info!("Removed {:?}", path),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(LookupError::Storage {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Keeps the library in memory; used for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryLibraryRepository {
    stored: RefCell<Option<Frame>>,
}

impl MemoryLibraryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(library: Frame) -> Self {
        Self {
            stored: RefCell::new(Some(library)),
        }
    }
}

impl LibraryRepository for MemoryLibraryRepository {
    fn exists(&self) -> bool {
        self.stored.borrow().is_some()
    }

    fn load(&self) -> Result<Frame, LookupError> {
        self.stored
            .borrow()
            .clone()
            .ok_or_else(|| LookupError::LibraryCorrupt {
                path: PathBuf::from("<memory>"),
                reason: "no library stored".to_string(),
            })
    }

    fn save(&self, library: &Frame) -> Result<(), LookupError> {
        *self.stored.borrow_mut() = Some(library.clone());
        Ok(())
    }

    fn invalidate(&self) -> Result<(), LookupError> {
        self.stored.borrow_mut().take();
        Ok(())
    }
}

/// Counts rows flagged `Mismatch` in a stored library.
pub fn count_mismatches(library: &Frame) -> usize {
    library
        .find_column(CONSISTENCY_COLUMN)
        .map(|idx| {
            library
                .column_values(idx)
                .filter(|value| value.trim().eq_ignore_ascii_case("mismatch"))
                .count()
        })
        .unwrap_or(0)
}
