//! Typed collection and document paths.
//!
//! Document databases alternate collection and document segments:
//! `institutions` is a collection, `institutions/abc` a document,
//! `institutions/abc/departments` a collection again. [`CollectionPath`] always has an odd
//! number of segments and [`DocPath`] an even number, so the two cannot be confused.

use std::fmt;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// The document with `id` inside this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Name of the last segment, e.g. `students` for `institutions/a/departments/b/students`.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Parses a `/`-separated collection path.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if segments.len() % 2 == 0 {
            return Err(invalid(raw, "collection paths need an odd number of segments"));
        }

        let path = Self { segments };
        path.validate()?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        validate_segments(&self.segments, &self.to_string())
    }
}

impl DocPath {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    /// A subcollection nested under this document.
    pub fn collection(&self, name: impl Into<String>) -> CollectionPath {
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(name.into());
        CollectionPath { segments }
    }

    /// Parses a `/`-separated document path.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let mut segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if segments.len() % 2 != 0 {
            return Err(invalid(raw, "document paths need an even number of segments"));
        }

        let id = segments
            .pop()
            .ok_or_else(|| invalid(raw, "document path is empty"))?;
        let path = Self {
            collection: CollectionPath { segments },
            id,
        };
        path.validate()?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        self.collection.validate()?;
        validate_segments(std::slice::from_ref(&self.id), &self.to_string())
    }
}

fn validate_segments(segments: &[String], raw: &str) -> Result<(), StoreError> {
    for segment in segments {
        if segment.is_empty() {
            return Err(invalid(raw, "empty segment"));
        }
        if segment.contains('/') {
            return Err(invalid(raw, "segment contains '/'"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid(raw, "relative segment"));
        }
    }
    Ok(())
}

fn invalid(raw: &str, reason: &str) -> StoreError {
    StoreError::InvalidPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
