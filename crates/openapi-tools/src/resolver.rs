//! `OpenAPI` `$ref` resolver.
//!
//! The `openapiv3` crate models `$ref`s using `ReferenceOr<T>` but does not resolve them. Only
//! references local to the document (`#/...`) are supported; the document is fully in memory by
//! the time a catalog is built.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::ReferenceOr;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct LocalResolver<'a> {
    root: &'a Value,
}

impl<'a> LocalResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { root }
    }

    /// Follow a chain of `$ref`s until an inline item is reached.
    ///
    /// # Errors
    ///
    /// Returns an error for external or dangling references, reference cycles, and targets that
    /// do not deserialize as `T`.
    pub fn resolve<T>(&self, r: &ReferenceOr<T>) -> Result<T>
    where
        T: Clone + DeserializeOwned,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut cur: ReferenceOr<T> = r.clone();

        loop {
            match cur {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    if !seen.insert(reference.clone()) {
                        return Err(OpenApiToolsError::SpecParse(format!(
                            "Cyclic $ref detected while resolving: {reference}",
                        )));
                    }

                    let value = self.lookup(&reference)?;
                    cur = serde_json::from_value(value.clone()).map_err(|e| {
                        OpenApiToolsError::SpecParse(format!(
                            "Failed to deserialize referenced value '{reference}' as expected type: {e}",
                        ))
                    })?;
                }
            }
        }
    }

    /// Look up the raw JSON a local reference points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is not local or the pointer does not exist.
    pub fn lookup(&self, reference: &str) -> Result<&'a Value> {
        let Some(fragment) = reference.strip_prefix('#') else {
            return Err(OpenApiToolsError::SpecParse(format!(
                "External $ref '{reference}' is not supported (only '#/...' references are)",
            )));
        };

        if fragment.is_empty() {
            return Ok(self.root);
        }

        if !fragment.starts_with('/') {
            return Err(OpenApiToolsError::SpecParse(format!(
                "Unsupported $ref fragment (expected JSON pointer starting with '/'): {reference}",
            )));
        }

        self.root.pointer(fragment).ok_or_else(|| {
            OpenApiToolsError::SpecParse(format!(
                "Unresolved $ref '{reference}' (missing pointer '{fragment}')",
            ))
        })
    }
}
