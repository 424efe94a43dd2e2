use crate::collection::document::{validate_document_id, Document};
use crate::collection::find_options::FindOptions;
use crate::collection::operation::find_plan::{plan_find, FindPlan};
use crate::collection::operation::OperationContext;
use crate::common::SYSTEM_PREFIX;
use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::query::{matches_document, parse_query, FieldCondition};
use serde_json::Value;
use std::sync::Arc;

/// Query execution for a single collection.
///
/// Runs the plan chosen by the planner against the store: a bare listing,
/// a server-side tag search (optionally with an in-memory residual), or a
/// full scan. Results stream lazily, so pagination stops fetching as soon
/// as `offset + limit` hits have been produced.
#[derive(Clone)]
pub(crate) struct ReadOperations {
    ctx: Arc<OperationContext>,
}

impl ReadOperations {
    pub fn new(ctx: Arc<OperationContext>) -> Self {
        ReadOperations { ctx }
    }

    /// Reads a single document by id.
    pub fn get_by_id(&self, id: &str) -> StratusResult<Document> {
        validate_document_id(id)?;
        match self.ctx.store.get(&self.ctx.container, id)? {
            Some(blob) => {
                let mut document = Document::from_bytes(&blob.bytes)?;
                if document.id().is_none() {
                    document.set_id(id);
                }
                Ok(document)
            }
            None => {
                log::error!("Document {} not found in {}", id, self.ctx.container);
                Err(StratusError::new(
                    &format!("Document {} not found", id),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Finds documents matching a document-shaped predicate.
    pub fn find(&self, query: &Value, options: &FindOptions) -> StratusResult<Vec<Document>> {
        let conditions = parse_query(query)?;
        let catalog = self.ctx.catalogs.load(&self.ctx.container)?;
        let plan = plan_find(&conditions, &catalog);
        log::debug!("Find in {} uses plan: {}", self.ctx.container, plan);

        let offset = options.offset.unwrap_or(0);
        match plan {
            FindPlan::Listing => {
                let names = self.document_names()?;
                let page = paginate(names, offset, options.limit);
                Ok(page
                    .filter_map(|name| self.fetch_document(&name))
                    .collect())
            }
            FindPlan::TagFilter { expr, residual } => {
                let names = self.ctx.store.find_by_tags(&self.ctx.container, &expr)?;
                let documents = self
                    .visible_names(names)
                    .filter_map(|name| self.fetch_document(&name))
                    .filter(move |document| matches_document(&residual, document));
                Ok(paginate(documents, offset, options.limit).collect())
            }
            FindPlan::FullScan { conditions } => {
                let documents = self
                    .document_names()?
                    .filter_map(|name| self.fetch_document(&name))
                    .filter(move |document| matches_document(&conditions, document));
                Ok(paginate(documents, offset, options.limit).collect())
            }
        }
    }

    /// Counts documents matching a predicate.
    ///
    /// When in-memory filtering is involved the count reflects the filter,
    /// not the raw candidate set.
    pub fn count(&self, query: &Value) -> StratusResult<usize> {
        let conditions = parse_query(query)?;
        let catalog = self.ctx.catalogs.load(&self.ctx.container)?;
        let plan = plan_find(&conditions, &catalog);
        log::debug!("Count in {} uses plan: {}", self.ctx.container, plan);

        match plan {
            FindPlan::Listing => Ok(self.document_names()?.count()),
            FindPlan::TagFilter { expr, residual } => {
                let names = self.ctx.store.find_by_tags(&self.ctx.container, &expr)?;
                if residual.is_empty() {
                    Ok(self.visible_names(names).count())
                } else {
                    Ok(self.count_matching(self.visible_names(names), &residual))
                }
            }
            FindPlan::FullScan { conditions } => {
                Ok(self.count_matching(self.document_names()?, &conditions))
            }
        }
    }

    fn count_matching(
        &self,
        names: impl Iterator<Item = String>,
        conditions: &[FieldCondition],
    ) -> usize {
        names
            .filter_map(|name| self.fetch_document(&name))
            .filter(|document| matches_document(conditions, document))
            .count()
    }

    /// Streams the names of the collection's documents, skipping system
    /// blobs and logging (but not failing on) transient listing errors.
    fn document_names(&self) -> StratusResult<impl Iterator<Item = String>> {
        let names = self.ctx.store.list(&self.ctx.container, None)?;
        Ok(self.visible_names(names))
    }

    fn visible_names(
        &self,
        names: crate::store::NameStream,
    ) -> impl Iterator<Item = String> {
        let container = self.ctx.container.clone();
        names
            .filter_map(move |entry| match entry {
                Ok(name) => Some(name),
                Err(err) => {
                    log::warn!("Skipping unreadable listing entry in {}: {}", container, err);
                    None
                }
            })
            .filter(|name| !name.starts_with(SYSTEM_PREFIX))
    }

    /// Fetches and decodes one hit. A missing blob (deleted between list
    /// and get), a transient store failure, or an undecodable payload drops
    /// the hit; the enclosing query still succeeds.
    fn fetch_document(&self, name: &str) -> Option<Document> {
        match self.ctx.store.get(&self.ctx.container, name) {
            Ok(Some(blob)) => match Document::from_bytes(&blob.bytes) {
                Ok(mut document) => {
                    if document.id().is_none() {
                        document.set_id(name);
                    }
                    Some(document)
                }
                Err(err) => {
                    log::warn!("Dropping undecodable document {}: {}", name, err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                log::warn!("Dropping document {} after fetch error: {}", name, err);
                None
            }
        }
    }
}

/// Applies offset/limit to a lazy stream of hits.
fn paginate<T>(
    items: impl Iterator<Item = T>,
    offset: usize,
    limit: Option<usize>,
) -> impl Iterator<Item = T> {
    items.skip(offset).take(limit.unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices_window() {
        let items: Vec<i32> = paginate(1..=5, 2, Some(2)).collect();
        assert_eq!(items, vec![3, 4]);
    }

    #[test]
    fn test_paginate_without_limit() {
        let items: Vec<i32> = paginate(1..=5, 1, None).collect();
        assert_eq!(items, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_paginate_offset_past_end() {
        let items: Vec<i32> = paginate(1..=3, 10, Some(2)).collect();
        assert!(items.is_empty());
    }
}
