// Retriever
// Fetches the top-k chunk texts for a query and assembles them into a context block


use tracing::debug;

use crate::store::SimilaritySearch;
use crate::{RagError, Result};

/// Number of chunks retrieved when nothing else is configured
pub const DEFAULT_TOP_K: usize = 3;

/// Separator placed between chunks in the assembled context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Ranked texts of the `top_k` stored chunks most similar to `query`
///
/// A single similarity query, with no filtering or re-ranking. Fewer than
/// `top_k` texts come back only when the store holds fewer chunks.
#[inline]
pub async fn retrieve<S>(query: &str, store: &S, top_k: usize) -> Result<Vec<String>>
where
    S: SimilaritySearch + ?Sized,
{
    if top_k == 0 {
        return Err(RagError::Config(
            "top_k must be at least 1".to_string(),
        ));
    }

    let mut texts = store.similarity_query(query, top_k).await?;
    texts.truncate(top_k);

    debug!("Retrieved {} chunks for query", texts.len());
    Ok(texts)
}

/// Join retrieved texts into one context string, in rank order
#[inline]
pub fn join_context(texts: &[String]) -> String {
    texts.join(CONTEXT_SEPARATOR)
}
