//! Functions a memoized body calls to shape how its result is cached
//!
//! `set_life` and `add_tags` act on the record of the innermost memoized call
//! that is currently running, which may be several plain function calls and
//! awaits away. Outside any memoized call they fail with
//! [`MemoError::ContextMissing`].

use crate::cache::store::MemoStore;
use crate::context::current_context;
use crate::error::{MemoError, Result};
use std::time::Duration;
use tracing::trace;

/// Set the life of the current call's result, replacing any earlier value
pub fn set_life(life: Duration) -> Result<()> {
    let ctx = current_context().ok_or(MemoError::ContextMissing {
        operation: "set_life",
    })?;

    ctx.set_life(life);
    trace!("Cache life set to {:?}", life);
    Ok(())
}

/// Add invalidation tags to the current call's result
pub fn add_tags<I, S>(tags: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ctx = current_context().ok_or(MemoError::ContextMissing {
        operation: "add_tags",
    })?;

    for tag in tags {
        let tag = tag.into();
        trace!("Cache tag added: {}", tag);
        ctx.add_tag(tag);
    }
    Ok(())
}

/// Add a single invalidation tag to the current call's result
pub fn add_tag(tag: impl Into<String>) -> Result<()> {
    add_tags([tag.into()])
}

/// Delete every globally memoized entry carrying `tag`
///
/// Works from anywhere, inside or outside a memoized call. Returns the number
/// of removed entries.
pub fn invalidate_by_tag(tag: &str) -> usize {
    MemoStore::global().invalidate_by_tag(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{run_with_context, CacheContextRecord};

    #[test]
    fn test_control_requires_context() {
        let err = set_life(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(
            err,
            MemoError::ContextMissing {
                operation: "set_life"
            }
        ));

        let err = add_tags(["a"]).unwrap_err();
        assert!(matches!(
            err,
            MemoError::ContextMissing {
                operation: "add_tags"
            }
        ));

        assert!(add_tag("a").is_err());
    }

    #[tokio::test]
    async fn test_control_mutates_current_record() {
        let record = run_with_context(CacheContextRecord::new(), async {
            set_life(Duration::from_secs(5)).unwrap();
            set_life(Duration::from_secs(9)).unwrap();
            add_tags(["a", "b"]).unwrap();
            add_tag("a").unwrap();
            add_tags(Vec::<String>::new()).unwrap();
            current_context().unwrap().snapshot()
        })
        .await;

        assert_eq!(record.life, Some(Duration::from_secs(9)));
        assert_eq!(record.tags.len(), 2);
    }

    #[test]
    fn test_invalidate_by_tag_without_context() {
        assert_eq!(invalidate_by_tag("control-tests-nothing-tagged"), 0);
    }
}
