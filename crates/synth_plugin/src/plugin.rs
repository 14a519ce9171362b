//! Plugin definitions.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use synth_ast::Tree;

use crate::BoxError;

/// Boxed future returned by asynchronous transforms.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Outcome of one transform.
pub type TransformResult = Result<Tree, BoxError>;

type SyncFn = dyn Fn(Tree) -> TransformResult + Send + Sync;
type AsyncFn = dyn Fn(Tree) -> BoxFuture<TransformResult> + Send + Sync;

/// A tree transform, tagged with its execution model.
#[derive(Clone)]
pub enum Transform {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

/// A named, versioned tree transform.
///
/// Whether a plugin is asynchronous is fixed when it is constructed, so a
/// pipeline can check every plugin before running any of them.
#[derive(Clone)]
pub struct Plugin {
    name: String,
    version: String,
    transform: Transform,
}

impl Plugin {
    /// Creates a plugin whose transform runs to completion on the caller.
    ///
    /// ```rust
    /// use synth_plugin::Plugin;
    ///
    /// let tag = Plugin::sync("tag", "1.0.0", |mut tree| {
    ///     tree.set_metadata("tagged", true);
    ///     Ok(tree)
    /// });
    /// assert!(!tag.is_async());
    /// ```
    pub fn sync<F>(name: impl Into<String>, version: impl Into<String>, f: F) -> Self
    where
        F: Fn(Tree) -> TransformResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            version: version.into(),
            transform: Transform::Sync(Arc::new(f)),
        }
    }

    /// Creates a plugin whose transform returns a future.
    pub fn asynchronous<F, Fut>(name: impl Into<String>, version: impl Into<String>, f: F) -> Self
    where
        F: Fn(Tree) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransformResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            version: version.into(),
            transform: Transform::Async(Arc::new(move |tree| -> BoxFuture<TransformResult> {
                Box::pin(f(tree))
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn is_async(&self) -> bool {
        matches!(self.transform, Transform::Async(_))
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("async", &self.is_async())
            .finish()
    }
}
