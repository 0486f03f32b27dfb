use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use tokio_util::sync::CancellationToken;

/// Per request data handed to every resolver.
///
/// Cloning is cheap. Derived contexts share the data and the cancellation token of the context
/// they were derived from.
#[derive(Clone, Default)]
pub struct RequestContext {
    data: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    representation: Option<Arc<str>>,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a value that resolvers can later fetch with [`RequestContext::data`].
    #[must_use]
    pub fn with_data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        Arc::make_mut(&mut self.data).insert(TypeId::of::<D>(), Arc::new(data));
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn data<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.data
            .get(&TypeId::of::<D>())
            .and_then(|data| data.downcast_ref::<D>())
    }

    /// The typename of the representations a bulk resolver is currently asked for.
    pub fn representation(&self) -> Option<&str> {
        self.representation.as_deref()
    }

    pub(crate) fn for_representation(&self, typename: &str) -> Self {
        Self {
            representation: Some(Arc::from(typename)),
            ..self.clone()
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("representation", &self.representation)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
