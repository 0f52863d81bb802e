/// Changes made by one request, in the order they happened.
///
/// Undoing a failed request walks `loaded` backwards (dependents before their
/// dependencies) and `evicted` backwards (dependencies before the resources
/// that were evicted ahead of them).
#[derive(Debug)]
pub(crate) struct RequestJournal<R> {
    pub(crate) loaded: Vec<R>,
    pub(crate) evicted: Vec<(R, u64)>,
}

impl<R> RequestJournal<R> {
    pub(crate) fn new() -> Self {
        Self {
            loaded: Vec::new(),
            evicted: Vec::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.evicted.is_empty()
    }
}
