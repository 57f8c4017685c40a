use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::list::{FilterPatch, ListAction, ListFilters, ListState, Resource};
use crate::domain::ports::ResourceApi;
use crate::errors::ApiError;

/// Keeps one [`ListState`] in sync with a collection endpoint.
///
/// Methods take `&self` so that overlapping requests can be issued; the
/// state lock is never held across an `.await`, and a response is only
/// applied if it belongs to the most recently started fetch.
pub struct ListController<R: Resource, A> {
    api: A,
    state: Mutex<ListState<R>>,
}

impl<R: Resource, A: ResourceApi<R>> ListController<R, A> {
    pub fn new(api: A) -> Self {
        Self::with_filters(api, ListFilters::default())
    }

    pub fn with_filters(api: A, filters: ListFilters<R::Filter>) -> Self {
        Self {
            api,
            state: Mutex::new(ListState::with_filters(filters)),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> ListState<R> {
        self.lock().clone()
    }

    pub fn items(&self) -> Vec<R> {
        self.lock().items.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    /// Merges `patch` into the filters (page back to 1 unless given) and
    /// fetches with the result.
    pub async fn set_filters(&self, patch: FilterPatch<R::Filter>) -> Result<(), ApiError> {
        self.dispatch(ListAction::FiltersChanged(patch));
        self.fetch().await
    }

    pub async fn set_page(&self, page: u32) -> Result<(), ApiError> {
        self.set_filters(FilterPatch::page(page)).await
    }

    pub async fn reset_filters(&self) -> Result<(), ApiError> {
        self.dispatch(ListAction::FiltersReset);
        self.fetch().await
    }

    /// Fetches the page the current filters describe. On failure the items
    /// are emptied and the message is kept in `error` as well as returned.
    pub async fn fetch(&self) -> Result<(), ApiError> {
        let (request, filters) = {
            let mut state = self.lock();
            *state = std::mem::take(&mut *state).reduce(ListAction::FetchStarted);
            (state.latest_request, state.filters.clone())
        };
        log::debug!(
            "fetching {} (request {request}, page {})",
            R::COLLECTION,
            filters.page
        );

        match self.api.list(&filters).await {
            Ok(page) => {
                log::debug!(
                    "received {} {} (request {request})",
                    page.items.len(),
                    R::COLLECTION
                );
                self.dispatch(ListAction::FetchSucceeded { request, page });
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to fetch {}: {e}", R::COLLECTION);
                self.dispatch(ListAction::FetchFailed {
                    request,
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    /// Re-runs the last fetch; the manual retry behind a refresh button.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.fetch().await
    }

    /// Creates an entity and prepends it locally without re-fetching.
    pub async fn create(&self, draft: R::Draft) -> Result<R, ApiError> {
        let created = self.mutate(self.api.create(draft).await)?;
        log::info!("created {} {}", R::COLLECTION, created.id());
        self.dispatch(ListAction::Created(created.clone()));
        Ok(created)
    }

    pub async fn update(&self, id: &str, changes: R::Changes) -> Result<R, ApiError> {
        let updated = self.mutate(self.api.update(id, changes).await)?;
        log::info!("updated {} {id}", R::COLLECTION);
        self.dispatch(ListAction::Updated(updated.clone()));
        Ok(updated)
    }

    /// Deletes remotely, then drops the entity locally. An id that is not
    /// loaded leaves the local list untouched.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.mutate(self.api.delete(id).await)?;
        log::info!("deleted {} {id}", R::COLLECTION);
        self.dispatch(ListAction::Deleted { id: id.to_string() });
        Ok(())
    }

    pub fn toggle_selection(&self, id: &str) {
        self.dispatch(ListAction::ToggleSelection { id: id.to_string() });
    }

    pub fn select_all(&self) {
        self.dispatch(ListAction::SelectAll);
    }

    pub fn clear_selection(&self) {
        self.dispatch(ListAction::ClearSelection);
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.lock().selected_ids.iter().cloned().collect()
    }

    fn mutate<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        result.inspect_err(|e| {
            log::warn!("{} mutation failed: {e}", R::COLLECTION);
            self.dispatch(ListAction::MutationFailed {
                message: e.user_message(),
            });
        })
    }

    fn dispatch(&self, action: ListAction<R>) {
        let mut state = self.lock();
        *state = std::mem::take(&mut *state).reduce(action);
    }

    fn lock(&self) -> MutexGuard<'_, ListState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
