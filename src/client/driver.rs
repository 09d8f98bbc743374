use leptos::prelude::*;

use super::coordinator::{Clock, SearchCoordinator};
use crate::models::search::SearchResult;
use crate::search::taxonomy::TypeScope;

/// Everything a search field needs to render.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub results: Option<SearchResult>,
    pub loading: bool,
    pub error: Option<String>,
    pub retryable: bool,
}

impl SearchView {
    pub fn of<C: Clock>(coordinator: &SearchCoordinator<C>) -> Self {
        Self {
            results: coordinator.results().cloned(),
            loading: coordinator.is_loading(),
            error: coordinator.error().map(|e| e.to_string()),
            retryable: coordinator.error().is_some_and(|e| e.is_retryable()),
        }
    }
}

/// Runs a [`SearchCoordinator`] against real timers and `fetch`.
///
/// On the server this only holds an empty view; results are loaded once
/// the page hydrates.
#[derive(Clone, Copy)]
pub struct SearchDriver {
    view: RwSignal<SearchView>,
    #[cfg(feature = "hydrate")]
    inner: StoredValue<Inner>,
}

#[cfg(feature = "hydrate")]
struct Inner {
    coordinator: SearchCoordinator<super::browser::BrowserClock>,
    wake: Option<futures::future::AbortHandle>,
}

impl SearchDriver {
    pub fn new(scope: Option<TypeScope>) -> Self {
        #[cfg(not(feature = "hydrate"))]
        let _ = scope;

        Self {
            view: RwSignal::new(SearchView::default()),
            #[cfg(feature = "hydrate")]
            inner: StoredValue::new(Inner {
                coordinator: SearchCoordinator::new(super::browser::BrowserClock, scope),
                wake: None,
            }),
        }
    }

    pub fn view(&self) -> ReadSignal<SearchView> {
        self.view.read_only()
    }

    pub fn input(&self, term: String) {
        #[cfg(feature = "hydrate")]
        {
            self.inner.update_value(|i| i.coordinator.input(&term));
            self.pump();
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = term;
    }

    pub fn go_to_page(&self, page: u32) {
        #[cfg(feature = "hydrate")]
        {
            let dispatch = self
                .inner
                .try_update_value(|i| i.coordinator.go_to_page(page))
                .flatten();
            if let Some(dispatch) = dispatch {
                self.send(dispatch);
            }
            self.publish();
            self.schedule();
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = page;
    }
}

#[cfg(feature = "hydrate")]
impl SearchDriver {
    fn pump(self) {
        let Some(dispatch) = self.inner.try_update_value(|i| i.coordinator.tick()) else {
            return;
        };
        if let Some(dispatch) = dispatch {
            self.send(dispatch);
        }
        self.publish();
        self.schedule();
    }

    fn send(self, dispatch: super::coordinator::Dispatch) {
        use futures::future::Abortable;

        let super::coordinator::Dispatch {
            seq,
            request,
            registration,
        } = dispatch;

        leptos::task::spawn_local(async move {
            let fetch = super::browser::fetch_page(&request);
            // Aborted means superseded or timed out; the coordinator has moved on.
            let Ok(outcome) = Abortable::new(fetch, registration).await else {
                return;
            };
            if self
                .inner
                .try_update_value(|i| i.coordinator.resolve(seq, outcome))
                .is_some()
            {
                self.publish();
                self.schedule();
            }
        });
    }

    /// Arm a single wake-up at the coordinator's next deadline.
    fn schedule(self) {
        use futures::future::{AbortHandle, Abortable};

        let Some(delay) = self.inner.try_update_value(|i| {
            if let Some(previous) = i.wake.take() {
                previous.abort();
            }
            i.coordinator
                .next_deadline()
                .map(|at| at.saturating_sub(i.coordinator.now_ms()))
        }) else {
            return;
        };
        let Some(delay) = delay else {
            return;
        };

        let (handle, registration) = AbortHandle::new_pair();
        self.inner.update_value(|i| i.wake = Some(handle));

        leptos::task::spawn_local(async move {
            let timer =
                gloo_timers::future::TimeoutFuture::new(u32::try_from(delay).unwrap_or(u32::MAX));
            if Abortable::new(timer, registration).await.is_ok() {
                self.pump();
            }
        });
    }

    fn publish(self) {
        if let Some(view) = self.inner.try_with_value(|i| SearchView::of(&i.coordinator)) {
            self.view.try_set(view);
        }
    }
}
