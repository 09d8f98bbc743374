use leptos::prelude::*;

use crate::client::driver::SearchDriver;
use crate::models::content::ContentSummary;
use crate::search::taxonomy::TypeScope;

/// Search field bound to one board.
///
/// Typing is debounced; an empty field lists the whole board. Only the
/// response to the most recent request is ever shown.
#[component]
pub fn SearchBar(
    #[prop(optional)] scope: Option<TypeScope>,
    #[prop(into, default = "Search posts...".to_string())] placeholder: String,
) -> impl IntoView {
    let driver = SearchDriver::new(scope);
    let view_state = driver.view();
    let (query, set_query) = signal(String::new());

    // Client only: list the board before the first keystroke.
    Effect::new(move |_| driver.input(String::new()));

    let page_controls = move || {
        let results = view_state.get().results?;
        let pages = results.total.div_ceil(u64::from(results.size.max(1))).max(1);
        let page = u64::from(results.page);
        (pages > 1).then(|| {
            let prev = results.page.saturating_sub(1);
            let next = results.page + 1;
            view! {
                <div class="pagination">
                    <button
                        disabled={page <= 1}
                        on:click=move |_| driver.go_to_page(prev)
                    >
                        "Previous"
                    </button>
                    <span>{format!("{page} / {pages}")}</span>
                    <button
                        disabled={page >= pages}
                        on:click=move |_| driver.go_to_page(next)
                    >
                        "Next"
                    </button>
                </div>
            }
        })
    };

    view! {
        <div class="search-container">
            <input
                type="search"
                placeholder=placeholder
                on:input=move |ev| {
                    let term = event_target_value(&ev);
                    set_query.set(term.clone());
                    driver.input(term);
                }
                prop:value=query
            />
            <div class="search-status">
                {move || {
                    let state = view_state.get();
                    if let Some(error) = state.error {
                        let hint = if state.retryable { " Keep typing to retry." } else { "" };
                        view! { <p class="error">{error}{hint}</p> }.into_any()
                    } else if state.loading {
                        view! { <p>"Searching..."</p> }.into_any()
                    } else if let Some(results) = state.results {
                        view! { <p>{format!("{} posts", results.total)}</p> }.into_any()
                    } else {
                        ().into_any()
                    }
                }}
            </div>
            {move || {
                let results = view_state.get().results?;
                if results.items.is_empty() {
                    return Some(view! { <p>"No results found."</p> }.into_any());
                }
                Some(
                    view! {
                        <ul class="search-results">
                            {results
                                .items
                                .into_iter()
                                .map(|item| view! { <ResultRow item=item /> })
                                .collect_view()}
                        </ul>
                    }
                        .into_any(),
                )
            }}
            {page_controls}
        </div>
    }
}

#[component]
fn ResultRow(item: ContentSummary) -> impl IntoView {
    let badge = item.scope.map(|scope| {
        view! { <span class="scope-badge">{scope.label()}</span> }
    });

    view! {
        <li data-slug=item.slug>
            <strong>{item.title}</strong>
            {badge}
            <p class="excerpt">{item.excerpt}</p>
        </li>
    }
}
