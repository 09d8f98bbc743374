use leptos::prelude::*;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::components::*;
use leptos_router::path;

use crate::components::search_bar::SearchBar;
use crate::search::taxonomy::TypeScope;

/// HTML document wrapping the app during server rendering.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/neighborly.css"/>
        <Title text="Neighborly"/>

        <Router>
            <nav class="top-nav">
                <A href="/">
                    <span class="logo">"Neighborly"</span>
                </A>
                {TypeScope::ALL
                    .into_iter()
                    .map(|scope| {
                        view! { <A href=format!("/{}", scope.as_str())>{scope.label()}</A> }
                    })
                    .collect_view()}
            </nav>
            <main>
                <Routes fallback=|| view! { "Page not found." }.into_view()>
                    <Route path=path!("/") view=HomePage/>
                    <Route path=path!("/board") view=|| view! { <ScopePage scope=TypeScope::Board/> }/>
                    <Route
                        path=path!("/property-info")
                        view=|| view! { <ScopePage scope=TypeScope::PropertyInfo/> }
                    />
                    <Route
                        path=path!("/moving-service")
                        view=|| view! { <ScopePage scope=TypeScope::MovingService/> }
                    />
                    <Route
                        path=path!("/expert-tip")
                        view=|| view! { <ScopePage scope=TypeScope::ExpertTip/> }
                    />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    view! {
        <h1>"Neighborly"</h1>
        <p>"Search every board at once, or pick a section above."</p>
        <SearchBar placeholder="Search all posts..."/>
    }
}

#[component]
fn ScopePage(scope: TypeScope) -> impl IntoView {
    view! {
        <h1>{scope.label()}</h1>
        <SearchBar scope=scope placeholder=format!("Search {}...", scope.label().to_lowercase())/>
    }
}
