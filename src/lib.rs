pub mod app;
pub mod error;
#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod state;
#[cfg(feature = "ssr")]
pub mod demo_seeder;
pub mod models {
    pub mod content;
    pub mod search;
}
pub mod search {
    pub mod assembler;
    pub mod predicate;
    pub mod taxonomy;
}
pub mod db {
    pub mod store;
}
pub mod api {
    pub mod errors;
    pub mod search;
}
pub mod client {
    #[cfg(feature = "hydrate")]
    pub mod browser;
    pub mod coordinator;
    pub mod driver;
}
pub mod components {
    pub mod search_bar;
}

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(app::App);
}
