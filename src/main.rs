mod app_router;
mod career_view;
mod detail_view;
mod dom;
mod fetch;
mod gallery_view;
mod hero_view;
mod lazy_images;
mod portfolio;
mod session_store;

fn main() {
    console_error_panic_hook::set_once();
    app_router::start();
}
