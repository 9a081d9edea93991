use maud::{html, Markup};

/// Route listing shown at `/`. Placeholders like `<start>` are escaped by maud.
pub fn home_page(routes: &[&str]) -> Markup {
    html! {
        "Available Routes:"
        br;
        @for route in routes {
            (route)
            br;
        }
    }
}
