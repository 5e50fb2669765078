use axum::response::Html;

static LANDING_HTML: &str = include_str!("../web/landing.html");
static CHAT_HTML: &str = include_str!("../web/chat.html");

pub async fn landing_page() -> Html<&'static str> {
    Html(LANDING_HTML)
}

pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_HTML)
}
