//! Alert and pagination response headers.
//!
//! Writes announce their outcome through `X-{app}-alert` / `X-{app}-params`;
//! failures use `X-{app}-error`. List endpoints expose `X-Total-Count` and an
//! RFC 5988 `Link` header.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use carhub_infra::repository::Page;

pub const X_TOTAL_COUNT: &str = "x-total-count";

/// Alert parameters keep only alphanumerics and `-._*` unescaped.
const PARAM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'*');

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => tracing::warn!(header = name, "skipping unrepresentable response header"),
    }
}

fn alert(application_name: &str, message: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, &format!("x-{application_name}-alert"), message);
    insert(&mut headers, &format!("x-{application_name}-params"), &encode(param));
    headers
}

pub fn entity_creation_alert(application_name: &str, entity_name: &str, param: &str) -> HeaderMap {
    alert(
        application_name,
        &format!("{application_name}.{entity_name}.created"),
        param,
    )
}

pub fn entity_update_alert(application_name: &str, entity_name: &str, param: &str) -> HeaderMap {
    alert(
        application_name,
        &format!("{application_name}.{entity_name}.updated"),
        param,
    )
}

pub fn entity_deletion_alert(application_name: &str, entity_name: &str, param: &str) -> HeaderMap {
    alert(
        application_name,
        &format!("{application_name}.{entity_name}.deleted"),
        param,
    )
}

pub fn failure_alert(application_name: &str, entity_name: &str, error_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(
        &mut headers,
        &format!("x-{application_name}-error"),
        &format!("error.{error_key}"),
    );
    insert(&mut headers, &format!("x-{application_name}-params"), &encode(entity_name));
    headers
}

/// `X-Total-Count` plus `Link` relations (`next`, `prev`, `last`, `first`).
///
/// Links reuse the request path and query, replacing only `page` and `size`.
pub fn pagination_headers<T>(path: &str, query: Option<&str>, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, X_TOTAL_COUNT, &page.total_elements.to_string());

    let size = page.size;
    let number = u64::from(page.number);
    let last = page.total_pages().saturating_sub(1);

    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(link(path, query, number + 1, size, "next"));
    }
    if page.has_previous() {
        links.push(link(path, query, number - 1, size, "prev"));
    }
    links.push(link(path, query, last, size, "last"));
    links.push(link(path, query, 0, size, "first"));

    if let Ok(value) = HeaderValue::from_str(&links.join(",")) {
        headers.insert(header::LINK, value);
    }
    headers
}

fn link(path: &str, query: Option<&str>, page: u64, size: u32, rel: &str) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.extend_pairs(
        form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .filter(|(key, _)| key != "page" && key != "size"),
    );
    params
        .append_pair("page", &page.to_string())
        .append_pair("size", &size.to_string());

    format!("<{path}?{}>; rel=\"{rel}\"", params.finish())
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, PARAM).to_string()
}
