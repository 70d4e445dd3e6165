//! HTML listings for directories that have no `index.html`.
//!
//! Links are relative (`./name`), so a listing works under any mount prefix.
//! Subdirectories end in `/`. Names are escaped for both the link target and
//! the visible text.

use std::path::Path;

use axum::{
    body::Body,
    http::header,
    response::{IntoResponse, Response},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that cannot appear raw in a relative path reference.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Entry names of `dir`, sorted, with a trailing `/` on directories.
pub async fn entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut read = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

pub fn render(names: &[String]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for name in names {
        let href = format!("./{}", utf8_percent_encode(name, HREF));
        html.push_str("<a href=\"");
        html.push_str(&encode_double_quoted_attribute(&href));
        html.push_str("\">");
        html.push_str(&encode_text(name));
        html.push_str("</a>\n");
    }
    html.push_str("</pre>\n");
    html
}

/// Listing response for `dir`; the body is omitted for `HEAD`.
pub async fn respond(dir: &Path, head: bool) -> std::io::Result<Response> {
    let html = render(&entries(dir).await?);
    let length = html.len().to_string();
    let body = if head { Body::empty() } else { Body::from(html) };

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_LENGTH, length),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_names() {
        let html = render(&["a b.txt".to_string(), "<x>&\"y\".txt".to_string()]);
        assert!(html.contains("<a href=\"./a%20b.txt\">a b.txt</a>"));
        assert!(html.contains("&lt;x&gt;&amp;"));
        assert!(!html.contains("<x>"));
    }

    #[test]
    fn colon_names_stay_relative() {
        let html = render(&["c:evil".to_string()]);
        assert!(html.contains("href=\"./c:evil\""));
    }

    #[tokio::test]
    async fn lists_sorted_with_directory_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let names = entries(dir.path()).await.unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/"]);
    }
}
