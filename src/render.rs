//! Page rendering sink. Deployments with their own templates implement
//! [`PageRenderer`]; [`HtmlRenderer`] is a plain built-in fallback.

use std::fmt::Write;

use crate::search::response::SearchArguments;

/// Which page to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Search,
    Error,
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, view: View, arguments: &SearchArguments) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl PageRenderer for HtmlRenderer {
    fn render(&self, view: View, arguments: &SearchArguments) -> String {
        let mut body = String::new();
        match view {
            View::Error => {
                let _ = write!(
                    body,
                    "<h1>Error</h1>\n<p class=\"error\">{}</p>\n",
                    escape(arguments.error.as_deref().unwrap_or("Unknown error"))
                );
            }
            View::Search => render_search(&mut body, arguments),
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}<footer>Generated {}</footer>\n</body>\n</html>\n",
            escape(&title(view, arguments)),
            body,
            escape(&arguments.generated_date)
        )
    }
}

fn title(view: View, arguments: &SearchArguments) -> String {
    match (view, &arguments.search) {
        (View::Search, Some(search)) => format!("{} - {}", search.query, arguments.tree),
        _ => arguments.tree.clone(),
    }
}

fn render_search(body: &mut String, arguments: &SearchArguments) {
    let _ = writeln!(
        body,
        "<form method=\"get\" action=\"{}/{}/search\"><input name=\"q\" value=\"{}\"></form>",
        escape(&arguments.wwwroot),
        escape(&arguments.tree),
        escape(arguments.search.as_ref().map(|s| s.query.as_str()).unwrap_or(""))
    );

    if let Some(message) = &arguments.error {
        let _ = writeln!(body, "<p class=\"warning\">{}</p>", escape(message));
    }

    let Some(search) = &arguments.search else {
        return;
    };

    let _ = writeln!(body, "<ul class=\"results\">");
    for result in &search.results {
        let file_url = format!("{}/{}/source/{}", arguments.wwwroot, arguments.tree, result.path);
        let _ = writeln!(
            body,
            "<li><a class=\"{}\" href=\"{}\">{}</a>",
            escape(&result.icon),
            escape(&file_url),
            escape(&result.path)
        );
        for line in &result.lines {
            let _ = writeln!(
                body,
                "<div class=\"line\"><a href=\"{}#{}\">{}</a> <code>{}</code></div>",
                escape(&file_url),
                line.line_number,
                line.line_number,
                escape(&line.line)
            );
        }
        let _ = writeln!(body, "</li>");
    }
    let _ = writeln!(body, "</ul>");

    if search.limit > 0 && search.results.len() == search.limit {
        let _ = writeln!(
            body,
            "<a class=\"next\" href=\"{}&amp;offset={}&amp;limit={}\">Next</a>",
            escape(&search.search_url),
            search.offset + search.limit,
            search.limit
        );
    }
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
