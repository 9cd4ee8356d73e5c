use parking_lot::RwLock;
use shared::protocol::proxy_href;
use shared::types::About;
use super::Exporter;

/// Exporter that accumulates every record in memory and backs the HTTP
/// index. The collection is append-only for the life of the process:
/// no deduplication, no removal.
pub struct HttpExporter {
    abouts: RwLock<Vec<About>>,
}

impl HttpExporter {
    pub fn new() -> Self {
        Self {
            abouts: RwLock::new(Vec::new()),
        }
    }

    /// Clone of the accumulated records, in arrival order. The read lock is
    /// held only for the copy, so a snapshot sees either the pre- or
    /// post-append state of a concurrent write, never a torn record.
    pub fn snapshot(&self) -> Vec<About> {
        self.abouts.read().clone()
    }
}

impl Default for HttpExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for HttpExporter {
    fn handle(&self, about: About) {
        self.abouts.write().push(about);
    }

    fn count(&self) -> usize {
        self.abouts.read().len()
    }
}

/// Renders the HTML index: one table row per record, each linking to the
/// service's own about endpoint through the API proxy.
pub fn render_index(abouts: &[About]) -> String {
    let mut rows = String::new();
    for about in abouts {
        let service = &about.service;
        rows.push_str(&format!(
            "    <tr>\n        <td><a href=\"{}\">{}.{}</a></td>\n    </tr>\n",
            escape_html(&proxy_href(&service.namespace, &service.name)),
            escape_html(&service.namespace),
            escape_html(&service.name),
        ));
    }

    let mut page = String::from(
        "<!DOCTYPE html>\n<head>\n    <title>UW Documentation</title>\n</head>\n<body>\n<h1>UW Documented services</h1>\n<table style='font-size: 10pt; font-family: MONOSPACE;'>\n",
    );
    page.push_str(&rows);
    page.push_str("</table>\n</body>\n</html>");
    page
}

/// Minimal HTML escaping for text and attribute positions.
fn escape_html(s: &str) -> String {
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
