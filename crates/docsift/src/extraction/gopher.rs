//! Gopher menu transcoding.
//!
//! A menu line is `<type><display>\t<selector>\t<host>\t<port>`; a line with
//! a single `.` ends the menu. Each entry becomes one `<div>` of a synthetic
//! HTML page so the HTML extractor can take it from there.

use crate::text::string_utils::escape_html;

const DEFAULT_PORT: &str = "70";

/// Item types rendered as plain text.
const TEXT_ONLY_TYPES: &[char] = &['i', '3'];

/// One parsed menu line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopherItem<'a> {
    pub item_type: char,
    pub display: &'a str,
    pub selector: &'a str,
    pub host: &'a str,
    pub port: &'a str,
}

impl<'a> GopherItem<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let item_type = chars.next()?;
        let mut fields = chars.as_str().split('\t');

        let display = fields.next().unwrap_or_default();
        let selector = fields.next().unwrap_or_default();
        let host = fields.next().unwrap_or_default().trim();
        let port = fields.next().map(str::trim).filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PORT);

        Some(Self {
            item_type,
            display,
            selector,
            host,
            port,
        })
    }

    pub fn is_navigable(&self) -> bool {
        !TEXT_ONLY_TYPES.contains(&self.item_type) && !self.host.is_empty()
    }

    /// Link target: `gopher://host:port/<type><selector>`, or the bare URL of
    /// an `h` item whose selector is `URL:<target>`.
    pub fn href(&self) -> Option<String> {
        if !self.is_navigable() {
            return None;
        }
        if self.item_type == 'h'
            && let Some(target) = self.selector.strip_prefix("URL:")
        {
            return Some(target.to_string());
        }
        let selector = self.selector.strip_prefix('/').unwrap_or(self.selector);
        Some(format!("gopher://{}:{}/{}{}", self.host, self.port, self.item_type, selector))
    }
}

/// Transcode a Gopher menu into an HTML page.
pub fn gopher_menu_to_html(menu: &str) -> String {
    let mut html = String::from("<html><head></head><body>\n");

    for line in menu.lines() {
        if line.trim_end() == "." {
            break;
        }
        let Some(item) = GopherItem::parse(line) else {
            continue;
        };

        let display = escape_html(item.display);
        match item.href() {
            Some(href) => {
                html.push_str(&format!("<div><a href=\"{}\">{}</a></div>\n", escape_html(&href), display));
            }
            None => {
                html.push_str(&format!("<div>{}</div>\n", display));
            }
        }
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = GopherItem::parse("1Floodgap Home\t/home\tgopher.floodgap.com\t70\r\n").unwrap();
        assert_eq!(item.item_type, '1');
        assert_eq!(item.display, "Floodgap Home");
        assert_eq!(item.href().as_deref(), Some("gopher://gopher.floodgap.com:70/1home"));
        assert!(GopherItem::parse("").is_none());
    }

    #[test]
    fn test_info_and_url_items() {
        let info = GopherItem::parse("iWelcome\tfake\t(NULL)\t0").unwrap();
        assert!(info.href().is_none());

        let web = GopherItem::parse("hWeb site\tURL:https://example.com/\tgopher.example\t70").unwrap();
        assert_eq!(web.href().as_deref(), Some("https://example.com/"));

        let no_port = GopherItem::parse("0About\t/about.txt\tgopher.example").unwrap();
        assert_eq!(no_port.href().as_deref(), Some("gopher://gopher.example:70/0about.txt"));
    }

    #[test]
    fn test_menu_to_html() {
        let menu = "iWelcome <home>\tfake\t(NULL)\t0\r\n\
                    0About\t/about.txt\tgopher.example\t70\r\n\
                    3Error\t\terror.host\t1\r\n\
                    .\r\n\
                    1After end\t/x\tgopher.example\t70\r\n";
        let html = gopher_menu_to_html(menu);

        assert!(html.contains("<div>Welcome &lt;home&gt;</div>"));
        assert!(html.contains("<div><a href=\"gopher://gopher.example:70/0about.txt\">About</a></div>"));
        assert!(html.contains("<div>Error</div>"));
        assert!(!html.contains("After end"));
    }
}
