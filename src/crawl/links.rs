//! Article link extraction.

use scraper::Selector;

use crate::document::{selector, Document};

/// Extract candidate article identifiers from a page, in document order.
///
/// Links are taken from the `content` element when the page has one, else from
/// the whole document. A candidate's href starts with `prefix` and contains no
/// `:` (which marks Category:, File:, Talk: and other namespaces). Fragments
/// are dropped so that sections of one article map to one identifier.
/// Duplicates are left in; de-duplication happens when appending to the
/// frontier.
pub fn extract_article_links(doc: &Document, prefix: &str, content: &Selector) -> Vec<String> {
    let anchor = selector("a[href]");
    let scope = doc.find(content).unwrap_or_else(|| doc.root());

    scope
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| article_id(href, prefix))
        .collect()
}

fn article_id(href: &str, prefix: &str) -> Option<String> {
    if !href.starts_with(prefix) || href.contains(':') {
        return None;
    }

    let id = href.split('#').next().unwrap_or(href);
    if id.len() <= prefix.len() {
        return None;
    }
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r##"
        <html><body>
          <div id="mw-navigation"><a href="/wiki/Main_Page">Main</a></div>
          <div id="bodyContent">
            <p>
              <a href="/wiki/Beyonc%C3%A9">Beyoncé</a>
              <a href="/wiki/Categoria:M%C3%BAsica">Categoria</a>
              <a href="/wiki/Ficheiro:Logo.png">logo</a>
              <a href="https://example.com/wiki/Outside">outside</a>
              <a href="/w/index.php?title=X&action=edit">edit</a>
              <a href="/wiki/Taylor_Swift#Carreira">Taylor</a>
              <a href="/wiki/Beyonc%C3%A9">again</a>
              <a href="#cite_note-1">[1]</a>
              <a href="/wiki/">bare</a>
              <a>no href</a>
            </p>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_extracts_article_links_in_order() {
        let doc = Document::parse(PAGE);
        let links = extract_article_links(&doc, "/wiki/", &selector("#bodyContent"));

        assert_eq!(
            links,
            vec![
                "/wiki/Beyonc%C3%A9".to_string(),
                "/wiki/Taylor_Swift".to_string(),
                "/wiki/Beyonc%C3%A9".to_string(),
            ]
        );
    }

    #[test]
    fn test_falls_back_to_whole_document() {
        let doc = Document::parse(
            r#"<html><body><a href="/wiki/A">A</a><a href="/wiki/Talk:A">t</a></body></html>"#,
        );
        let links = extract_article_links(&doc, "/wiki/", &selector("#bodyContent"));

        assert_eq!(links, vec!["/wiki/A".to_string()]);
    }

    #[test]
    fn test_article_id_rules() {
        assert_eq!(article_id("/wiki/Rust", "/wiki/"), Some("/wiki/Rust".to_string()));
        assert_eq!(article_id("/wiki/Special:Random", "/wiki/"), None);
        assert_eq!(article_id("/wiki/#top", "/wiki/"), None);
        assert_eq!(article_id("/w/Rust", "/wiki/"), None);
    }
}
