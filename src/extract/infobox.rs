//! Infobox (fact box) parser.
//!
//! Wiki infoboxes are inconsistently marked up: the container class varies
//! (`infobox`, `infobox infobox_v2`, `infobox_v2`...), so any element whose
//! class contains "infobox" is a candidate and the first one wins. Fields come
//! from rows carrying a `scope="row"` cell: the first `td` is the label, the
//! second the value.

use indexmap::IndexMap;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

use crate::document::{joined_text, selector, trimmed_text, Document};

/// A fact box field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Text(String),
    List(Vec<String>),
}

/// Field label to value, in the order the rows appear on the page. A repeated
/// label keeps its first position and takes the later value.
pub type FactFields = IndexMap<String, FactValue>;

/// A parsed fact box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactBox {
    pub title: String,
    pub fields: FactFields,
}

/// Locate and parse the page's fact box.
///
/// Returns `None` when there is no container, no header cell to take the title
/// from, or no usable label/value row.
pub fn parse_fact_box(doc: &Document) -> Option<FactBox> {
    let container = doc.find(&selector(r#"[class*="infobox"]"#))?;

    let title = fact_box_title(container)?;

    let scoped = selector(r#"[scope="row"]"#);
    let cell = selector("td");
    let mut fields = FactFields::new();

    for row in container.select(&selector("tr")) {
        if row.select(&scoped).next().is_none() {
            continue;
        }

        let cells: Vec<ElementRef<'_>> = row.select(&cell).collect();
        if cells.len() < 2 {
            continue;
        }

        let label = joined_text(cells[0]);
        if label.is_empty() {
            continue;
        }

        fields.insert(label, field_value(cells[1]));
    }

    if fields.is_empty() {
        return None;
    }

    Some(FactBox { title, fields })
}

/// The first header cell's inner `span` text, else the header cell's own text.
fn fact_box_title(container: ElementRef<'_>) -> Option<String> {
    let th = container.select(&selector("th")).next()?;

    let title = match th.select(&selector("span")).next() {
        Some(span) => trimmed_text(span),
        None => trimmed_text(th),
    };
    Some(title)
}

/// A list when the cell holds list items, otherwise the cell's joined text.
fn field_value(cell: ElementRef<'_>) -> FactValue {
    if cell.select(&selector("ul, ol")).next().is_some() {
        let items: Vec<String> = cell.select(&selector("li")).map(trimmed_text).collect();
        if !items.is_empty() {
            return FactValue::List(items);
        }
    }

    FactValue::Text(joined_text(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(markup: &str) -> Option<FactBox> {
        parse_fact_box(&Document::parse(markup))
    }

    const TURING: &str = r#"
        <html><body><div id="mw-content-text">
          <table class="infobox infobox_v2">
            <tbody>
              <tr><th colspan="2"><span>Alan Turing</span> <small>OBE</small></th></tr>
              <tr><td colspan="2">portrait</td></tr>
              <tr>
                <td scope="row">Nome completo</td>
                <td>Alan Mathison   Turing</td>
              </tr>
              <tr>
                <td scope="row"><a href="/wiki/Nacionalidade">Nacio<b>nalidade</b></a></td>
                <td><a href="/wiki/Reino_Unido">britânico</a></td>
              </tr>
              <tr>
                <td scope="row">Campos</td>
                <td><ul><li> Matemática </li><li><a href="/wiki/L%C3%B3gica">Lógica</a></li><li>Criptoanálise</li></ul></td>
              </tr>
              <tr>
                <td scope="row">População</td>
                <td>42 million</td>
              </tr>
              <tr><td scope="row"> </td><td>orphan value</td></tr>
              <tr><td scope="row">Only label</td></tr>
              <tr><td>Unscoped</td><td>ignored</td></tr>
            </tbody>
          </table>
          <table class="infobox"><tr><th>Second box</th></tr></table>
        </div></body></html>
    "#;

    #[test]
    fn test_parses_title_and_fields() {
        let fact_box = parse(TURING).unwrap();

        assert_eq!(fact_box.title, "Alan Turing");

        let mut expected = FactFields::new();
        expected.insert(
            "Nome completo".to_string(),
            FactValue::Text("Alan Mathison   Turing".to_string()),
        );
        expected.insert(
            "Nacio nalidade".to_string(),
            FactValue::Text("britânico".to_string()),
        );
        expected.insert(
            "Campos".to_string(),
            FactValue::List(vec![
                "Matemática".to_string(),
                "Lógica".to_string(),
                "Criptoanálise".to_string(),
            ]),
        );
        expected.insert(
            "População".to_string(),
            FactValue::Text("42 million".to_string()),
        );
        assert_eq!(fact_box.fields, expected);
    }

    #[test]
    fn test_list_and_scalar_detection() {
        let fact_box = parse(
            r#"<table class="infobox"><tr><th>T</th></tr>
               <tr><th scope="row">h</th><td>Letters</td><td><ol><li>A</li><li>B</li><li>C</li></ol></td></tr>
               <tr><th scope="row">h</th><td>Count</td><td>42 million</td></tr>
               </table>"#,
        )
        .unwrap();

        assert_eq!(
            fact_box.fields["Letters"],
            FactValue::List(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
        assert_eq!(
            fact_box.fields["Count"],
            FactValue::Text("42 million".to_string())
        );
    }

    #[test]
    fn test_empty_list_falls_back_to_text() {
        let fact_box = parse(
            r#"<table class="infobox"><tr><th>T</th></tr>
               <tr><td scope="row">Key</td><td>plain <ul></ul> text</td></tr></table>"#,
        )
        .unwrap();

        assert_eq!(
            fact_box.fields["Key"],
            FactValue::Text("plain text".to_string())
        );
    }

    #[test]
    fn test_title_without_span() {
        let fact_box = parse(
            r#"<table class="infobox_v2"><tr><th> Ford Motor Company </th></tr>
               <tr><td scope="row">Sede</td><td>Dearborn</td></tr></table>"#,
        )
        .unwrap();

        assert_eq!(fact_box.title, "Ford Motor Company");
    }

    #[test]
    fn test_no_container() {
        assert_eq!(parse("<html><body><table><tr><th>T</th></tr></table></body></html>"), None);
    }

    #[test]
    fn test_no_header_cell() {
        assert_eq!(
            parse(r#"<table class="infobox"><tr><td scope="row">K</td><td>V</td></tr></table>"#),
            None
        );
    }

    #[test]
    fn test_container_without_valid_rows() {
        assert_eq!(
            parse(
                r#"<table class="infobox"><tr><th>Title</th></tr>
                   <tr><td>K</td><td>V</td></tr>
                   <tr><td scope="row">only one</td></tr></table>"#
            ),
            None
        );
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = serde_json::to_string(&parse(TURING).unwrap().fields).unwrap();
        let second = serde_json::to_string(&parse(TURING).unwrap().fields).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fields_keep_page_order() {
        let fact_box = parse(
            r#"<table class="infobox"><tr><th><span>Alan Turing</span></th></tr>
               <tr><td scope="row">Nome</td><td>Alan</td></tr>
               <tr><td scope="row">Campos</td><td><ul><li>Rock (1990)</li></ul></td></tr>
               <tr><td scope="row">Ano</td><td>1912</td></tr>
               </table>"#,
        )
        .unwrap();

        let keys: Vec<&str> = fact_box.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Nome", "Campos", "Ano"]);

        let json = serde_json::to_string(&fact_box.fields).unwrap();
        assert_eq!(json, r#"{"Nome":"Alan","Campos":["Rock (1990)"],"Ano":"1912"}"#);
    }

    #[test]
    fn test_repeated_label_keeps_first_position() {
        let fact_box = parse(
            r#"<table class="infobox"><tr><th>T</th></tr>
               <tr><td scope="row">Sede</td><td>Lisboa</td></tr>
               <tr><td scope="row">Fundação</td><td>1910</td></tr>
               <tr><td scope="row">Sede</td><td>Porto</td></tr>
               </table>"#,
        )
        .unwrap();

        let json = serde_json::to_string(&fact_box.fields).unwrap();
        assert_eq!(json, r#"{"Sede":"Porto","Fundação":"1910"}"#);
    }
}
