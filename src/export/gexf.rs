//! GEXF 1.2 XML export

use crate::graph::Graph;
use std::fmt::Write;

/// Escape the five XML special characters
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn to_gexf(graph: &Graph) -> String {
    let mut xml = String::new();
    // Writing into a String cannot fail
    let _ = write_gexf(&mut xml, graph);
    xml
}

fn write_gexf(xml: &mut String, graph: &Graph) -> std::fmt::Result {
    let date = graph.timestamp.get(..10).unwrap_or(&graph.timestamp);

    writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(xml, r#"<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">"#)?;
    writeln!(xml, r#"  <meta lastmodifieddate="{}">"#, escape_xml(date))?;
    writeln!(xml, "    <creator>QuestGraph</creator>")?;
    writeln!(
        xml,
        "    <description>Concept graph ({} embeddings)</description>",
        escape_xml(&graph.metadata.embedding_model)
    )?;
    writeln!(xml, "  </meta>")?;
    writeln!(xml, r#"  <graph mode="static" defaultedgetype="undirected">"#)?;

    writeln!(xml, r#"    <attributes class="node">"#)?;
    writeln!(xml, r#"      <attribute id="difficulty" title="difficulty" type="integer"/>"#)?;
    writeln!(xml, r#"      <attribute id="topic" title="topic" type="string"/>"#)?;
    writeln!(xml, r#"      <attribute id="type" title="type" type="string"/>"#)?;
    writeln!(xml, "    </attributes>")?;

    writeln!(xml, "    <nodes>")?;
    for node in &graph.nodes {
        writeln!(
            xml,
            r#"      <node id="{}" label="{}">"#,
            escape_xml(&node.id),
            escape_xml(&node.name)
        )?;
        writeln!(xml, "        <attvalues>")?;
        writeln!(xml, r#"          <attvalue for="difficulty" value="{}"/>"#, node.difficulty)?;
        writeln!(xml, r#"          <attvalue for="topic" value="{}"/>"#, escape_xml(&node.topic))?;
        writeln!(xml, r#"          <attvalue for="type" value="{}"/>"#, escape_xml(node.kind.as_str()))?;
        writeln!(xml, "        </attvalues>")?;
        writeln!(xml, "      </node>")?;
    }
    writeln!(xml, "    </nodes>")?;

    writeln!(xml, "    <edges>")?;
    for edge in &graph.edges {
        writeln!(
            xml,
            r#"      <edge id="{}" source="{}" target="{}" weight="{}" label="{}"/>"#,
            escape_xml(&edge.id),
            escape_xml(&edge.source),
            escape_xml(&edge.target),
            edge.weight,
            edge.kind
        )?;
    }
    writeln!(xml, "    </edges>")?;

    writeln!(xml, "  </graph>")?;
    write!(xml, "</gexf>")?;
    Ok(())
}
