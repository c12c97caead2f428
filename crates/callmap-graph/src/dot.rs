//! Deterministic DOT serialization.
//!
//! `to_dot` is a pure function of the graph: no I/O, and byte-identical
//! output for the same graph, which is what makes diff-based testing and
//! "open a previously generated graph" work. The text is plain Graphviz -
//! a renderer needs no knowledge of this engine to lay it out.
//!
//! Layout of the output:
//! - one `subgraph cluster_N` per file, in registration order;
//! - per cluster a single plaintext node whose HTML-like table has one row
//!   per symbol in pre-order, nested symbols as nested tables, each row
//!   carrying a `PORT` derived from the symbol's anchor;
//! - one plain node per realized external file, sorted by path;
//! - edge lines sorted by (source, target, kind), calls solid with their
//!   merged site ranges as tooltip metadata, implements dashed.

use std::iter;

use crate::model::{CallGraph, NodeRef, RelationData};
use crate::registry::FileEntry;

const MIN_WIDTH: u32 = 230;

/// Serializes the graph. Same graph in, same bytes out.
pub fn to_dot(graph: &CallGraph) -> String {
    let clusters = graph
        .files()
        .map(|entry| cluster(entry, graph.file_root_realized(entry.id())))
        .collect::<Vec<_>>()
        .join("\n");

    let externals = graph
        .external_paths()
        .iter()
        .map(|path| {
            format!(
                r#"    "{id}" [label="{label}", shape="box", style="dashed"];"#,
                id = escape_id(path),
                label = escape_id(path),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut relations: Vec<_> = graph.relations().collect();
    relations.sort_by(|a, b| (a.0, a.1, a.2.kind()).cmp(&(b.0, b.1, b.2.kind())));
    let edges = relations
        .into_iter()
        .map(|(from, to, data)| edge_line(from, to, data))
        .collect::<Vec<_>>()
        .join("\n");

    let header = r#"digraph {
    graph [
        rankdir = "LR"
        ranksep = 2.0
    ];
    node [
        fontsize = "16"
        fontname = "helvetica, open-sans"
        shape = "plaintext"
        style = "rounded, filled"
    ];"#;

    let body = [clusters, externals, edges]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if body.is_empty() {
        format!("{header}\n}}\n")
    } else {
        format!("{header}\n\n{body}\n}}\n")
    }
}

fn cluster(entry: &FileEntry, root_realized: bool) -> String {
    format!(
        r#"    subgraph cluster_{index} {{
        label = "{label}";

        "{index}" [label=<
        <TABLE BORDER="0" CELLBORDER="0">
        {rows}
        </TABLE>
    >];
    }}"#,
        index = entry.id().index(),
        label = escape_id(entry.path()),
        rows = file_rows(entry, root_realized),
    )
}

fn file_rows(entry: &FileEntry, root_realized: bool) -> String {
    let header = format!(
        r#"<TR><TD WIDTH="{width}" BORDER="0"><FONT POINT-SIZE="12">{title}</FONT></TD></TR>"#,
        width = MIN_WIDTH,
        title = escape_html(basename(entry.path())),
    );

    let root_row = root_realized.then(|| {
        r#"<TR><TD PORT="root" BORDER="0"><FONT POINT-SIZE="12">(top level)</FONT></TD></TR>"#
            .to_owned()
    });

    iter::once(header)
        .chain(entry.roots().iter().map(|&slot| symbol_table(entry, slot)))
        .chain(root_row)
        .chain(iter::once(r#"<TR><TD BORDER="0"></TD></TR>"#.to_owned()))
        .collect::<Vec<_>>()
        .join("\n        ")
}

/// One top-level symbol as a bordered table row: its own cell followed by
/// its descendants, nested tables grouping each container's rows.
fn symbol_table(entry: &FileEntry, slot: usize) -> String {
    format!(
        r#"<TR><TD>
        <TABLE BORDER="1" CELLBORDER="0" ROWS="*">
        {rows}
        </TABLE>
        </TD></TR>"#,
        rows = symbol_rows(entry, slot),
    )
}

fn symbol_rows(entry: &FileEntry, slot: usize) -> String {
    let data = entry.symbol(slot);

    iter::once(symbol_cell(entry, slot))
        .chain(data.children.iter().map(|&child| {
            if entry.symbol(child).children.is_empty() {
                symbol_cell(entry, child)
            } else {
                symbol_table(entry, child)
            }
        }))
        .collect::<Vec<_>>()
        .join("\n        ")
}

fn symbol_cell(entry: &FileEntry, slot: usize) -> String {
    let data = entry.symbol(slot);
    format!(
        r#"<TR><TD PORT="{port}">{name}</TD></TR>"#,
        port = port(entry, slot),
        name = escape_html(&data.name),
    )
}

fn port(entry: &FileEntry, slot: usize) -> String {
    let anchor = entry.symbol(slot).selection.start;
    format!("{}_{}", anchor.line, anchor.column)
}

/// `node:port` (or bare node) address of an endpoint.
fn endpoint(node: &NodeRef) -> String {
    match node {
        NodeRef::Symbol(id) => format!(
            "\"{}\":\"{}_{}\"",
            id.file.index(),
            id.anchor.line,
            id.anchor.column
        ),
        NodeRef::FileRoot(file) => format!("\"{}\":\"root\"", file.index()),
        NodeRef::External(path) => format!("\"{}\"", escape_id(path)),
    }
}

fn edge_line(from: &NodeRef, to: &NodeRef, data: &RelationData) -> String {
    let attrs = match data {
        RelationData::Call { sites } if sites.is_empty() => String::new(),
        RelationData::Call { sites } => {
            let tooltip = sites
                .iter()
                .map(|site| site.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!(r#" [edgetooltip="{tooltip}"]"#)
        }
        RelationData::Implements => r#" [style="dashed", arrowhead="empty"]"#.to_owned(),
    };

    format!("    {} -> {}{};", endpoint(from), endpoint(to), attrs)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_id(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::model::CallGraph;
    use callmap_core::{Position, Range, Symbol, SymbolKind};

    fn func(name: &str, line: u32) -> Symbol {
        Symbol::new(
            name,
            SymbolKind::Function,
            Range::of(line, 0, line + 3, 0),
            Range::of(line, 3, line, 3 + name.len() as u32),
        )
    }

    fn linked_graph() -> CallGraph {
        let mut builder = GraphBuilder::new();
        builder
            .add_file("src/a.rs", vec![func("alpha", 0), func("beta", 5)])
            .unwrap();
        builder.add_file("src/b.rs", vec![func("gamma", 0)]).unwrap();

        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();
        builder
            .add_call(alpha, Range::of(1, 4, 1, 9), "src/b.rs", Position::new(1, 0))
            .unwrap();
        builder
            .add_call(alpha, Range::of(2, 4, 2, 9), "src/b.rs", Position::new(1, 0))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_empty_graph_is_well_formed() {
        let dot = to_dot(&CallGraph::new());
        assert!(dot.starts_with("digraph {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(!dot.contains("subgraph"));
        assert_eq!(dot.matches('{').count(), dot.matches('}').count());
    }

    #[test]
    fn test_serialization_is_repeatable() {
        let graph = linked_graph();
        assert_eq!(to_dot(&graph), to_dot(&graph));
    }

    #[test]
    fn test_same_content_same_bytes_across_graphs() {
        assert_eq!(to_dot(&linked_graph()), to_dot(&linked_graph()));
    }

    #[test]
    fn test_edge_report_order_does_not_matter() {
        let build = |flip: bool| {
            let mut builder = GraphBuilder::new();
            builder
                .add_file("src/a.rs", vec![func("alpha", 0), func("beta", 5)])
                .unwrap();
            builder.add_file("src/b.rs", vec![func("gamma", 0)]).unwrap();
            let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();
            let beta = builder.symbol_id("src/a.rs", Position::new(5, 3)).unwrap();

            let mut reports = vec![
                (alpha, Range::of(1, 0, 1, 5)),
                (beta, Range::of(6, 0, 6, 5)),
            ];
            if flip {
                reports.reverse();
            }
            for (from, site) in reports {
                builder
                    .add_call(from, site, "src/b.rs", Position::new(1, 0))
                    .unwrap();
            }
            to_dot(&builder.build())
        };

        assert_eq!(build(false), build(true));
    }

    #[test]
    fn test_clusters_follow_registration_order() {
        let dot = to_dot(&linked_graph());
        let a = dot.find("cluster_0").unwrap();
        let b = dot.find("cluster_1").unwrap();
        assert!(a < b);
        assert!(dot.find(r#"label = "src/a.rs""#).unwrap() < dot.find(r#"label = "src/b.rs""#).unwrap());
    }

    #[test]
    fn test_merged_edge_is_one_line_with_tooltip() {
        let dot = to_dot(&linked_graph());
        assert_eq!(dot.matches(" -> ").count(), 1);
        assert!(dot.contains(r#""0":"0_3" -> "1":"0_3""#));
        assert!(dot.contains(r#"edgetooltip="1:4-1:9, 2:4-2:9""#));
    }

    #[test]
    fn test_rows_are_ports_in_preorder() {
        let service = Symbol::new(
            "Service",
            SymbolKind::Container,
            Range::of(0, 0, 20, 0),
            Range::of(0, 6, 0, 13),
        )
        .with_children(vec![func("start", 2), func("stop", 7)]);

        let mut builder = GraphBuilder::new();
        builder.add_file("src/svc.rs", vec![service]).unwrap();
        let dot = to_dot(&builder.build());

        let service_pos = dot.find(r#"<TD PORT="0_6">Service</TD>"#).unwrap();
        let start_pos = dot.find(r#"<TD PORT="2_3">start</TD>"#).unwrap();
        let stop_pos = dot.find(r#"<TD PORT="7_3">stop</TD>"#).unwrap();
        assert!(service_pos < start_pos && start_pos < stop_pos);
    }

    #[test]
    fn test_external_node_and_root_row() {
        let mut builder = GraphBuilder::new();
        builder.add_file("src/a.rs", vec![func("alpha", 0)]).unwrap();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();

        builder
            .add_call(alpha, Range::of(1, 0, 1, 5), "vendor/lib.rs", Position::new(3, 0))
            .unwrap();
        builder
            .add_call(alpha, Range::of(2, 0, 2, 5), "src/a.rs", Position::new(50, 0))
            .unwrap();

        let dot = to_dot(&builder.build());
        assert!(dot.contains(r#""vendor/lib.rs" [label="vendor/lib.rs", shape="box", style="dashed"];"#));
        assert!(dot.contains(r#"<TR><TD PORT="root" BORDER="0">"#));
        assert!(dot.contains(r#""0":"0_3" -> "0":"root""#));
        assert!(dot.contains(r#""0":"0_3" -> "vendor/lib.rs""#));
    }

    #[test]
    fn test_call_and_implements_render_as_two_lines() {
        let mut builder = GraphBuilder::new();
        let iface = Symbol::new(
            "Store",
            SymbolKind::Interface,
            Range::of(0, 0, 3, 0),
            Range::of(0, 6, 0, 11),
        );
        builder.add_file("src/store.rs", vec![iface]).unwrap();
        builder.add_file("src/disk.rs", vec![func("open", 0)]).unwrap();
        let store = builder.symbol_id("src/store.rs", Position::new(0, 6)).unwrap();

        builder
            .add_call(store, Range::of(1, 0, 1, 4), "src/disk.rs", Position::new(0, 3))
            .unwrap();
        builder
            .add_implementation(store, "src/disk.rs", Position::new(0, 3))
            .unwrap();

        let dot = to_dot(&builder.build());
        assert_eq!(dot.matches(r#""0":"0_6" -> "1":"0_3""#).count(), 2);
        assert_eq!(dot.matches(r#"[style="dashed", arrowhead="empty"]"#).count(), 1);
    }

    #[test]
    fn test_html_in_names_is_escaped() {
        let generic = Symbol::new(
            "lookup<K & V>",
            SymbolKind::Function,
            Range::of(0, 0, 3, 0),
            Range::of(0, 3, 0, 9),
        );
        let mut builder = GraphBuilder::new();
        builder.add_file("src/map.rs", vec![generic]).unwrap();

        let dot = to_dot(&builder.build());
        assert!(dot.contains("lookup&lt;K &amp; V&gt;"));
        assert!(!dot.contains("lookup<K"));
    }
}
