//! HTML chart of where a graph's genes sit on the human chromosomes.
//!
//! The page loads the Ideogram widget from a CDN and hands it the gene
//! annotations as a histogram overlay.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{BelGraph, Function};
use crate::mutation::{collapse_all_variants, infer_central_dogma};

pub const IDEOGRAM_VERSION: &str = "1.5.0";
pub const DEFAULT_TITLE: &str = "BEL Graph Information Density";

const CHART_ID_ALPHABET: &str = "abcdefghjkmopqrstuvqxyz";
const CHART_ID_LENGTH: usize = 16;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{{title}}</title>
    <script src="https://cdn.jsdelivr.net/npm/ideogram@{{version}}/dist/js/ideogram.min.js"></script>
</head>
<body>
<h1>{{title}}</h1>
<div id="{{chart}}"></div>
<script type="text/javascript">
    var ideogram = new Ideogram({
        container: '#{{chart}}',
        organism: 'human',
        chrHeight: 400,
        annotationsLayout: 'histogram',
        barWidth: 3,
        annotations: {{annotations}}
    });
</script>
</body>
</html>
"#;

/// Row of a gene location table. Either `chr` or a cytogenetic `location`
/// such as `17q21.31` gives the chromosome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneLocation {
    #[serde(default)]
    pub chr: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub stop: Option<u64>,
}

impl GeneLocation {
    pub fn chromosome(&self) -> Option<String> {
        if let Some(chr) = &self.chr {
            return Some(chr.clone());
        }
        let location = self.location.as_deref()?;
        let arm = if location.contains('q') { 'q' } else { 'p' };
        location
            .split(arm)
            .next()
            .filter(|chr| !chr.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub name: String,
    pub chr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<u64>,
}

/// Load a `{symbol: {chr | location, start, stop}}` JSON table.
pub fn read_gene_locations(path: &Path) -> Result<BTreeMap<String, GeneLocation>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Annotation for every HGNC gene of the graph with a known chromosome.
pub fn prerender(graph: &BelGraph, locations: &BTreeMap<String, GeneLocation>) -> BTreeMap<String, Annotation> {
    let mut graph = graph.clone();
    infer_central_dogma(&mut graph);
    collapse_all_variants(&mut graph);

    let mut result = BTreeMap::new();
    for gene in graph.nodes_by_function(Function::Gene) {
        if !gene.namespace.eq_ignore_ascii_case("hgnc") {
            continue;
        }
        let Some(location) = locations.get(&gene.name) else {
            debug!("no location for {}", gene.name);
            continue;
        };
        let Some(chr) = location.chromosome() else {
            debug!("no chromosome for {}", gene.name);
            continue;
        };
        result.insert(
            gene.name.clone(),
            Annotation {
                name: gene.name.clone(),
                chr,
                start: location.start,
                stop: location.stop,
            },
        );
    }
    result
}

/// Random DOM id of distinct letters.
pub fn generate_chart_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut letters: Vec<char> = Vec::new();
    for c in CHART_ID_ALPHABET.chars() {
        if !letters.contains(&c) {
            letters.push(c);
        }
    }
    letters.choose_multiple(rng, CHART_ID_LENGTH).collect()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the page with a fixed chart id.
pub fn render_with_chart_id(
    graph: &BelGraph,
    locations: &BTreeMap<String, GeneLocation>,
    chart: &str,
) -> Result<String> {
    let annotations: Vec<Annotation> = prerender(graph, locations).into_values().collect();
    let title = escape_html(graph.name().unwrap_or(DEFAULT_TITLE));
    Ok(TEMPLATE
        .replace("{{title}}", &title)
        .replace("{{version}}", IDEOGRAM_VERSION)
        .replace("{{chart}}", chart)
        .replace("{{annotations}}", &serde_json::to_string(&annotations)?))
}

pub fn render(graph: &BelGraph, locations: &BTreeMap<String, GeneLocation>) -> Result<String> {
    let chart = generate_chart_id(&mut rand::thread_rng());
    render_with_chart_id(graph, locations, &chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BelNode, Relation};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn locations() -> BTreeMap<String, GeneLocation> {
        serde_json::from_str(
            r#"{
                "MAPT": {"location": "17q21.31", "start": 45894382, "stop": 46028334},
                "APP": {"chr": "21", "start": 25880550, "stop": 26171128},
                "KDM5C": {"location": "Xp11.22"},
                "ORPHAN": {}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn chromosome_from_cytogenetic_location() {
        let locs = locations();
        assert_eq!(locs["MAPT"].chromosome().as_deref(), Some("17"));
        assert_eq!(locs["APP"].chromosome().as_deref(), Some("21"));
        assert_eq!(locs["KDM5C"].chromosome().as_deref(), Some("X"));
        assert_eq!(locs["ORPHAN"].chromosome(), None);
    }

    #[test]
    fn prerender_maps_proteins_to_genes() {
        let mut graph = BelGraph::new();
        graph.add_unqualified_edge(
            &BelNode::protein("HGNC", "MAPT").with_variant("p.Pro301Leu"),
            &BelNode::protein("hgnc", "APP"),
            Relation::Increases,
        );
        graph.add_node(&BelNode::protein("HGNC", "ORPHAN"));
        graph.add_node(&BelNode::protein("MGI", "Kdm5c"));

        let annotations = prerender(&graph, &locations());
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations["MAPT"].chr, "17");
        assert_eq!(annotations["MAPT"].start, Some(45894382));
        assert_eq!(annotations["APP"].chr, "21");
    }

    #[test]
    fn chart_ids_use_distinct_letters() {
        let mut rng = StdRng::seed_from_u64(3);
        let id = generate_chart_id(&mut rng);
        assert_eq!(id.len(), 16);
        assert_eq!(id.chars().collect::<HashSet<_>>().len(), 16);
        assert!(id.chars().all(|c| CHART_ID_ALPHABET.contains(c)));
    }

    #[test]
    fn rendered_page_embeds_annotations() {
        let mut graph = BelGraph::with_name("Tau <demo>");
        graph.add_node(&BelNode::gene("HGNC", "APP"));
        let html = render_with_chart_id(&graph, &locations(), "abcdefghjkmopqrs").unwrap();
        assert!(html.contains("<title>Tau &lt;demo&gt;</title>"));
        assert!(html.contains(r##"container: '#abcdefghjkmopqrs'"##));
        assert!(html.contains(&format!("ideogram@{IDEOGRAM_VERSION}")));
        assert!(html.contains(r#"annotations: [{"name":"APP","chr":"21","start":25880550,"stop":26171128}]"#));

        let untitled = render(&BelGraph::new(), &locations()).unwrap();
        assert!(untitled.contains(DEFAULT_TITLE));
    }
}
