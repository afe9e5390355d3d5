//! Ideogram rendering from the fixture gene locations.

mod common;

use beltools_core::assembler::ideogram::{prerender, read_gene_locations, render_with_chart_id};
use beltools_core::graph::io::load_input;
use common::*;

#[test]
fn prerender_keeps_located_genes() {
    let graph = load_input(&fixture_path("tau.json")).unwrap();
    let locations = read_gene_locations(&fixture_path("gene_locations.json")).unwrap();
    let annotations = prerender(&graph, &locations);

    let names: Vec<&str> = annotations.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["APP", "GSK3B", "MAPT", "PSEN1"]);
    assert_eq!(annotations["MAPT"].chr, "17");
    assert_eq!(annotations["GSK3B"].chr, "3");
    assert_eq!(annotations["PSEN1"].start, None);
    assert_eq!(annotations["APP"].stop, Some(26171128));
}

#[test]
fn rendered_page_embeds_chart_and_annotations() {
    let graph = load_input(&fixture_path("tau.json")).unwrap();
    let locations = read_gene_locations(&fixture_path("gene_locations.json")).unwrap();
    let html = render_with_chart_id(&graph, &locations, "abcdefghjkmo").unwrap();

    assert!(html.contains("abcdefghjkmo"));
    assert!(html.contains("\"MAPT\""));
    assert!(!html.contains("SNCA"));
    assert!(!html.contains("{{annotations}}"));
}
