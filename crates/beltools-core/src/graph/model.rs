//! BEL entities and relations stored in the graph.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BelError, Result};

/// BEL function of a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Function {
    Abundance,
    BiologicalProcess,
    Complex,
    Composite,
    Gene,
    #[serde(rename = "miRNA")]
    MicroRna,
    Pathology,
    Protein,
    Reaction,
    #[serde(rename = "RNA")]
    Rna,
}

impl Function {
    /// Name used in node-link JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abundance => "Abundance",
            Self::BiologicalProcess => "BiologicalProcess",
            Self::Complex => "Complex",
            Self::Composite => "Composite",
            Self::Gene => "Gene",
            Self::MicroRna => "miRNA",
            Self::Pathology => "Pathology",
            Self::Protein => "Protein",
            Self::Reaction => "Reaction",
            Self::Rna => "RNA",
        }
    }

    /// Short BEL form, e.g. `p` for proteins.
    pub fn short(&self) -> &'static str {
        match self {
            Self::Abundance => "a",
            Self::BiologicalProcess => "bp",
            Self::Complex => "complex",
            Self::Composite => "composite",
            Self::Gene => "g",
            Self::MicroRna => "m",
            Self::Pathology => "path",
            Self::Protein => "p",
            Self::Reaction => "rxn",
            Self::Rna => "r",
        }
    }

    /// Parse either the JSON name or a short/long BEL keyword.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "Abundance" | "a" | "abundance" => Some(Self::Abundance),
            "BiologicalProcess" | "bp" | "biologicalProcess" => Some(Self::BiologicalProcess),
            "Complex" | "complex" | "complexAbundance" => Some(Self::Complex),
            "Composite" | "composite" | "compositeAbundance" => Some(Self::Composite),
            "Gene" | "g" | "geneAbundance" => Some(Self::Gene),
            "miRNA" | "m" | "microRNAAbundance" => Some(Self::MicroRna),
            "Pathology" | "path" | "pathology" => Some(Self::Pathology),
            "Protein" | "p" | "proteinAbundance" => Some(Self::Protein),
            "Reaction" | "rxn" | "reaction" => Some(Self::Reaction),
            "RNA" | "r" | "rnaAbundance" => Some(Self::Rna),
            _ => None,
        }
    }

    /// Functions that sit on the central dogma (gene -> RNA -> protein).
    pub fn is_central_dogma(&self) -> bool {
        matches!(self, Self::Gene | Self::Rna | Self::MicroRna | Self::Protein)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BEL relationship type of an edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    Increases,
    DirectlyIncreases,
    Decreases,
    DirectlyDecreases,
    RateLimitingStepOf,
    CausesNoChange,
    Regulates,
    NegativeCorrelation,
    PositiveCorrelation,
    Association,
    HasMember,
    HasComponent,
    HasVariant,
    HasReactant,
    HasProduct,
    TranslatedTo,
    TranscribedTo,
    IsA,
    SubProcessOf,
    AnalogousTo,
    BiomarkerFor,
    PrognosticBiomarkerFor,
    EquivalentTo,
    Orthologous,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increases => "increases",
            Self::DirectlyIncreases => "directlyIncreases",
            Self::Decreases => "decreases",
            Self::DirectlyDecreases => "directlyDecreases",
            Self::RateLimitingStepOf => "rateLimitingStepOf",
            Self::CausesNoChange => "causesNoChange",
            Self::Regulates => "regulates",
            Self::NegativeCorrelation => "negativeCorrelation",
            Self::PositiveCorrelation => "positiveCorrelation",
            Self::Association => "association",
            Self::HasMember => "hasMember",
            Self::HasComponent => "hasComponent",
            Self::HasVariant => "hasVariant",
            Self::HasReactant => "hasReactant",
            Self::HasProduct => "hasProduct",
            Self::TranslatedTo => "translatedTo",
            Self::TranscribedTo => "transcribedTo",
            Self::IsA => "isA",
            Self::SubProcessOf => "subProcessOf",
            Self::AnalogousTo => "analogousTo",
            Self::BiomarkerFor => "biomarkerFor",
            Self::PrognosticBiomarkerFor => "prognosticBiomarkerFor",
            Self::EquivalentTo => "equivalentTo",
            Self::Orthologous => "orthologous",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        ALL_RELATIONS.iter().copied().find(|r| r.as_str() == s)
    }

    pub fn is_causal_increase(&self) -> bool {
        matches!(self, Self::Increases | Self::DirectlyIncreases)
    }

    pub fn is_causal_decrease(&self) -> bool {
        matches!(self, Self::Decreases | Self::DirectlyDecreases)
    }

    /// Increases or decreases, direct or indirect.
    pub fn is_causal_polar(&self) -> bool {
        self.is_causal_increase() || self.is_causal_decrease()
    }

    /// Polar causal relations plus `regulates`.
    pub fn is_causal(&self) -> bool {
        self.is_causal_polar() || *self == Self::Regulates
    }

    pub fn is_correlative(&self) -> bool {
        matches!(
            self,
            Self::PositiveCorrelation | Self::NegativeCorrelation | Self::Association
        )
    }

    /// Relations that hold in both directions.
    pub fn is_two_way(&self) -> bool {
        self.is_correlative()
            || matches!(self, Self::AnalogousTo | Self::EquivalentTo | Self::Orthologous)
    }

    /// Causal increase or positive correlation.
    pub fn is_up(&self) -> bool {
        self.is_causal_increase() || *self == Self::PositiveCorrelation
    }

    /// Causal decrease or negative correlation.
    pub fn is_down(&self) -> bool {
        self.is_causal_decrease() || *self == Self::NegativeCorrelation
    }

    /// Sign of the effect the source has on the target, 0 when the relation carries none.
    pub fn causal_effect(&self) -> i8 {
        if self.is_up() {
            1
        } else if self.is_down() {
            -1
        } else {
            0
        }
    }

    /// Default rank used to pick the most informative of several parallel edges.
    pub fn rank(&self) -> u8 {
        match self {
            Self::DirectlyIncreases | Self::DirectlyDecreases => 4,
            Self::Increases | Self::Decreases => 3,
            Self::PositiveCorrelation | Self::NegativeCorrelation => 2,
            Self::Association => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ALL_RELATIONS: &[Relation] = &[
    Relation::Increases,
    Relation::DirectlyIncreases,
    Relation::Decreases,
    Relation::DirectlyDecreases,
    Relation::RateLimitingStepOf,
    Relation::CausesNoChange,
    Relation::Regulates,
    Relation::NegativeCorrelation,
    Relation::PositiveCorrelation,
    Relation::Association,
    Relation::HasMember,
    Relation::HasComponent,
    Relation::HasVariant,
    Relation::HasReactant,
    Relation::HasProduct,
    Relation::TranslatedTo,
    Relation::TranscribedTo,
    Relation::IsA,
    Relation::SubProcessOf,
    Relation::AnalogousTo,
    Relation::BiomarkerFor,
    Relation::PrognosticBiomarkerFor,
    Relation::EquivalentTo,
    Relation::Orthologous,
];

/// A BEL term: function, namespace, name and optional variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BelNode {
    pub function: Function,
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl BelNode {
    pub fn new(function: Function, namespace: &str, name: &str) -> Self {
        Self {
            function,
            namespace: namespace.to_string(),
            name: name.to_string(),
            variants: Vec::new(),
        }
    }

    pub fn protein(namespace: &str, name: &str) -> Self {
        Self::new(Function::Protein, namespace, name)
    }

    pub fn rna(namespace: &str, name: &str) -> Self {
        Self::new(Function::Rna, namespace, name)
    }

    pub fn gene(namespace: &str, name: &str) -> Self {
        Self::new(Function::Gene, namespace, name)
    }

    pub fn bioprocess(namespace: &str, name: &str) -> Self {
        Self::new(Function::BiologicalProcess, namespace, name)
    }

    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variants.push(variant.to_string());
        self
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// The same entity with all variants stripped.
    pub fn parent(&self) -> Self {
        Self {
            function: self.function,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            variants: Vec::new(),
        }
    }

    /// The same named entity under another function (e.g. protein -> RNA).
    pub fn with_function(&self, function: Function) -> Self {
        Self {
            function,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            variants: self.variants.clone(),
        }
    }
}

impl std::fmt::Display for BelNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}:{}",
            self.function.short(),
            self.namespace,
            quote_name(&self.name)
        )?;
        for variant in &self.variants {
            write!(f, ", var(\"{}\")", variant.replace('"', "\\\""))?;
        }
        f.write_str(")")
    }
}

fn quote_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

static NODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*([A-Za-z]+)\(\s*([A-Za-z0-9_.\-]+)\s*:\s*("(?:[^"\\]|\\.)*"|[^,()\s"]+)\s*((?:,\s*var\(\s*"(?:[^"\\]|\\.)*"\s*\)\s*)*)\)\s*$"#,
    )
    .unwrap()
});

static VARIANT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"var\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#).unwrap());

/// Parse a canonical node string such as `p(HGNC:AKT1)` or `bp(GO:"cell death")`.
pub fn parse_node(s: &str) -> Result<BelNode> {
    let caps = NODE_PATTERN
        .captures(s)
        .ok_or_else(|| BelError::InvalidNode(s.to_string()))?;

    let function = Function::from_str_value(&caps[1])
        .ok_or_else(|| BelError::InvalidNode(s.to_string()))?;

    let raw_name = &caps[3];
    let name = if raw_name.starts_with('"') {
        raw_name[1..raw_name.len() - 1].replace("\\\"", "\"")
    } else {
        raw_name.to_string()
    };

    let variants = caps
        .get(4)
        .map(|m| {
            VARIANT_PATTERN
                .captures_iter(m.as_str())
                .map(|v| v[1].replace("\\\"", "\""))
                .collect()
        })
        .unwrap_or_default();

    Ok(BelNode {
        function,
        namespace: caps[2].to_string(),
        name,
        variants,
    })
}

/// Literature reference backing an edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Citation {
    #[serde(rename = "type", default = "default_citation_type")]
    pub citation_type: String,
    pub reference: String,
}

fn default_citation_type() -> String {
    "PubMed".to_string()
}

/// Data carried by each edge of the multigraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BelEdge {
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_annotations",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub annotations: BTreeMap<String, BTreeSet<String>>,
}

impl BelEdge {
    pub fn unqualified(relation: Relation) -> Self {
        Self {
            relation,
            citation: None,
            evidence: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn qualified(relation: Relation, citation: &str, evidence: &str) -> Self {
        Self {
            relation,
            citation: Some(Citation {
                citation_type: default_citation_type(),
                reference: citation.to_string(),
            }),
            evidence: Some(evidence.to_string()),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string());
        self
    }

    pub fn has_annotation_value(&self, key: &str, value: &str) -> bool {
        self.annotations
            .get(key)
            .is_some_and(|values| values.contains(value))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnnotationValues {
    One(String),
    Many(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

fn deserialize_annotations<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, AnnotationValues> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, values)| {
            let values: BTreeSet<String> = match values {
                AnnotationValues::One(v) => [v].into_iter().collect(),
                AnnotationValues::Many(vs) => vs.into_iter().collect(),
                AnnotationValues::Flags(flags) => flags
                    .into_iter()
                    .filter(|(_, on)| *on)
                    .map(|(v, _)| v)
                    .collect(),
            };
            (key, values)
        })
        .collect())
}
