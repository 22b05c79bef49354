use crate::domain::{NOT_AVAILABLE, Qualifiers};

const GENE_ID_PREFIX_LEN: usize = "GeneID:".len();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQualifiers {
    pub name: String,
    pub gene_id: String,
    pub locus_tag: String,
}

/// Resolves a feature's display name and cross references.
///
/// The name falls back from `gene` to `locus_tag` to the numeric `GeneID` cross reference,
/// and finally to `"NA"`. Presence is checked per key, so an empty but present value wins.
pub fn resolve(qualifiers: &Qualifiers) -> ResolvedQualifiers {
    let locus_tag = qualifiers.first("locus_tag");
    let gene_id = gene_id(qualifiers).map(|id| id.to_string());
    let gene = qualifiers.first("gene");

    let name = match (gene, locus_tag, gene_id.as_deref()) {
        (Some(gene), _, _) => gene,
        (None, Some(tag), _) => tag,
        (None, None, Some(id)) => id,
        (None, None, None) => NOT_AVAILABLE,
    }
    .to_string();

    ResolvedQualifiers {
        name,
        gene_id: gene_id.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        locus_tag: locus_tag.unwrap_or(NOT_AVAILABLE).to_string(),
    }
}

/// First `db_xref` mentioning `GeneID`, with its seven-character prefix stripped.
fn gene_id(qualifiers: &Qualifiers) -> Option<u64> {
    let value = qualifiers
        .values("db_xref")?
        .iter()
        .find(|value| value.contains("GeneID"))?;
    value.get(GENE_ID_PREFIX_LEN..)?.trim().parse().ok()
}
