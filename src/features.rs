use crate::counter::Tally;
use crate::domain::{FeatureDoc, FeatureLocation, GenomeDoc, RawFeature};
use crate::qualifiers::{self, ResolvedQualifiers};

/// Builds the feature documents for one annotated feature.
///
/// `join` and `order` features yield one document per sub-location, in sub-location order,
/// all sharing the parent's qualifiers, type and strand. Every produced document is counted.
pub fn build_features(
    feature: &RawFeature,
    genome: &GenomeDoc,
    features_added: &mut Tally,
) -> Vec<FeatureDoc> {
    let resolved = qualifiers::resolve(&feature.qualifiers);
    let docs: Vec<FeatureDoc> = if feature.is_multi_location() {
        feature
            .sub_locations
            .iter()
            .map(|location| build_feature(feature, genome.gi, &resolved, *location))
            .collect()
    } else {
        vec![build_feature(feature, genome.gi, &resolved, feature.location)]
    };
    features_added.add(docs.len() as u64);
    docs
}

fn build_feature(
    feature: &RawFeature,
    gi: i64,
    resolved: &ResolvedQualifiers,
    location: FeatureLocation,
) -> FeatureDoc {
    FeatureDoc {
        name: resolved.name.clone(),
        genome: gi,
        gene_id: resolved.gene_id.clone(),
        locus_tag: resolved.locus_tag.clone(),
        start: location.start + 1,
        end: location.end,
        operator: feature.operator.clone(),
        strand: feature.strand,
        kind: feature.kind.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Strand;

    fn genome() -> GenomeDoc {
        GenomeDoc {
            gi: 9629357,
            name: "Human immunodeficiency virus 1, complete genome.".to_string(),
            accession: "NC_001802".to_string(),
            version: 1,
            length: 9181,
            strand: Strand::Forward,
            taxonomy: "Viruses; Retroviridae".to_string(),
            organism: "Human immunodeficiency virus 1".to_string(),
        }
    }

    #[test]
    fn single_span_shifts_start_only() {
        let mut feature =
            RawFeature::new("gene", FeatureLocation::new(335, 1838), Strand::Forward);
        feature.qualifiers.push("gene", "gag");
        let mut tally = Tally::default();

        let docs = build_features(&feature, &genome(), &mut tally);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].start, 336);
        assert_eq!(docs[0].end, 1838);
        assert_eq!(docs[0].genome, 9629357);
        assert_eq!(docs[0].name, "gag");
        assert_eq!(docs[0].operator, None);
        assert_eq!(tally.value(), 1);
    }

    #[test]
    fn join_expands_per_sub_location() {
        let mut feature =
            RawFeature::new("CDS", FeatureLocation::new(335, 4642), Strand::Reverse);
        feature.operator = Some("join".to_string());
        feature.sub_locations = vec![
            FeatureLocation::new(335, 1631),
            FeatureLocation::new(1630, 4642),
        ];
        feature.qualifiers.push("locus_tag", "HIV1gp1");
        feature.qualifiers.push("db_xref", "GeneID:155348");
        let mut tally = Tally::default();

        let docs = build_features(&feature, &genome(), &mut tally);

        assert_eq!(tally.value(), 2);
        let spans: Vec<_> = docs.iter().map(|doc| (doc.start, doc.end)).collect();
        assert_eq!(spans, vec![(336, 1631), (1631, 4642)]);
        for doc in &docs {
            assert_eq!(doc.name, "HIV1gp1");
            assert_eq!(doc.gene_id, "155348");
            assert_eq!(doc.locus_tag, "HIV1gp1");
            assert_eq!(doc.kind, "CDS");
            assert_eq!(doc.strand, Strand::Reverse);
            assert_eq!(doc.operator.as_deref(), Some("join"));
        }
    }

    #[test]
    fn order_expands_in_sub_location_order() {
        let mut feature = RawFeature::new("gene", FeatureLocation::new(99, 700), Strand::Forward);
        feature.operator = Some("order".to_string());
        feature.sub_locations = vec![
            FeatureLocation::new(599, 700),
            FeatureLocation::new(99, 150),
            FeatureLocation::new(299, 310),
        ];
        feature.qualifiers.push("gene", "tat");
        let mut tally = Tally::default();

        let docs = build_features(&feature, &genome(), &mut tally);

        assert_eq!(tally.value(), 3);
        let spans: Vec<_> = docs.iter().map(|doc| (doc.start, doc.end)).collect();
        assert_eq!(spans, vec![(600, 700), (100, 150), (300, 310)]);
        assert!(docs.iter().all(|doc| doc.operator.as_deref() == Some("order")));
        assert!(docs.iter().all(|doc| doc.name == "tat" && doc.kind == "gene"));
    }

    #[test]
    fn other_operators_keep_outer_span() {
        let mut feature = RawFeature::new("gene", FeatureLocation::new(9, 20), Strand::Unknown);
        feature.operator = Some("bond".to_string());
        feature.sub_locations = vec![FeatureLocation::new(9, 10), FeatureLocation::new(19, 20)];
        let mut tally = Tally::default();

        let docs = build_features(&feature, &genome(), &mut tally);

        assert_eq!(docs.len(), 1);
        assert_eq!((docs[0].start, docs[0].end), (10, 20));
    }

    #[test]
    fn inverted_coordinates_pass_through() {
        let feature = RawFeature::new("gene", FeatureLocation::new(50, 10), Strand::Forward);
        let mut tally = Tally::default();

        let docs = build_features(&feature, &genome(), &mut tally);

        assert_eq!((docs[0].start, docs[0].end), (51, 10));
    }
}
