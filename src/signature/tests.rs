use super::*;
use serde_json::json;
use std::collections::HashSet;

fn reactions() -> Vec<Reaction> {
    vec![
        Reaction::new("hydroxylation", Formula::from_pairs([("O", 1)])),
        Reaction::new("demethylation", Formula::from_pairs([("C", -1), ("H", -2)])),
        Reaction::new("dehydration", Formula::from_pairs([("H", -2), ("O", -1)])),
    ]
}

#[test]
fn test_combination_count_formula() {
    assert_eq!(combination_count(3, 0), Some(1));
    assert_eq!(combination_count(3, 2), Some(1 + 3 + 9));
    assert_eq!(combination_count(0, 5), Some(1));
    assert_eq!(combination_count(10, 3), Some(1111));
    assert_eq!(combination_count(usize::MAX, 3), None);
}

#[test]
fn test_reaction_combinations_enumerated() {
    let generator = SignatureGenerator::from_compounds_reactions(Vec::new(), reactions());
    for depth in 0..=3 {
        let combos = generator.reaction_combinations(depth, u64::MAX).unwrap();
        assert_eq!(combos.len() as u64, combination_count(3, depth).unwrap());
        assert_eq!(combos.iter().filter(|c| c.name.is_empty()).count(), 1);
    }

    let combos = generator.reaction_combinations(2, u64::MAX).unwrap();
    let names: HashSet<&str> = combos.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains("hydroxylation+hydroxylation"));
    assert!(names.contains("hydroxylation+demethylation"));
    assert!(names.contains("demethylation+hydroxylation"));

    let double = combos
        .iter()
        .find(|c| c.name == "hydroxylation+dehydration")
        .unwrap();
    assert_eq!(double.delta.count("O"), 0);
    assert_eq!(double.delta.count("H"), -2);
    assert_eq!(double.depth, 2);
}

#[test]
fn test_combination_ceiling() {
    let generator = SignatureGenerator::from_compounds_reactions(Vec::new(), reactions());
    assert!(generator.reaction_combinations(2, 13).is_ok());
    assert!(matches!(
        generator.reaction_combinations(2, 12),
        Err(SignatureError::TooManyCombinations { ceiling: 12, .. })
    ));
}

#[test]
fn test_depth_zero_is_identity() {
    let compound = Compound::new("C9H8O4").unwrap();
    let parent = compound.uuid;
    let mut generator = SignatureGenerator::from_compounds_reactions(vec![compound], reactions());
    let config = GeneratorConfig {
        reaction_depth: 0,
        ..Default::default()
    };
    let signatures = generator.generate(&config).unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0].neutral_formula, "C9H8O4");
    assert_eq!(signatures[0].reactions, "");
    assert_eq!(signatures[0].parent, Some(parent));
    assert!((signatures[0].neutral_formula_mass - 180.042259).abs() < 1e-5);
}

#[test]
fn test_non_positive_products_discarded() {
    // methanol loses its only oxygen or its only carbon
    let compounds = vec![Compound::new("CH4O").unwrap()];
    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions());
    let config = GeneratorConfig {
        reaction_depth: 1,
        ..Default::default()
    };
    let signatures = generator.generate(&config).unwrap();
    let labels: Vec<&str> = signatures.iter().map(|s| s.reactions.as_str()).collect();
    assert_eq!(labels, vec!["", "hydroxylation"]);

    let config = GeneratorConfig {
        reaction_depth: 3,
        ..Default::default()
    };
    for signature in generator.generate(&config).unwrap() {
        let formula = signature.formula().unwrap();
        assert!(formula.is_strictly_positive(), "{}", signature.neutral_formula);
    }
}

#[test]
fn test_unique_signature_ids() {
    let compounds = vec![
        Compound::new("C19H28O3").unwrap(),
        Compound::new("C10H12N2O").unwrap(),
    ];
    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions());
    let signatures = generator.generate(&GeneratorConfig::default()).unwrap();
    let ids: HashSet<_> = signatures.iter().map(|s| s.uuid).collect();
    assert_eq!(ids.len(), signatures.len());
}

#[test]
fn test_ingest_skips_records_without_formula() {
    let records = vec![
        json!({"name": "testosterone", "neutral_formula": "C19H28O3", "primary_id": 42}),
        json!({"name": "mystery"}),
        json!({"name": "blank", "neutral_formula": ""}),
        json!("not an object"),
        json!({"name": "overflow", "neutral_formula": "(C9999999999)9999999999"}),
    ];
    let compounds = SignatureGenerator::ingest_compounds(records);
    assert_eq!(compounds.len(), 1);
    assert_eq!(compounds[0].name(), Some("testosterone"));
    assert_eq!(compounds[0].id().as_deref(), Some("42"));
    assert_eq!(compounds[0].formula.count("C"), 19);
}

#[test]
fn test_unknown_element_compound_skipped() {
    let compounds = vec![
        Compound::new("C2H6Xx").unwrap(),
        Compound::new("C2H6O").unwrap(),
    ];
    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, Vec::new());
    let signatures = generator.generate(&GeneratorConfig::default()).unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0].neutral_formula, "C2H6O");
}

#[test]
fn test_from_signatures_does_not_generate() {
    let signature = Signature {
        uuid: Uuid::new_v4(),
        parent: None,
        neutral_formula: "C6H6".into(),
        neutral_formula_mass: 78.04695,
        reactions: String::new(),
        score: None,
        extra: Map::new(),
    };
    let mut generator = SignatureGenerator::from_signatures(vec![signature]);
    assert_eq!(generator.signatures().len(), 1);
    assert!(matches!(
        generator.generate(&GeneratorConfig::default()),
        Err(SignatureError::NoCompounds)
    ));
}

#[test]
fn test_catalog_roundtrip_through_file() {
    let compounds = vec![Compound::new("C19H28O3").unwrap()];
    let mut generator = SignatureGenerator::from_compounds_reactions(compounds, reactions());
    let config = GeneratorConfig {
        reaction_depth: 1,
        ..Default::default()
    };
    generator.generate(&config).unwrap();
    let metadata = CatalogMetadata::new(1, 1, 3, generator.signatures().len());
    let catalog = SignatureCatalog::new(generator.signatures().to_vec(), &metadata).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signatures.json");
    catalog.save(&path).unwrap();

    let loaded = SignatureCatalog::load(&path).unwrap();
    assert_eq!(loaded.data, catalog.data);
    assert_eq!(loaded.metadata["reaction_depth"], 1);
    assert_eq!(loaded.metadata["generator"], "xenoscan");
}

#[test]
fn test_catalog_tolerates_foreign_metadata_and_bad_records() {
    let value = json!({
        "data": [
            {
                "uuid": "0d7e2a3c-6a39-4b55-a8b4-5f3c3a0f6f0e",
                "neutral_formula": "C6H6",
                "neutral_formula_mass": 78.04695,
                "reactions": "",
                "source": "manual"
            },
            {"neutral_formula": "C6H6"}
        ],
        "metadata": "generated_automatically"
    });
    let catalog = SignatureCatalog::from_value(value).unwrap();
    assert_eq!(catalog.data.len(), 1);
    assert_eq!(catalog.data[0].extra["source"], "manual");
    assert_eq!(catalog.metadata, json!("generated_automatically"));
}

#[test]
fn test_reaction_json_shape() {
    let reaction: Reaction =
        serde_json::from_value(json!({"reaction_name": "glucuronidation", "formula_dict": {"C": 6, "H": 8, "O": 6}}))
            .unwrap();
    assert_eq!(reaction.name, "glucuronidation");
    assert_eq!(reaction.delta.count("C"), 6);
}
