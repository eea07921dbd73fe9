use super::*;

fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_defaults_when_keys_missing() {
    let props = Properties::try_from(HashMap::new()).unwrap();
    assert_eq!(props, Properties::default());
}

#[test]
fn test_parse_compression_flags() {
    let props = Properties::try_from(map(&[
        ("nodes", "10"),
        ("arcs", "25"),
        ("zetak", "5"),
        ("compressionflags", "OUTDEGREES_DELTA | RESIDUALS_GAMMA"),
    ])).unwrap();

    assert_eq!(props.nodes, 10);
    assert_eq!(props.arcs, 25);
    assert_eq!(props.zeta_k, Some(5));
    assert_eq!(props.outdegree_coding, EncodingType::DELTA);
    assert_eq!(props.residual_coding, EncodingType::GAMMA);
}

#[test]
fn test_rejects_bad_values() {
    assert!(Properties::try_from(map(&[("zetak", "0")])).is_err());
    assert!(Properties::try_from(map(&[("nodes", "many")])).is_err());
    assert!(Properties::try_from(map(&[("compressionflags", "BLOCKS_GAMMA")])).is_err());
    assert!(Properties::try_from(map(&[("compressionflags", "RESIDUALS_HUFFMAN")])).is_err());
}

#[test]
fn test_write_and_read_back() {
    let props = Properties {
        nodes: 3,
        arcs: 4,
        zeta_k: Some(2),
        max_unary_length: 100,
        outdegree_coding: EncodingType::NIBBLE,
        residual_coding: EncodingType::DELTA,
    };

    let path = std::env::temp_dir().join(format!("webgraph_codes_props_{}.properties", std::process::id()));
    std::fs::write(&path, String::from(props.clone())).unwrap();

    let read = Properties::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(read, props);
}
