//! End-to-end behavior of both containers through the public API.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sjzip::{
    Alphabet, CodecConfig, DotCodec, DotPacket, ErrorKind, FrontOrders, OptimizationLevel,
    OptimizedCodec, SjzCodec, SjzError, SpiralMapper, decode_from_file, encode_to_file,
};

#[ctor::ctor]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const KOREAN: &str = "안녕하세요. 저는 한국어를 할 수 있습니다.";

fn supported(text: &str) -> String {
    text.chars()
        .filter(|ch| Alphabet::get().contains(*ch))
        .collect()
}

fn alphabet_text(min: usize, max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(0..Alphabet::get().len(), min..=max).prop_map(|indices| {
        let symbols = Alphabet::get().symbols();
        indices.into_iter().map(|i| symbols[i]).collect()
    })
}

#[test]
fn apple_example() {
    let codec = SjzCodec::default();
    let record = codec.encode_chunk("Apple").unwrap();

    let front = FrontOrders::get().front_order('A').unwrap();
    assert_eq!(front[0], 'A');
    assert_eq!(record.front_index, Alphabet::get().index_of('A').unwrap());
    assert_eq!(record.length, 5);
    assert_eq!(codec.decode_chunk(&record).unwrap(), "Apple");
}

#[test]
fn korean_text_round_trips_in_every_container() {
    let text = supported(KOREAN);
    assert!(text.chars().count() > 10);

    let base = SjzCodec::new(CodecConfig::with_chunk_size(5)).unwrap();
    assert_eq!(base.decode(&base.encode(&text).unwrap()).unwrap(), text);

    for level in OptimizationLevel::ALL {
        let codec = OptimizedCodec::new(level, CodecConfig::with_chunk_size(5)).unwrap();
        assert_eq!(codec.decode(&codec.encode(&text).unwrap()).unwrap(), text);
    }

    let dots = DotCodec::default();
    let single = dots.text_to_single_dot(&text).unwrap();
    assert_eq!(dots.single_dot_to_text(&single).unwrap(), text);
}

#[test]
fn chunk_size_boundaries() {
    let codec = SjzCodec::default();
    let alphabet = Alphabet::get();
    let exact: String = alphabet.symbols().iter().cycle().take(500).collect();

    let record = codec.encode_chunk(&exact).unwrap();
    assert_eq!(record.length, 500);
    assert_eq!(codec.decode_chunk(&record).unwrap(), exact);

    let over: String = alphabet.symbols().iter().cycle().take(501).collect();
    let err = codec.encode_chunk(&over).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(codec.encode_chunk(""), Err(SjzError::EmptyText));

    // A whole document of 501 characters splits into 500 + 1.
    let bytes = codec.encode(&over).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), over);
}

#[test]
fn unsupported_character_fails_whole_document() {
    let codec = SjzCodec::default();
    let err = codec.encode("fine so far \u{1F600}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.position(), Some(12));
}

#[test]
fn header_failures_are_format_errors() {
    let codec = SjzCodec::default();
    let bytes = codec.encode("header test").unwrap();

    let mut bad_magic = bytes.clone();
    bad_magic[..4].copy_from_slice(b"ZIP!");
    assert_eq!(codec.decode(&bad_magic).unwrap_err().kind(), ErrorKind::Format);

    let other = SjzCodec::new(CodecConfig::with_chunk_size(250)).unwrap();
    assert_eq!(
        other.decode(&bytes),
        Err(SjzError::ChunkSizeMismatch {
            found: 500,
            expected: 250
        })
    );

    let optimized = OptimizedCodec::default();
    assert!(matches!(
        optimized.decode(&bytes),
        Err(SjzError::InvalidMagic { .. })
    ));
}

#[test]
fn chunk_limit_bounds_decoding() {
    let config = CodecConfig {
        chunk_size: 2,
        max_chunks: 4,
        ..CodecConfig::default()
    };
    let limited = SjzCodec::new(config).unwrap();
    let unlimited = SjzCodec::new(CodecConfig::with_chunk_size(2)).unwrap();

    let bytes = unlimited.encode("0123456789").unwrap();
    let err = limited.decode(&bytes).unwrap_err();
    assert_eq!(err, SjzError::TooManyChunks { count: 5, max: 4 });
    assert_eq!(err.kind(), ErrorKind::Overflow);
}

#[test]
fn exchange_values_round_trip_through_json_text() {
    let codec = DotCodec::new(CodecConfig::with_chunk_size(6)).unwrap();
    let text = "dots travel as JSON";
    let values = codec.dots_to_values(&codec.text_to_dots(text).unwrap());

    let json = serde_json::to_string(&values).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
    let dots = codec.dots_from_values(&parsed).unwrap();
    assert_eq!(codec.dots_to_text(&dots).unwrap(), text);

    let mut broken = parsed;
    broken[1]
        .as_object_mut()
        .unwrap()
        .remove("payload_hex");
    assert_eq!(
        codec.dots_from_values(&broken),
        Err(SjzError::MissingFields(vec!["payload_hex"]))
    );
}

#[test]
fn exchange_coordinates_match_last_character() {
    let dot = DotCodec::default().text_to_dots("xyz").unwrap().remove(0);
    let value = dot.to_value();
    let z = SpiralMapper::get().coordinate('z').unwrap().rounded();
    assert_eq!(value["coordinates"]["x"].as_f64().unwrap(), z.x);
    assert_eq!(value["coordinates"]["t"].as_f64().unwrap(), z.t);
    assert_eq!(DotPacket::from_value(&value).unwrap().coordinate, z);
}

#[test]
fn file_helpers_for_both_containers() {
    let dir = tempfile::tempdir().unwrap();
    let text = supported(KOREAN);

    let base_path = dir.path().join("note.sjz");
    let base = SjzCodec::default();
    encode_to_file(&base, &text, &base_path).unwrap();
    assert_eq!(decode_from_file(&base, &base_path).unwrap(), text);

    let optimized_path = dir.path().join("note.sjzo");
    let optimized = OptimizedCodec::default();
    let written = encode_to_file(&optimized, &text, &optimized_path).unwrap();
    assert_eq!(
        std::fs::metadata(&optimized_path).unwrap().len(),
        written as u64
    );
    assert_eq!(decode_from_file(&optimized, &optimized_path).unwrap(), text);

    // The file size is checked against the encoded ceiling before reading.
    let small = SjzCodec::new(CodecConfig {
        max_text_size: 8,
        chunk_size: 4,
        max_payload_size: 8,
        ..CodecConfig::default()
    })
    .unwrap();
    let large_path = dir.path().join("large.sjz");
    encode_to_file(&base, &text.repeat(8), &large_path).unwrap();
    let ceiling = small.config().max_encoded_size() as u64;
    assert!(std::fs::metadata(&large_path).unwrap().len() > ceiling);
    assert!(matches!(
        decode_from_file(&small, &large_path),
        Err(SjzError::InputTooLarge { .. })
    ));
}

#[test]
fn documents_at_the_text_ceiling_round_trip() {
    let config = CodecConfig {
        max_text_size: 8,
        chunk_size: 4,
        max_payload_size: 64,
        ..CodecConfig::default()
    };
    let text = "12345678";

    let base = SjzCodec::new(config).unwrap();
    assert_eq!(base.decode(&base.encode(text).unwrap()).unwrap(), text);

    let optimized = OptimizedCodec::new(OptimizationLevel::Geometric, config).unwrap();
    assert_eq!(optimized.decode(&optimized.encode(text).unwrap()).unwrap(), text);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ceiling.sjz");
    encode_to_file(&base, text, &path).unwrap();
    assert_eq!(decode_from_file(&base, &path).unwrap(), text);
}

#[test]
fn config_file_drives_codec() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sjzip.json");
    std::fs::write(&path, r#"{ "chunk_size": 3, "max_optimized_chunks": 2 }"#).unwrap();

    let config = CodecConfig::load_from(&path).unwrap();
    let codec = OptimizedCodec::new(OptimizationLevel::Geometric, config).unwrap();
    assert!(codec.encode("abcdef").is_ok());
    assert_eq!(
        codec.encode("abcdefg"),
        Err(SjzError::TooManyChunks { count: 3, max: 2 })
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn base_container_round_trip(text in alphabet_text(0, 1200)) {
        let codec = SjzCodec::default();
        let bytes = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.encode(&text).unwrap(), bytes.clone());
        prop_assert_eq!(codec.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn optimized_container_round_trip(text in alphabet_text(1, 1200), level in 0u8..4) {
        let level = OptimizationLevel::try_from(level).unwrap();
        let codec = OptimizedCodec::new(level, CodecConfig::default()).unwrap();
        let bytes = codec.encode(&text).unwrap();
        prop_assert_eq!(codec.decode(&bytes).unwrap(), text);
    }

    /// Flipping payload bits either fails or yields different, well-formed text.
    #[test]
    fn payload_mutation_is_detected(
        text in alphabet_text(1, 60),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let codec = SjzCodec::default();
        let mut record = codec.encode_chunk(&text).unwrap();
        let at = position.index(record.payload.len());
        record.payload[at] ^= mask;

        match codec.decode_chunk(&record) {
            Ok(decoded) => {
                prop_assert_ne!(&decoded, &text);
                prop_assert_eq!(decoded.chars().count(), text.chars().count());
                prop_assert!(decoded.chars().all(|ch| Alphabet::get().contains(ch)));
            }
            Err(err) => prop_assert_eq!(err.kind(), ErrorKind::Corruption),
        }
    }

    #[test]
    fn container_mutation_never_panics(
        text in alphabet_text(1, 40),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let codec = OptimizedCodec::default();
        let mut bytes = codec.encode(&text).unwrap();
        let at = position.index(bytes.len());
        bytes[at] ^= mask;
        // A single record never yields more than one chunk of text.
        if let Ok(decoded) = codec.decode(&bytes) {
            prop_assert!(decoded.chars().count() <= 500);
        }
    }
}
