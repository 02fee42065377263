//! Every bundled codec must reproduce its input exactly through the
//! `encode` / `decode` envelope, whatever the input looks like.
use bmc_codecs::{
    decode, encode, CombinedCodec, DeflateCodec, HuffmanCodec, Lz4Codec, Lz77Codec,
    PassThroughCodec, ZstdCodec,
};
use bmc_core::Codec;
use proptest::prelude::*;

fn all_codecs() -> Vec<Box<dyn Codec>> {
    vec![
        Box::new(PassThroughCodec),
        Box::new(HuffmanCodec),
        Box::new(Lz77Codec::default()),
        Box::new(Lz77Codec::new(256, 32, 4)),
        Box::new(CombinedCodec::default()),
        Box::new(ZstdCodec::default()),
        Box::new(Lz4Codec),
        Box::new(DeflateCodec::default()),
    ]
}

/// 32x32 RGB checkerboard of 4x4 tiles, a typical flat-colour bitmap.
fn checkerboard() -> Vec<u8> {
    (0..32 * 32)
        .flat_map(|i| {
            let (x, y) = (i % 32, i / 32);
            if (x / 4 + y / 4) % 2 == 0 {
                [0xFF, 0xFF, 0xFF]
            } else {
                [0x00, 0x00, 0xFF]
            }
        })
        .collect()
}

#[test]
fn checkerboard_round_trips_with_every_codec() {
    let raw = checkerboard();
    for codec in all_codecs() {
        let (payload, envelope) = encode(codec.as_ref(), &raw).unwrap();
        assert_eq!(envelope[0], codec.id());
        let back = decode(&payload, &envelope).unwrap();
        assert_eq!(back, raw, "{} round-trip", codec.name());
    }
}

#[test]
fn empty_input_round_trips_with_every_codec() {
    for codec in all_codecs() {
        let (payload, envelope) = encode(codec.as_ref(), &[]).unwrap();
        assert!(decode(&payload, &envelope).unwrap().is_empty(), "{}", codec.name());
    }
}

#[test]
fn combined_beats_raw_on_flat_colour() {
    let raw = checkerboard();
    let (payload, envelope) = encode(&CombinedCodec::default(), &raw).unwrap();
    assert!(payload.len() + envelope.len() < raw.len() / 4);
}

#[test]
fn unknown_codec_id_is_an_error() {
    let err = decode(b"abc", &[42]).unwrap_err();
    assert!(err.to_string().contains("unknown codec id 42"));
    assert!(decode(b"abc", &[]).is_err());
}

proptest! {
    #[test]
    fn prop_codecs_are_lossless(raw in proptest::collection::vec(any::<u8>(), 0..2048)) {
        for codec in all_codecs() {
            let (payload, envelope) = encode(codec.as_ref(), &raw).unwrap();
            prop_assert_eq!(&decode(&payload, &envelope).unwrap(), &raw);
        }
    }

    #[test]
    fn prop_low_entropy_round_trips(
        raw in proptest::collection::vec(prop_oneof![Just(0u8), Just(7u8), Just(255u8)], 0..4096)
    ) {
        for codec in [&HuffmanCodec as &dyn Codec, &Lz77Codec::default(), &CombinedCodec::default()] {
            let (payload, envelope) = encode(codec, &raw).unwrap();
            prop_assert_eq!(&decode(&payload, &envelope).unwrap(), &raw);
        }
    }
}
