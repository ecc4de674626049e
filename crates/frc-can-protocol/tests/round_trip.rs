//! Identifier and classification laws checked over seeded random samples.

use bytes::Bytes;
use frc_can_protocol::{
    assemble, assemble_fields, classify, split, MessageCategory, API_CLASS_MAX, API_INDEX_MAX,
    DEVICE_NUMBER_MAX, DEVICE_TYPE_MAX, EXTENDED_ID_MASK,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SAMPLES: usize = 100_000;

#[test]
fn test_split_then_assemble_is_identity() {
    let mut rng = ChaCha8Rng::seed_from_u64(7491);
    for _ in 0..SAMPLES {
        let raw = rng.gen::<u32>() & EXTENDED_ID_MASK;
        let (address, selector) = split(raw);
        assert_eq!(assemble(address, selector), raw, "raw 0x{:08X}", raw);
    }
}

#[test]
fn test_assemble_then_split_is_identity() {
    let mut rng = ChaCha8Rng::seed_from_u64(7411);
    for _ in 0..SAMPLES {
        let device_type = rng.gen_range(0..=DEVICE_TYPE_MAX);
        let manufacturer = rng.gen::<u8>();
        let api_class = rng.gen_range(0..=API_CLASS_MAX);
        let api_index = rng.gen_range(0..=API_INDEX_MAX);
        let device_number = rng.gen_range(0..=DEVICE_NUMBER_MAX);

        let raw = assemble_fields(device_type, manufacturer, api_class, api_index, device_number)
            .expect("fields are in range");
        let (address, selector) = split(raw);

        assert_eq!(address.device_type(), device_type);
        assert_eq!(address.manufacturer(), manufacturer);
        assert_eq!(selector.api_class(), api_class);
        assert_eq!(selector.api_index(), api_index);
        assert_eq!(address.device_number(), device_number);
        assert_eq!(
            selector.api_id(),
            ((api_class as u16) << 4) | api_index as u16
        );
    }
}

#[test]
fn test_field_extremes_round_trip() {
    for &device_type in &[0, DEVICE_TYPE_MAX] {
        for &manufacturer in &[0u8, 1, 255] {
            for &api_class in &[0, API_CLASS_MAX] {
                for &api_index in &[0, API_INDEX_MAX] {
                    for &device_number in &[0, DEVICE_NUMBER_MAX] {
                        let raw = assemble_fields(
                            device_type,
                            manufacturer,
                            api_class,
                            api_index,
                            device_number,
                        )
                        .unwrap();
                        let (address, selector) = split(raw);
                        assert_eq!(assemble(address, selector), raw);
                    }
                }
            }
        }
    }
    assert_eq!(assemble_fields(31, 255, 63, 15, 63).unwrap(), EXTENDED_ID_MASK);
}

#[test]
fn test_classification_by_manufacturer() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let heartbeat_payload = Bytes::from_static(&[0u8; 8]);
    for _ in 0..SAMPLES / 10 {
        let raw = rng.gen::<u32>() & EXTENDED_ID_MASK;
        let (address, selector) = split(raw);
        let message = classify(raw, heartbeat_payload.clone()).unwrap();

        match address.manufacturer() {
            0 => {
                assert_eq!(message.category, MessageCategory::Broadcast);
                assert_eq!(message.api_id, 0);
            }
            1 => {
                assert_eq!(message.category, MessageCategory::Heartbeat);
                assert_eq!(message.api_id, 1);
                assert!(message.heartbeat.is_some());
            }
            _ => {
                assert_eq!(message.category, MessageCategory::Device);
                assert_eq!(message.api_id, selector.api_id());
                assert!(message.heartbeat.is_none());
            }
        }
    }
}

#[test]
fn test_non_heartbeat_frames_never_fail() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..SAMPLES / 10 {
        let raw = rng.gen::<u32>() & EXTENDED_ID_MASK;
        if split(raw).0.manufacturer() == 1 {
            continue;
        }
        let len = rng.gen_range(0..=8);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        assert!(classify(raw, Bytes::from(payload)).is_ok());
    }
}
