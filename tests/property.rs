use coldsign::qr::{encode_frames, AssemblyOutcome, FrameAssembler, MultipartFrame};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Payloads whose first byte avoids the reserved single-capture prefixes.
fn arb_payload() -> impl Strategy<Value = Vec<u8>> {
    (1u8..=u8::MAX, prop::collection::vec(any::<u8>(), 0..300)).prop_filter_map(
        "first byte must not be reserved",
        |(first, rest)| {
            if first == 0x7b {
                return None;
            }
            let mut payload = vec![first];
            payload.extend(rest);
            Some(payload)
        },
    )
}

/// Deterministic permutation of `0..n` driven by generated sort keys.
fn permute(n: usize, keys: &[u32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| (keys[i % keys.len()], i));
    order
}

proptest! {
    #[test]
    fn reassembled_blob_is_arrival_order_independent(
        payload in arb_payload(),
        fragment_size in 1usize..48,
        keys in prop::collection::vec(any::<u32>(), 64),
    ) {
        let frames = encode_frames(&payload, fragment_size).unwrap();

        let mut in_order = FrameAssembler::new();
        let mut reference = None;
        for raw in &frames {
            if let AssemblyOutcome::Completed(blob) =
                in_order.submit_frame(MultipartFrame::parse(raw).unwrap()).unwrap()
            {
                reference = Some(blob);
            }
        }
        let reference = reference.expect("all frames submitted");
        prop_assert_eq!(&reference[5..], payload.as_slice());

        let mut shuffled = FrameAssembler::new();
        let mut permuted = None;
        for &i in &permute(frames.len(), &keys) {
            if let AssemblyOutcome::Completed(blob) =
                shuffled.submit_frame(MultipartFrame::parse(&frames[i]).unwrap()).unwrap()
            {
                permuted = Some(blob);
            }
        }
        let permuted = permuted.expect("all frames submitted");

        // Bodies match byte for byte; the synthetic header may differ only
        // in the index of the completing frame.
        prop_assert_eq!(&permuted[..3], &reference[..3]);
        prop_assert_eq!(&permuted[5..], &reference[5..]);
    }

    #[test]
    fn missed_frames_never_overlap_received_frames(
        payload in arb_payload(),
        fragment_size in 1usize..32,
        keys in prop::collection::vec(any::<u32>(), 64),
    ) {
        let frames = encode_frames(&payload, fragment_size).unwrap();
        let order = permute(frames.len(), &keys);

        let mut assembler = FrameAssembler::new();
        let mut submitted = BTreeSet::new();
        for &i in &order {
            let frame = MultipartFrame::parse(&frames[i]).unwrap();
            let index = frame.index;
            assembler.submit_frame(frame).unwrap();
            submitted.insert(index);

            let missed: BTreeSet<u16> = assembler.missed_frames().collect();
            prop_assert!(missed.is_disjoint(&submitted));
        }

        prop_assert!(assembler.is_complete());
        prop_assert_eq!(assembler.missed_frames().count(), 0);
    }
}
