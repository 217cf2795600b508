use alloc::vec::Vec;

use quickcheck::QuickCheck;

use super::{
    arbitrary::{LineBytes, SplitBackend},
    test_count,
};
use crate::{InputStream, ThresholdStatus};

/// Draining through `read_with_threshold` and `skip` returns every byte
/// exactly once, in order.
#[test]
fn threshold_drain_preserves_bytes() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(data: LineBytes, splits: Vec<usize>, thresholds: Vec<u8>) -> bool {
        let stream = InputStream::new(SplitBackend::new(data.0.clone(), splits), 0, 0);
        let mut out = Vec::new();
        let mut round = 0;
        loop {
            let threshold = thresholds
                .get(round % thresholds.len().max(1))
                .map_or(0, |&t| usize::from(t));
            round += 1;

            let (bytes, status) = stream.read_with_threshold(threshold);
            let taken = match status {
                ThresholdStatus::Enough => bytes.len().min(threshold + 1),
                ThresholdStatus::Partial => bytes.len(),
                ThresholdStatus::Pending => 0,
                ThresholdStatus::Exhausted => break,
                ThresholdStatus::BufferFull => return false,
            };
            out.extend_from_slice(&bytes[..taken]);
            drop(bytes);
            if stream.skip(taken as u64).is_err() {
                return false;
            }
        }
        out == data.0 && stream.v_offset() == data.0.len() as u64
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(LineBytes, Vec<usize>, Vec<u8>) -> bool);
}

/// `get_data` never calls the backend, so asking twice gives the same view.
#[test]
fn get_data_is_stable() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(data: LineBytes, splits: Vec<usize>) -> bool {
        let stream = InputStream::new(SplitBackend::new(data.0.clone(), splits), 0, 0);
        let _ = stream.read();
        let first = stream.get_data().to_vec();
        let second = stream.get_data().to_vec();
        first == second && data.0.starts_with(&first)
    }

    QuickCheck::new()
        .tests(test_count())
        .quickcheck(prop as fn(LineBytes, Vec<usize>) -> bool);
}
