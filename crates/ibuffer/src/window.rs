//! Logical coordinates of a stream.
//!
//! A [`Window`] maps the logical stream onto its source: logical offset 0 is
//! `start_offset` bytes into the source, `v_offset` is the current read
//! position, `size` the logical length (when known) and `limit` the ceiling
//! past which nothing is visible. The physical buffer knows nothing about
//! these numbers; `BufferState` keeps the two consistent.

/// Logical read window of an [`InputStream`](crate::InputStream).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    start_offset: u64,
    v_offset: u64,
    size: Option<u64>,
    limit: Option<u64>,
}

impl Window {
    /// Window starting at `start_offset` in the source. A `v_size` of `0`
    /// means the size is unknown.
    #[must_use]
    pub fn new(start_offset: u64, v_size: u64) -> Self {
        let size = (v_size != 0).then_some(v_size);
        Self {
            start_offset,
            v_offset: 0,
            size,
            limit: size,
        }
    }

    /// Source offset of logical byte 0.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Current logical read position.
    #[must_use]
    pub fn v_offset(&self) -> u64 {
        self.v_offset
    }

    /// Logical size, `None` for unbounded streams.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Read ceiling, `None` when nothing caps the stream.
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Logical size with `0` standing for "unknown". A bounded stream rebased
    /// onto its own end also reports `0`; [`size`](Self::size) tells the two
    /// apart.
    #[must_use]
    pub fn v_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Read ceiling with `0` standing for "none". A ceiling left behind the
    /// origin by a rebase also reports `0`; [`limit`](Self::limit) tells the
    /// two apart.
    #[must_use]
    pub fn v_limit(&self) -> u64 {
        self.limit.unwrap_or(0)
    }

    /// Bytes left before the ceiling, `None` when there is no ceiling.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.v_offset))
    }

    /// Source offset of the current read position.
    #[must_use]
    pub fn physical_offset(&self) -> u64 {
        self.start_offset + self.v_offset
    }

    pub(crate) fn advance(&mut self, count: u64) {
        self.v_offset += count;
        debug_assert!(
            self.limit.is_none_or(|limit| self.v_offset <= limit),
            "read position {} passed the read limit {:?}",
            self.v_offset,
            self.limit
        );
    }

    pub(crate) fn set_v_offset(&mut self, v_offset: u64) {
        self.v_offset = v_offset;
    }

    /// Moves logical offset 0 to `offset` in the source. Returns `false` when
    /// nothing changed.
    ///
    /// Rebasing past the current position clamps the position (and the
    /// limit) to the new origin.
    pub(crate) fn rebase(&mut self, offset: u64) -> bool {
        assert!(
            self.size
                .is_none_or(|size| offset <= self.start_offset + size),
            "start offset {offset} lies beyond the end of the stream"
        );
        if offset == self.start_offset {
            return false;
        }

        if offset < self.start_offset {
            let shift = self.start_offset - offset;
            self.v_offset += shift;
            self.size = self.size.map(|size| size + shift);
            self.limit = self.limit.map(|limit| limit + shift);
        } else {
            let shift = offset - self.start_offset;
            self.v_offset = self.v_offset.saturating_sub(shift);
            self.size = self.size.map(|size| size - shift);
            self.limit = self.limit.map(|limit| limit.saturating_sub(shift));
        }
        self.start_offset = offset;
        true
    }

    /// Sets the read ceiling; `0` restores it to the stream size.
    pub(crate) fn set_limit(&mut self, limit: u64) {
        if limit == 0 {
            self.limit = self.size;
            return;
        }
        assert!(
            self.size.is_none_or(|size| limit <= size),
            "read limit {limit} exceeds stream size {}",
            self.v_size()
        );
        assert!(
            limit >= self.v_offset,
            "read limit {limit} is behind the read position {}",
            self.v_offset
        );
        self.limit = Some(limit);
    }

    /// Logical offset `count` bytes past the read position, checked with
    /// [`check_target`](Self::check_target).
    pub(crate) fn skip_target(&self, count: u64) -> u64 {
        let Some(target) = self.v_offset.checked_add(count) else {
            panic!(
                "skipping {count} bytes overflows the read position {}",
                self.v_offset
            );
        };
        self.check_target(target);
        target
    }

    /// Panics unless `target` is a reachable logical offset.
    pub(crate) fn check_target(&self, target: u64) {
        assert!(
            self.start_offset.checked_add(target).is_some(),
            "offset {target} overflows the source offset past start offset {}",
            self.start_offset
        );
        assert!(
            self.size.is_none_or(|size| target <= size),
            "offset {target} exceeds stream size {}",
            self.v_size()
        );
        assert!(
            self.limit.is_none_or(|limit| target <= limit),
            "offset {target} exceeds read limit {}",
            self.v_limit()
        );
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn unbounded_window_has_no_ceiling() {
        let w = Window::new(10, 0);
        assert_eq!(w.size(), None);
        assert_eq!(w.limit(), None);
        assert_eq!(w.v_size(), 0);
        assert_eq!(w.remaining(), None);
        assert_eq!(w.physical_offset(), 10);
    }

    #[test]
    fn bounded_window_limit_defaults_to_size() {
        let w = Window::new(0, 100);
        assert_eq!(w.limit(), Some(100));
        assert_eq!(w.remaining(), Some(100));
    }

    #[rstest]
    #[case::backwards(100, 40, 50, 110, 140, 130)]
    #[case::forwards_past_position(100, 130, 20, 0, 50, 40)]
    #[case::forwards_inside(100, 110, 50, 40, 70, 60)]
    fn rebase_shifts_every_offset(
        #[case] start: u64,
        #[case] offset: u64,
        #[case] before_v_offset: u64,
        #[case] v_offset: u64,
        #[case] size: u64,
        #[case] limit: u64,
    ) {
        let mut w = Window::new(start, 80);
        w.set_limit(70);
        w.set_v_offset(before_v_offset);
        assert!(w.rebase(offset));
        assert_eq!(w.start_offset(), offset);
        assert_eq!(w.v_offset(), v_offset);
        assert_eq!(w.v_size(), size);
        assert_eq!(w.v_limit(), limit);
    }

    #[test]
    fn rebase_to_same_offset_is_noop() {
        let mut w = Window::new(7, 0);
        w.advance(3);
        assert!(!w.rebase(7));
        assert_eq!(w.v_offset(), 3);
    }

    #[test]
    fn rebase_unbounded_keeps_unbounded() {
        let mut w = Window::new(50, 0);
        w.advance(5);
        assert!(w.rebase(20));
        assert_eq!(w.v_offset(), 35);
        assert_eq!(w.size(), None);
        assert_eq!(w.limit(), None);
    }

    #[test]
    #[should_panic(expected = "beyond the end")]
    fn rebase_past_end_panics() {
        let mut w = Window::new(0, 10);
        w.rebase(11);
    }

    #[test]
    fn zero_limit_restores_size() {
        let mut w = Window::new(0, 64);
        w.set_limit(16);
        assert_eq!(w.limit(), Some(16));
        w.set_limit(0);
        assert_eq!(w.limit(), Some(64));
    }

    #[test]
    fn limit_on_unbounded_stream() {
        let mut w = Window::new(0, 0);
        w.set_limit(16);
        assert_eq!(w.remaining(), Some(16));
        w.set_limit(0);
        assert_eq!(w.limit(), None);
    }

    #[test]
    #[should_panic(expected = "behind the read position")]
    fn limit_behind_position_panics() {
        let mut w = Window::new(0, 64);
        w.advance(10);
        w.set_limit(9);
    }

    #[test]
    #[should_panic(expected = "exceeds stream size")]
    fn limit_beyond_size_panics() {
        let mut w = Window::new(0, 64);
        w.set_limit(65);
    }

    #[rstest]
    #[case(0)]
    #[case(32)]
    #[case(48)]
    fn targets_within_limit_are_accepted(#[case] target: u64) {
        let mut w = Window::new(0, 64);
        w.set_limit(48);
        w.check_target(target);
    }

    #[test]
    fn rebase_past_limit_keeps_a_zero_ceiling() {
        let mut w = Window::new(0, 10);
        w.set_limit(4);
        assert!(w.rebase(6));
        assert_eq!(w.size(), Some(4));
        assert_eq!(w.limit(), Some(0));
        assert_eq!(w.remaining(), Some(0));
        assert_eq!(w.v_limit(), 0);
    }

    #[test]
    fn rebase_onto_end_stays_bounded() {
        let mut w = Window::new(0, 10);
        assert!(w.rebase(10));
        assert_eq!(w.size(), Some(0));
        assert_eq!(w.v_size(), 0);
        assert_eq!(w.remaining(), Some(0));
    }

    #[test]
    #[should_panic(expected = "overflows the read position")]
    fn skip_target_overflow_panics() {
        let mut w = Window::new(0, 0);
        w.advance(1);
        w.skip_target(u64::MAX);
    }

    #[test]
    #[should_panic(expected = "overflows the source offset")]
    fn target_past_u64_source_offset_panics() {
        let w = Window::new(10, 0);
        w.check_target(u64::MAX - 5);
    }

    #[test]
    #[should_panic(expected = "exceeds read limit")]
    fn target_beyond_limit_panics() {
        let mut w = Window::new(0, 64);
        w.set_limit(48);
        w.check_target(49);
    }
}
