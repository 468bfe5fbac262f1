use std::num::{NonZeroU64, ParseIntError};
use std::str::FromStr;

/// A selection of [`Frame`](crate::Frame)s.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum FrameSelection {
    /// Include all frames that are in a trajectory.
    #[default]
    All,
    /// Include frames that lie within a certain [`Range`].
    Range(Range),
}

impl FrameSelection {
    /// Determine whether some index `idx` is included in this [`FrameSelection`].
    ///
    /// Will return [`None`] once the index is beyond the scope of this `FrameSelection`.
    pub fn is_included(&self, idx: usize) -> Option<bool> {
        match self {
            FrameSelection::All => Some(true),
            FrameSelection::Range(range) => range.is_included(idx as u64),
        }
    }
}

/// Parses `start:stop:step`, where each of the values is optional.
///
/// - `:100` selects the first 100 frames.
/// - `3:14` selects the frames with indices 3 up to and including 13.
/// - `:100:2` selects every second frame from the first 100 frames, 50 in total.
impl FromStr for FrameSelection {
    type Err = ParseIntError;

    fn from_str(selection: &str) -> Result<Self, Self::Err> {
        fn component<T: FromStr<Err = ParseIntError>>(
            s: Option<&str>,
        ) -> Result<Option<T>, ParseIntError> {
            s.filter(|s| !s.is_empty()).map(str::parse).transpose()
        }

        let mut components = selection.split(':');
        let start = component(components.next())?;
        let end = component(components.next())?;
        let step = component(components.next())?;
        Ok(FrameSelection::Range(Range::new(start, end, step)))
    }
}

/// A range of [`Frame`](crate::Frame)s to be read from a trajectory.
///
/// The `start` of a [`Range`] is always bounded, and is zero by default.
/// The `end` may be bounded or unbounded. In case the end is unbounded ([`None`]), a `Range`
/// instructs the reader to just read up to and including the last frame. If it is bounded
/// by [`Some`] value, the frames up to that index will be read.
/// The `step` describes the number of frames that passed in each stride.
/// The number of skipped `Frame`s is equal to `step` - 1.
/// For instance, given a `step` of four, one `Frame` is read and the following three are skipped.
///
/// # Note
///
/// An instance where `start` > `end` is a valid `Range`, but it will not make much sense,
/// since the `Range` will be understood to produce zero steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// The `start` of a [`Range`] is always bounded, and is zero by default.
    pub start: u64,
    /// The `end` may be bounded or unbounded.
    ///
    /// When `end` is bounded, it is an exclusive bound.
    pub end: Option<u64>,
    /// The `step` describes the number of frames that passed in each stride, counted from
    /// `start`.
    pub step: NonZeroU64,
}

impl Range {
    pub fn new(start: Option<u64>, end: Option<u64>, step: Option<NonZeroU64>) -> Self {
        let mut sel = Self {
            end,
            ..Self::default()
        };
        if let Some(start) = start {
            sel.start = start;
        }
        if let Some(step) = step {
            sel.step = step;
        }
        sel
    }

    fn is_included(&self, idx: u64) -> Option<bool> {
        if let Some(end) = self.end {
            // Determine whether `idx` is already beyond the defined range.
            if end <= idx {
                return None;
            }
        }
        let in_range = self.start <= idx;
        let in_step = in_range && (idx - self.start) % self.step == 0;
        Some(in_step)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            step: NonZeroU64::MIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::{FrameSelection, Range};

    #[test]
    fn zero_selection() {
        let range_empty = FrameSelection::Range(Range::new(None, Some(0), None));
        for idx in 0..1000 {
            assert!(range_empty.is_included(idx).is_none());
        }
    }

    #[test]
    fn first_n() {
        let n = 100;
        let step = NonZeroU64::new(17).unwrap();

        let until = FrameSelection::Range(Range::new(None, Some(n as u64), None));
        let from_n = FrameSelection::Range(Range::new(Some(n as u64), None, None));
        let until_stepped = FrameSelection::Range(Range::new(None, Some(n as u64), Some(step)));
        let from_n_stepped = FrameSelection::Range(Range::new(Some(n as u64), None, Some(step)));
        let all = FrameSelection::All;

        for idx in 0..2 * n {
            if idx < n {
                assert_eq!(until.is_included(idx), Some(true));
                assert_eq!(
                    until_stepped.is_included(idx),
                    Some(idx as u64 % step.get() == 0),
                );
            } else {
                assert!(until.is_included(idx).is_none());
                assert!(until_stepped.is_included(idx).is_none());
            }
            let from_n_included = idx >= n;
            assert_eq!(from_n.is_included(idx), Some(from_n_included));
            assert_eq!(
                from_n_stepped.is_included(idx),
                Some(from_n_included && (idx - n) as u64 % step.get() == 0),
            );
            assert_eq!(all.is_included(idx), Some(true));
        }
    }

    #[test]
    fn stepping_starts_at_start() {
        let range = FrameSelection::Range(Range::new(Some(1), Some(10), NonZeroU64::new(3)));
        let included: Vec<_> = (0..10)
            .filter(|&idx| range.is_included(idx) == Some(true))
            .collect();
        assert_eq!(included, [1, 4, 7]);
    }

    #[test]
    fn parse() {
        let parsed = |s: &str| s.parse::<FrameSelection>().unwrap();
        assert_eq!(parsed(":100"), FrameSelection::Range(Range::new(None, Some(100), None)));
        assert_eq!(
            parsed("3:14"),
            FrameSelection::Range(Range::new(Some(3), Some(14), None))
        );
        assert_eq!(
            parsed(":100:2"),
            FrameSelection::Range(Range::new(None, Some(100), NonZeroU64::new(2)))
        );
        assert_eq!(parsed("::"), FrameSelection::Range(Range::default()));
        assert!("a:b".parse::<FrameSelection>().is_err());
        assert!("::0".parse::<FrameSelection>().is_err());
    }
}
