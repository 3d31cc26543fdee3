//! Merge-join alignment of two walker streams.
//!
//! Both walkers yield entries in strictly increasing relative-path
//! order, so pairing them is a linear merge with one cursor per side
//! and no tree materialized in memory.

use std::cmp::Ordering;
use std::iter::Peekable;

use ddm_types::{Entry, RelativePath, Side};
use ddm_walk::{WalkErrorRecord, WalkEvent};

/// Two entries sharing a relative path, or one entry without a
/// counterpart. At least one side is always present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignedPair {
    pub path: RelativePath,
    pub left: Option<Entry>,
    pub right: Option<Entry>,
}

/// One aligner output: a pair to classify, or a per-entry walk failure
/// passed through with the side it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignItem {
    Pair(AlignedPair),
    WalkError(Side, WalkErrorRecord),
}

/// Streaming merge-join over two walk-event streams.
pub struct Aligner<L, R>
where
    L: Iterator<Item = WalkEvent>,
    R: Iterator<Item = WalkEvent>,
{
    left: Peekable<L>,
    right: Peekable<R>,
}

impl<L, R> Aligner<L, R>
where
    L: Iterator<Item = WalkEvent>,
    R: Iterator<Item = WalkEvent>,
{
    pub fn new(left: L, right: R) -> Self {
        Self {
            left: left.peekable(),
            right: right.peekable(),
        }
    }

    fn take_entry(event: Option<WalkEvent>) -> Option<Entry> {
        match event {
            Some(WalkEvent::Entry(entry)) => Some(entry),
            _ => None,
        }
    }
}

impl<L, R> Iterator for Aligner<L, R>
where
    L: Iterator<Item = WalkEvent>,
    R: Iterator<Item = WalkEvent>,
{
    type Item = AlignItem;

    fn next(&mut self) -> Option<AlignItem> {
        // Surface walk errors as soon as they reach the head of either
        // stream; they carry their own paths and bypass pairing.
        if matches!(self.left.peek(), Some(WalkEvent::Error(_))) {
            if let Some(WalkEvent::Error(record)) = self.left.next() {
                return Some(AlignItem::WalkError(Side::Left, record));
            }
        }
        if matches!(self.right.peek(), Some(WalkEvent::Error(_))) {
            if let Some(WalkEvent::Error(record)) = self.right.next() {
                return Some(AlignItem::WalkError(Side::Right, record));
            }
        }

        let order = match (self.left.peek(), self.right.peek()) {
            (None, None) => return None,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(l), Some(r)) => l.path().cmp(r.path()),
        };

        match order {
            Ordering::Less => {
                let entry = Self::take_entry(self.left.next())?;
                Some(AlignItem::Pair(AlignedPair {
                    path: entry.path.clone(),
                    left: Some(entry),
                    right: None,
                }))
            }
            Ordering::Greater => {
                let entry = Self::take_entry(self.right.next())?;
                Some(AlignItem::Pair(AlignedPair {
                    path: entry.path.clone(),
                    left: None,
                    right: Some(entry),
                }))
            }
            Ordering::Equal => {
                let left = Self::take_entry(self.left.next())?;
                let right = Self::take_entry(self.right.next())?;
                Some(AlignItem::Pair(AlignedPair {
                    path: left.path.clone(),
                    left: Some(left),
                    right: Some(right),
                }))
            }
        }
    }
}
