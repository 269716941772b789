use playhead_model::{ItemId, PlaybackItem};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraversalMode {
    #[default]
    Sequential,
    Shuffled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("playlist is empty")]
    Empty,

    #[error("start index {index} is out of range for {len} items")]
    StartOutOfRange { index: usize, len: usize },

    #[error("no more items in playlist")]
    Exhausted,

    #[error("already at the start of the playlist")]
    NoPrevious,

    #[error("item {0} is not in the playlist")]
    NotFound(ItemId),
}

/// Ordered traversal over a fixed list of items.
///
/// The cursor points between items: [`get_and_advance`] hands out the item
/// after it and moves forward, [`get_previous_and_reverse`] moves back and
/// hands out the item it passed. The two are exact inverses.
///
/// [`get_and_advance`]: Self::get_and_advance
/// [`get_previous_and_reverse`]: Self::get_previous_and_reverse
#[derive(Debug, Clone)]
pub struct PlaylistCursor {
    items: Vec<PlaybackItem>,
    /// Traversal order as indices into `items`, resolved once.
    order: Vec<usize>,
    position: usize,
    current: Option<usize>,
    mode: TraversalMode,
}

impl PlaylistCursor {
    pub fn new(
        items: Vec<PlaybackItem>,
        start_index: usize,
        mode: TraversalMode,
    ) -> Result<Self, PlaylistError> {
        Self::with_rng(items, start_index, mode, &mut rand::rng())
    }

    /// Like [`new`](Self::new) with a caller-supplied shuffle source.
    pub fn with_rng<R: Rng + ?Sized>(
        items: Vec<PlaybackItem>,
        start_index: usize,
        mode: TraversalMode,
        rng: &mut R,
    ) -> Result<Self, PlaylistError> {
        if items.is_empty() {
            return Err(PlaylistError::Empty);
        }
        if start_index >= items.len() {
            return Err(PlaylistError::StartOutOfRange {
                index: start_index,
                len: items.len(),
            });
        }

        let (order, position) = match mode {
            TraversalMode::Sequential => ((0..items.len()).collect(), start_index),
            TraversalMode::Shuffled => {
                let mut rest: Vec<usize> =
                    (0..items.len()).filter(|&i| i != start_index).collect();
                rest.shuffle(rng);
                let mut order = Vec::with_capacity(items.len());
                order.push(start_index);
                order.extend(rest);
                (order, 0)
            }
        };

        Ok(Self {
            items,
            order,
            position,
            current: None,
            mode,
        })
    }

    pub fn has_next(&self) -> bool {
        self.position < self.order.len()
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    pub fn get_and_advance(&mut self) -> Result<&PlaybackItem, PlaylistError> {
        let Some(&index) = self.order.get(self.position) else {
            return Err(PlaylistError::Exhausted);
        };
        self.position += 1;
        self.current = Some(index);
        Ok(&self.items[index])
    }

    pub fn get_previous_and_reverse(
        &mut self,
    ) -> Result<&PlaybackItem, PlaylistError> {
        if self.position == 0 {
            return Err(PlaylistError::NoPrevious);
        }
        self.position -= 1;
        let index = self.order[self.position];
        self.current = Some(index);
        Ok(&self.items[index])
    }

    /// Whether [`step_back`](Self::step_back) has an item to return to.
    pub fn can_step_back(&self) -> bool {
        self.position >= 2
    }

    /// Move back past the current item and hand out the one before it.
    pub fn step_back(&mut self) -> Result<&PlaybackItem, PlaylistError> {
        if self.position < 2 {
            return Err(PlaylistError::NoPrevious);
        }
        self.position -= 2;
        self.get_and_advance()
    }

    /// Position the cursor so the first item matching `item_id` in
    /// traversal order is handed out next.
    pub fn advance_to(&mut self, item_id: &ItemId) -> Result<(), PlaylistError> {
        let position = self
            .order
            .iter()
            .position(|&index| &self.items[index].id == item_id)
            .ok_or(PlaylistError::NotFound(*item_id))?;
        self.position = position;
        Ok(())
    }

    /// The item most recently handed out.
    pub fn current(&self) -> Option<&PlaybackItem> {
        self.current.map(|index| &self.items[index])
    }

    pub fn peek_next(&self) -> Option<&PlaybackItem> {
        self.order
            .get(self.position)
            .map(|&index| &self.items[index])
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhead_model::ItemKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn items(count: usize) -> Vec<PlaybackItem> {
        (0..count)
            .map(|i| {
                PlaybackItem::new(ItemId::new(), format!("Episode {i}"), ItemKind::Episode)
            })
            .collect()
    }

    #[test]
    fn sequential_walk() {
        let mut cursor =
            PlaylistCursor::new(items(3), 1, TraversalMode::Sequential).unwrap();
        assert!(cursor.has_previous());
        assert_eq!(cursor.get_and_advance().unwrap().name, "Episode 1");
        assert_eq!(cursor.get_and_advance().unwrap().name, "Episode 2");
        assert_eq!(cursor.get_and_advance(), Err(PlaylistError::Exhausted));
        assert!(!cursor.has_next());
        assert_eq!(cursor.current().unwrap().name, "Episode 2");
    }

    #[test]
    fn forward_then_back_is_a_palindrome() {
        let mut cursor =
            PlaylistCursor::new(items(5), 0, TraversalMode::Sequential).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(cursor.get_and_advance().unwrap().name.clone());
        }
        for _ in 0..4 {
            seen.push(cursor.get_previous_and_reverse().unwrap().name.clone());
        }
        let mut reversed = seen.clone();
        reversed.reverse();
        assert_eq!(seen, reversed);
        assert_eq!(cursor.position(), 0);
        assert_eq!(
            cursor.get_previous_and_reverse(),
            Err(PlaylistError::NoPrevious)
        );
    }

    #[test]
    fn shuffle_keeps_start_first_and_is_deterministic_per_seed() {
        let list = items(8);
        let start = list[5].id;
        let mut a = PlaylistCursor::with_rng(
            list.clone(),
            5,
            TraversalMode::Shuffled,
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap();
        let mut b = PlaylistCursor::with_rng(
            list,
            5,
            TraversalMode::Shuffled,
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap();

        assert_eq!(a.peek_next().unwrap().id, start);
        let mut order_a = Vec::new();
        let mut order_b = Vec::new();
        while a.has_next() {
            order_a.push(a.get_and_advance().unwrap().id);
            order_b.push(b.get_and_advance().unwrap().id);
        }
        assert_eq!(order_a, order_b);
        order_a.sort();
        order_a.dedup();
        assert_eq!(order_a.len(), 8);
    }

    #[test]
    fn advance_to_and_step_back() {
        let list = items(4);
        let target = list[2].id;
        let mut cursor =
            PlaylistCursor::new(list, 0, TraversalMode::Sequential).unwrap();
        cursor.advance_to(&target).unwrap();
        assert_eq!(cursor.get_and_advance().unwrap().name, "Episode 2");

        assert_eq!(cursor.step_back().unwrap().name, "Episode 1");
        assert_eq!(cursor.current().unwrap().name, "Episode 1");
        assert_eq!(cursor.peek_next().unwrap().name, "Episode 2");

        let missing = ItemId::new();
        assert_eq!(
            cursor.advance_to(&missing),
            Err(PlaylistError::NotFound(missing))
        );
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            PlaylistCursor::new(Vec::new(), 0, TraversalMode::Sequential).unwrap_err(),
            PlaylistError::Empty
        );
        assert_eq!(
            PlaylistCursor::new(items(2), 2, TraversalMode::Shuffled).unwrap_err(),
            PlaylistError::StartOutOfRange { index: 2, len: 2 }
        );
    }
}
