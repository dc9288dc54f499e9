//! Per-front permutations of the alphabet.
//!
//! `FrontOrder(f)` starts with `f`, then [`ANCHOR`] when `f` is not the anchor,
//! then every remaining symbol in canonical order. Both directions are
//! precomputed for every front, so lookups never allocate.

use std::sync::OnceLock;

use crate::alphabet::{ANCHOR, Alphabet};
use crate::error::Result;

static FRONT_ORDERS: OnceLock<FrontOrders> = OnceLock::new();

#[derive(Debug)]
pub struct FrontOrders {
    /// `orders[f][p]` is the alphabet index at position `p` of `FrontOrder(f)`.
    orders: Vec<Box<[u16]>>,
    /// `positions[f][c]` is the position of alphabet index `c` in `FrontOrder(f)`.
    positions: Vec<Box<[u16]>>,
}

impl FrontOrders {
    pub fn get() -> &'static FrontOrders {
        FRONT_ORDERS.get_or_init(|| Self::build(Alphabet::get()))
    }

    fn build(alphabet: &Alphabet) -> Self {
        let n = alphabet.len();
        let anchor = alphabet.index_of(ANCHOR);

        let mut orders = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(n);
        for front in 0..n as u16 {
            let mut head = vec![front];
            if let Some(anchor) = anchor.filter(|anchor| *anchor != front) {
                head.push(anchor);
            }
            let mut order = Vec::with_capacity(n);
            order.extend_from_slice(&head);
            order.extend((0..n as u16).filter(|c| !head.contains(c)));

            let mut inverse = vec![0u16; n];
            for (position, symbol) in order.iter().enumerate() {
                inverse[usize::from(*symbol)] = position as u16;
            }

            orders.push(order.into_boxed_slice());
            positions.push(inverse.into_boxed_slice());
        }

        Self { orders, positions }
    }

    /// `FrontOrder(f)` as alphabet indices.
    pub fn order(&self, front_index: u16) -> Option<&[u16]> {
        self.orders.get(usize::from(front_index)).map(|order| &order[..])
    }

    /// `FrontOrder(f)` as characters.
    pub fn front_order(&self, front: char) -> Result<Vec<char>> {
        let alphabet = Alphabet::get();
        let front_index = alphabet.ensure_supported(front)?;
        Ok(self.orders[usize::from(front_index)]
            .iter()
            .map(|index| alphabet.symbols()[usize::from(*index)])
            .collect())
    }

    /// Position of `ch` inside `FrontOrder(front)`.
    pub fn front_position(&self, front: char, ch: char) -> Result<u16> {
        let alphabet = Alphabet::get();
        let front_index = alphabet.ensure_supported(front)?;
        let index = alphabet.ensure_supported(ch)?;
        Ok(self.position_of(front_index, index))
    }

    /// Index-level variant of [`Self::front_position`]. Both indices must be in range.
    pub fn position_of(&self, front_index: u16, index: u16) -> u16 {
        self.positions[usize::from(front_index)][usize::from(index)]
    }

    /// Character at `digit` inside `FrontOrder(front_index)`, if both are in range.
    pub fn symbol_at(&self, front_index: u16, digit: u32) -> Option<char> {
        let order = self.order(front_index)?;
        let index = *order.get(digit as usize)?;
        Alphabet::get().char_at(usize::from(index))
    }
}
