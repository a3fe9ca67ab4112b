//! The twelve edge slots and the move tables used to shuttle edges between
//! them. The tables are searched once on small probe cubes using only outer
//! face turns, so they apply unchanged to every cube size.

use std::sync::LazyLock;

use fxhash::FxHashMap;
use log::debug;

use crate::{
    cube::{Cube, MARKER},
    face::Face,
    moves::{Move, Turn, reverse_steps},
    side::EdgeDir,
};

/// An edge slot, described by the side and direction its wings are read from
/// and whether they are read against the side's natural order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EdgeSlot {
    pub name: &'static str,
    pub face: Face,
    pub dir: EdgeDir,
    pub reversed: bool,
}

macro_rules! slot {
    ($name:literal, $face:ident, $dir:ident, $reversed:literal) => {
        EdgeSlot {
            name: $name,
            face: Face::$face,
            dir: EdgeDir::$dir,
            reversed: $reversed,
        }
    };
}

/// Slots in the order their home pieces are expected by the swap counter.
pub const EDGE_SLOTS: [EdgeSlot; 12] = [
    slot!("UB", U, North, false),
    slot!("UL", U, West, true),
    slot!("UF", U, South, false),
    slot!("UR", U, East, false),
    slot!("LB", L, West, true),
    slot!("LF", L, East, false),
    slot!("RF", R, West, true),
    slot!("RB", R, East, false),
    slot!("DF", D, North, false),
    slot!("DL", D, West, true),
    slot!("DB", D, South, false),
    slot!("DR", D, East, false),
];

pub const UF: usize = 2;

/// Both orders of every pair of adjacent faces, mapped to the name of the
/// slot where that pair lives.
static WING_STR: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "UB" => "UB", "BU" => "UB",
    "UL" => "UL", "LU" => "UL",
    "UF" => "UF", "FU" => "UF",
    "UR" => "UR", "RU" => "UR",
    "LB" => "LB", "BL" => "LB",
    "LF" => "LF", "FL" => "LF",
    "RF" => "RF", "FR" => "RF",
    "RB" => "RB", "BR" => "RB",
    "DF" => "DF", "FD" => "DF",
    "DL" => "DL", "LD" => "DL",
    "DB" => "DB", "BD" => "DB",
    "DR" => "DR", "RD" => "DR",
};

/// The canonical name of the edge made of these two labels, `None` if the two
/// faces are not adjacent.
#[must_use]
pub fn wing_str(a: u8, b: u8) -> Option<&'static str> {
    let key = [a & !MARKER, b & !MARKER];
    let key = std::str::from_utf8(&key).ok()?;
    WING_STR.get(key).copied()
}

#[must_use]
pub fn slot_index(name: &str) -> Option<usize> {
    EDGE_SLOTS.iter().position(|slot| slot.name == name)
}

impl Cube {
    /// The wing positions of `slot` in the order the slot is read.
    #[must_use]
    pub fn slot_positions(&self, slot: &EdgeSlot) -> Vec<usize> {
        let mut positions = self.side(slot.face).edge(slot.dir).to_vec();
        if slot.reversed {
            positions.reverse();
        }
        positions
    }
}

/// How many outer turns the table searches go. Every edge reaches every slot
/// in at most three.
const MAX_SETUP_DEPTH: usize = 3;

fn outer_moves() -> Vec<Move> {
    Face::ALL
        .into_iter()
        .flat_map(|face| {
            [Turn::Clockwise, Turn::CounterClockwise, Turn::Half]
                .map(|turn| Move::outer(face, turn))
        })
        .collect()
}

/// Every sequence of outer turns, shortest first.
fn outer_sequences() -> impl Iterator<Item = Vec<Move>> {
    let moves = outer_moves();
    (0..=MAX_SETUP_DEPTH).flat_map(move |depth| {
        let moves = moves.clone();
        let count = moves.len().pow(u32::try_from(depth).unwrap_or(0));
        (0..count).map(move |mut index| {
            (0..depth)
                .map(|_| {
                    let mv = moves[index % moves.len()];
                    index /= moves.len();
                    mv
                })
                .collect()
        })
    })
}

fn apply_all(cube: &mut Cube, moves: &[Move]) -> bool {
    moves.iter().all(|mv| cube.rotate_guts(*mv).is_ok())
}

/// `(side, edge direction, target slot)` to the outer turns that carry the
/// edge on that side and direction into the target slot.
static EDGE_SETUPS: LazyLock<FxHashMap<(Face, EdgeDir, usize), Vec<Move>>> = LazyLock::new(|| {
    let mut probe = Cube::build(3);
    let mut table = FxHashMap::default();

    for face in Face::ALL {
        for dir in EdgeDir::ALL {
            let source = probe.side(face).edge(dir)[0];
            let Ok(partner) = probe.wing_partner(source) else {
                continue;
            };
            let mut marked = Cube::build(3).state;
            marked[source] |= MARKER;
            marked[partner] |= MARKER;

            let mut found = 0;
            for seq in outer_sequences() {
                if found == EDGE_SLOTS.len() {
                    break;
                }
                probe.state.clone_from(&marked);
                probe.solution.clear();
                if !apply_all(&mut probe, &seq) {
                    continue;
                }
                for (index, slot) in EDGE_SLOTS.iter().enumerate() {
                    let target = probe.side(slot.face).edge(slot.dir)[0];
                    if probe.state[target] & MARKER != 0 {
                        table.entry((face, dir, index)).or_insert_with(|| {
                            found += 1;
                            seq.clone()
                        });
                    }
                }
            }
        }
    }
    debug!("Built {} edge setup sequences", table.len());
    table
});

/// The outer turns that carry whatever sits on `dir` of `face` into `target`.
#[must_use]
pub fn edge_setup(face: Face, dir: EdgeDir, target: usize) -> Option<&'static [Move]> {
    EDGE_SETUPS.get(&(face, dir, target)).map(Vec::as_slice)
}

/// `L2 D hFw2 hLw2 F2 hLw2 L2 F2 hLw2 hFw2 D' L2` with `h = N/2`. On an even
/// cube this exchanges the UL and UF dedges and touches nothing else.
#[must_use]
pub fn pll_swap_moves(size: usize) -> Vec<Move> {
    let half = size / 2;
    let l2 = Move::outer(Face::L, Turn::Half);
    let f2 = Move::outer(Face::F, Turn::Half);
    let wide_f2 = Move::new(Face::F, half, Turn::Half);
    let wide_l2 = Move::new(Face::L, half, Turn::Half);
    vec![
        l2,
        Move::outer(Face::D, Turn::Clockwise),
        wide_f2,
        wide_l2,
        f2,
        wide_l2,
        l2,
        f2,
        wide_l2,
        wide_f2,
        Move::outer(Face::D, Turn::CounterClockwise),
        l2,
    ]
}

/// `r2 B2 U2 l U2 r' U2 r U2 F2 r F2 l' B2 r2` where `r` and `l` turn layers
/// 2 through `N/2`. On an even cube this flips the UF dedge in place and
/// touches nothing else.
#[must_use]
pub fn oll_flip_moves(size: usize) -> Vec<Move> {
    use Face::{B, F, L, R, U};
    use Turn::{Clockwise as Cw, CounterClockwise as Ccw, Half};

    // (face, turn, inner layers only)
    let steps = [
        (R, Half, true),
        (B, Half, false),
        (U, Half, false),
        (L, Cw, true),
        (U, Half, false),
        (R, Ccw, true),
        (U, Half, false),
        (R, Cw, true),
        (U, Half, false),
        (F, Half, false),
        (R, Cw, true),
        (F, Half, false),
        (L, Ccw, true),
        (B, Half, false),
        (R, Half, true),
    ];
    steps
        .into_iter()
        .flat_map(|(face, turn, inner)| {
            if inner {
                vec![Move::new(face, size / 2, turn), Move::outer(face, turn.inverse())]
            } else {
                vec![Move::outer(face, turn)]
            }
        })
        .collect()
}

/// Unordered pair of hosed slots (smaller index first) to the outer turns
/// that bring that pair into UL and UF, where `pll_swap_moves` can exchange
/// them.
static PLL_SETUPS: LazyLock<FxHashMap<(usize, usize), Vec<Move>>> = LazyLock::new(|| {
    let mut probe = Cube::build(4);
    let solved = probe.state.clone();
    let swap = pll_swap_moves(4);
    let pairs = EDGE_SLOTS.len() * (EDGE_SLOTS.len() - 1) / 2;
    let mut table = FxHashMap::default();

    for seq in outer_sequences() {
        if table.len() == pairs {
            break;
        }
        probe.state.clone_from(&solved);
        probe.solution.clear();
        if !(apply_all(&mut probe, &seq)
            && apply_all(&mut probe, &swap)
            && apply_all(&mut probe, &reverse_steps(&seq)))
        {
            continue;
        }
        if let [a, b] = probe.hosed_slots()[..] {
            table.entry((a, b)).or_insert(seq);
        }
    }
    debug!("Built {} PLL setup sequences", table.len());
    table
});

/// The setup for the hosed pair `(a, b)`, `a < b`.
#[must_use]
pub fn pll_setup(a: usize, b: usize) -> Option<&'static [Move]> {
    PLL_SETUPS.get(&(a, b)).map(Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::moves_to_string;

    #[test]
    fn wing_strings() {
        assert_eq!(wing_str(b'B', b'U'), Some("UB"));
        assert_eq!(wing_str(b'F', b'R'), Some("RF"));
        assert_eq!(wing_str(b'D' | MARKER, b'L' | MARKER), Some("DL"));
        assert_eq!(wing_str(b'U', b'D'), None);
        assert_eq!(wing_str(b'U', b'U'), None);
        assert_eq!(slot_index("UF"), Some(UF));
    }

    #[test]
    fn every_edge_reaches_every_slot() {
        for face in Face::ALL {
            for dir in EdgeDir::ALL {
                for target in 0..EDGE_SLOTS.len() {
                    assert!(edge_setup(face, dir, target).is_some(), "{face} {dir:?} {target}");
                }
            }
        }
        assert_eq!(edge_setup(Face::U, EdgeDir::South, UF).unwrap().len(), 0);
        assert_eq!(edge_setup(Face::F, EdgeDir::North, UF).unwrap().len(), 0);
    }

    #[test]
    fn every_pair_has_a_pll_setup() {
        for a in 0..EDGE_SLOTS.len() {
            for b in a + 1..EDGE_SLOTS.len() {
                assert!(pll_setup(a, b).is_some(), "{a} {b}");
            }
        }
        assert_eq!(pll_setup(1, 2).unwrap().len(), 0);
    }

    #[test]
    fn fixed_sequences() {
        assert_eq!(
            moves_to_string(&pll_swap_moves(6)),
            "L2 D 3Fw2 3Lw2 F2 3Lw2 L2 F2 3Lw2 3Fw2 D' L2"
        );
        let flip = oll_flip_moves(4);
        assert_eq!(flip.len(), 22);
        assert_eq!(
            moves_to_string(&flip[..6]),
            "Rw2 R2 B2 U2 Lw L'"
        );
    }

    #[test]
    fn oll_flip_only_touches_uf() {
        for size in [4, 6] {
            let mut cube = Cube::new(size).unwrap();
            cube.rotate_moves(&oll_flip_moves(size)).unwrap();
            let solved = Cube::new(size).unwrap();
            let uf = cube.slot_positions(&EDGE_SLOTS[UF]);
            for position in 1..cube.state().len() {
                let touched = cube.state()[position] != solved.state()[position];
                let in_uf = uf.contains(&position)
                    || uf.iter().any(|p| cube.wing_partner(*p).unwrap() == position);
                assert!(!touched || in_uf, "{position} on {size}");
                if in_uf {
                    assert!(touched);
                }
            }
        }
    }

    #[test]
    fn pll_swap_only_touches_ul_and_uf() {
        for size in [4, 6, 8] {
            let mut cube = Cube::new(size).unwrap();
            cube.rotate_moves(&pll_swap_moves(size)).unwrap();
            assert_eq!(cube.hosed_slots(), vec![1, 2]);
            cube.rotate_moves(&pll_swap_moves(size)).unwrap();
            assert!(cube.solved());
        }
    }
}
