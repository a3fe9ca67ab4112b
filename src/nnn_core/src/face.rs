use std::{fmt, str::FromStr};

/// A face of the cube, in the order faces are laid out in the facelet array.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    U,
    L,
    F,
    R,
    B,
    D,
}

impl Face {
    pub const ALL: [Self; 6] = {
        use Face::*;
        let v = [U, L, F, R, B, D];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    /// The order kociemba and most other 3x3x3 tools expect faces in.
    pub const KOCIEMBA_ORDER: [Self; 6] = [Face::U, Face::R, Face::F, Face::D, Face::L, Face::B];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn label(self) -> u8 {
        match self {
            Face::U => b'U',
            Face::L => b'L',
            Face::F => b'F',
            Face::R => b'R',
            Face::B => b'B',
            Face::D => b'D',
        }
    }

    #[must_use]
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            b'U' => Some(Face::U),
            b'L' => Some(Face::L),
            b'F' => Some(Face::F),
            b'R' => Some(Face::R),
            b'B' => Some(Face::B),
            b'D' => Some(Face::D),
            _ => None,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Face::U => Face::D,
            Face::L => Face::R,
            Face::F => Face::B,
            Face::R => Face::L,
            Face::B => Face::F,
            Face::D => Face::U,
        }
    }
}

impl FromStr for Face {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [label] => Face::from_label(*label).ok_or(()),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.label()))
    }
}
