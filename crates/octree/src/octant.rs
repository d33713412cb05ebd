use glam::Vec3;

/// Octant indices (a-h) addressing the eight child cubes of a node.
/// a=000 (x-,y-,z-)  e=100 (x+,y-,z-)
/// b=001 (x-,y-,z+)  f=101 (x+,y-,z+)
/// c=010 (x-,y+,z-)  g=110 (x+,y+,z-)
/// d=011 (x-,y+,z+)  h=111 (x+,y+,z+)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Octant {
    A = 0, // 000
    B = 1, // 001
    C = 2, // 010
    D = 3, // 011
    E = 4, // 100
    F = 5, // 101
    G = 6, // 110
    H = 7, // 111
}

impl Octant {
    pub fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => Octant::A,
            1 => Octant::B,
            2 => Octant::C,
            3 => Octant::D,
            4 => Octant::E,
            5 => Octant::F,
            6 => Octant::G,
            7 => Octant::H,
            _ => unreachable!("octant index out of range: {index}"),
        }
    }

    /// Classifies a point against a node center. Bit 2 covers x, bit 1 y,
    /// bit 0 z; coordinates on the center plane take the positive branch.
    pub fn containing(point: Vec3, center: Vec3) -> Self {
        let mut index = 0;
        if point.x >= center.x {
            index |= 0b100;
        }
        if point.y >= center.y {
            index |= 0b010;
        }
        if point.z >= center.z {
            index |= 0b001;
        }
        Self::from_index(index)
    }

    /// Per-axis sign of this octant's center offset within its parent.
    /// Each component is -1.0 or +1.0.
    pub fn sign(self) -> Vec3 {
        let index = self.index();
        Vec3::new(
            if index & 0b100 != 0 { 1.0 } else { -1.0 },
            if index & 0b010 != 0 { 1.0 } else { -1.0 },
            if index & 0b001 != 0 { 1.0 } else { -1.0 },
        )
    }

    pub fn all() -> [Octant; 8] {
        [
            Octant::A,
            Octant::B,
            Octant::C,
            Octant::D,
            Octant::E,
            Octant::F,
            Octant::G,
            Octant::H,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing_octants() {
        let center = Vec3::ZERO;
        assert_eq!(Octant::containing(Vec3::new(-1.0, -1.0, -1.0), center), Octant::A);
        assert_eq!(Octant::containing(Vec3::new(1.0, 1.0, 1.0), center), Octant::H);
        assert_eq!(Octant::containing(Vec3::new(1.0, -1.0, -1.0), center), Octant::E);
        assert_eq!(Octant::containing(Vec3::new(-1.0, 1.0, 1.0), center), Octant::D);
    }

    #[test]
    fn test_ties_take_positive_branch() {
        assert_eq!(Octant::containing(Vec3::ZERO, Vec3::ZERO), Octant::H);
        assert_eq!(
            Octant::containing(Vec3::new(0.0, -1.0, -1.0), Vec3::ZERO),
            Octant::E
        );
    }

    #[test]
    fn test_sign_matches_bits() {
        assert_eq!(Octant::A.sign(), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(Octant::H.sign(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(Octant::E.sign(), Vec3::new(1.0, -1.0, -1.0));
    }

    #[test]
    fn test_index_round_trip() {
        for (i, octant) in Octant::all().iter().enumerate() {
            assert_eq!(octant.index(), i);
        }
    }
}
