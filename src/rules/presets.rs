use super::GameRules;

impl GameRules {
    /// Preset for Conway's classic Game of Life (B3/S23)
    pub fn conway() -> Self {
        Self::default()
    }

    /// HighLife variant (B36/S23) - has a self-replicating pattern
    pub fn high_life() -> Self {
        Self {
            birth: (1 << 3) | (1 << 6),
            survival: (1 << 2) | (1 << 3),
        }
    }

    /// Day & Night variant (B3678/S34678)
    pub fn day_and_night() -> Self {
        Self {
            birth: (1 << 3) | (1 << 6) | (1 << 7) | (1 << 8),
            survival: (1 << 3) | (1 << 4) | (1 << 6) | (1 << 7) | (1 << 8),
        }
    }

    /// Life without Death (B3/S012345678) - live cells never die
    pub fn life_without_death() -> Self {
        Self {
            birth: 1 << 3,
            survival: 0b1_1111_1111,
        }
    }

    /// Named presets offered by the control panel.
    pub fn presets() -> [(&'static str, GameRules); 4] {
        [
            ("Conway's Classic", Self::conway()),
            ("HighLife", Self::high_life()),
            ("Day & Night", Self::day_and_night()),
            ("Life without Death", Self::life_without_death()),
        ]
    }
}
